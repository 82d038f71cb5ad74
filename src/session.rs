//! One patient assessment's editing session.
//!
//! All narrative text, records, keywords, and selection live in this single
//! state object; every mutation goes through a method here, so the ordering
//! guarantees hold by construction: a narrative edit always lands before the
//! re-extraction it triggers, and the flat record is re-projected before any
//! extraction sees the structured context.
//!
//! The extraction call is the only asynchronous boundary. While a request is
//! in flight the resolver and highlighter keep serving the previous keyword
//! set; completions are applied last-issued-wins via monotonic tokens, so a
//! stale response that lands after a newer request started is dropped.

use serde_json::Value;

use crate::highlight::{self, Segment};
use crate::keyword::resolver;
use crate::keyword::types::{Keyword, KeywordInstanceId};
use crate::narrative::{self, Sentence};
use crate::reconcile::{self, RecommendedFeature};
use crate::record::{FlatPatientRecord, StructuredRecord};

/// Opaque handle for one extraction request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionToken(u64);

/// Detail-panel transition state. Replaces timer-chained side effects with an
/// explicit, cancellable sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelState {
    #[default]
    Idle,
    Transitioning,
    Settled,
}

/// Session state for one patient assessment.
#[derive(Debug, Default)]
pub struct Session {
    narrative: String,
    flat: FlatPatientRecord,
    structured: StructuredRecord,
    keywords: Vec<Keyword>,
    selection: Option<KeywordInstanceId>,
    /// Last-issued extraction token; completions below this are stale.
    issued_token: u64,
    panel: PanelState,
}

impl Session {
    /// Start a session from the externally-loaded flat patient record.
    pub fn new(flat: FlatPatientRecord) -> Self {
        let structured = reconcile::to_structured(&flat);
        Session {
            flat,
            structured,
            ..Session::default()
        }
    }

    pub fn narrative(&self) -> &str {
        &self.narrative
    }

    pub fn flat_record(&self) -> &FlatPatientRecord {
        &self.flat
    }

    pub fn structured_record(&self) -> &StructuredRecord {
        &self.structured
    }

    pub fn keywords(&self) -> &[Keyword] {
        &self.keywords
    }

    pub fn selection(&self) -> Option<&KeywordInstanceId> {
        self.selection.as_ref()
    }

    /// Replace the narrative (a fresh AI summary or a physician edit).
    ///
    /// Clears the selection — instance ids are only meaningful against the
    /// text that produced them. The stale keyword set keeps serving highlights
    /// until the next extraction completes.
    pub fn set_narrative(&mut self, narrative: String) {
        self.narrative = narrative;
        self.selection = None;
    }

    /// Numbered sentences of the current narrative.
    pub fn sentences(&self) -> Vec<Sentence> {
        narrative::parse_sentences(&self.narrative)
    }

    /// Highlight one sentence against the active keyword set.
    pub fn highlight_sentence(&self, sentence: &Sentence) -> Vec<Segment> {
        highlight::highlight(&sentence.text, &self.keywords, Some(sentence.number))
    }

    /// Replace the flat record wholesale (external reload) and re-derive the
    /// structured projection.
    pub fn set_flat_record(&mut self, flat: FlatPatientRecord) {
        self.flat = flat;
        self.structured = reconcile::to_structured(&self.flat);
    }

    /// Merge AI-suggested (or editor-entered) structured updates, then
    /// project the result back onto the flat record.
    ///
    /// The re-projection happens here, before this method returns — so any
    /// extraction issued afterwards sees fully-applied structured state,
    /// never a half-applied merge.
    pub fn apply_structured_updates(&mut self, updates: &StructuredRecord) {
        self.structured = reconcile::merge_updates(&self.structured, updates);
        for (field, value) in reconcile::to_flat(&self.structured) {
            self.flat.insert(field, value);
        }
    }

    /// Structured context to hand to the extraction adapter.
    pub fn structured_context(&self) -> Value {
        serde_json::to_value(&self.structured).unwrap_or(Value::Null)
    }

    /// Issue a token for a new extraction request. Any request issued earlier
    /// becomes stale immediately.
    pub fn begin_extraction(&mut self) -> ExtractionToken {
        self.issued_token += 1;
        ExtractionToken(self.issued_token)
    }

    /// Apply a completed extraction, unless a newer request was issued while
    /// it was in flight. Returns whether the keyword set was replaced.
    ///
    /// Replacement is wholesale — never a partial patch — so re-rendering
    /// after application is idempotent.
    pub fn complete_extraction(
        &mut self,
        token: ExtractionToken,
        keywords: Vec<Keyword>,
    ) -> bool {
        if token.0 != self.issued_token {
            tracing::debug!(
                token = token.0,
                current = self.issued_token,
                "dropped stale extraction completion"
            );
            return false;
        }
        self.keywords = keywords;
        self.selection = None;
        true
    }

    /// Handle a keyword click from the rendered narrative. Returns the
    /// resolved keyword, if any; selection is updated either way and the
    /// panel transition starts.
    pub fn select(&mut self, id: KeywordInstanceId) -> Option<&Keyword> {
        self.selection = Some(id);
        self.panel = PanelState::Transitioning;
        resolver::resolve(self.keywords.as_slice(), self.selection.as_ref()?)
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.panel = PanelState::Idle;
    }

    /// Fields to surface in the editing panel, honouring the current
    /// selection filter.
    pub fn recommended_features(&self) -> Vec<RecommendedFeature> {
        reconcile::recommended_features(&self.keywords, self.selection.as_ref())
    }

    pub fn panel_state(&self) -> PanelState {
        self.panel
    }

    /// The panel transition finished scrolling/expanding.
    pub fn settle_panel(&mut self) {
        if self.panel == PanelState::Transitioning {
            self.panel = PanelState::Settled;
        }
    }

    /// Abort an in-progress transition (e.g. the user clicked elsewhere).
    pub fn cancel_panel_transition(&mut self) {
        if self.panel == PanelState::Transitioning {
            self.panel = PanelState::Idle;
        }
    }
}
