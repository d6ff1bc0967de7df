//! Semantic stage capability contracts
//!
//! Each transformation step (extraction, attribution, validation,
//! clarification) is an external, replaceable capability: one async call,
//! typed request in, typed output out, [`StageError`] on failure. The core
//! depends only on these traits, never on a specific backend.
//!
//! Output types carry `ensure_*` shape checks. Callers run them inside the
//! invoker's call closure so a violation is classified as
//! [`StageError::SchemaValidation`] and retried like any transient failure.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use tally_model::{ActionItem, ClarificationQuestion, ItemId};

use crate::error::{StageError, StageResult};

/// Request to the extraction stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRequest {
    /// Raw meeting notes or transcript
    pub meeting_text: String,
}

/// Raw action descriptions found in the meeting text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// One entry per actionable task, description only
    pub raw_actions: Vec<String>,
}

impl ExtractionOutput {
    /// Reject blank action descriptions
    ///
    /// An empty list is well-formed: it means the meeting contained no
    /// actionable tasks and short-circuits the pipeline.
    pub fn ensure_well_formed(&self) -> StageResult<()> {
        if let Some(index) = self.raw_actions.iter().position(|a| a.trim().is_empty()) {
            return Err(StageError::SchemaValidation(format!(
                "raw action {} is blank",
                index + 1
            )));
        }
        Ok(())
    }
}

/// Extracts raw action descriptions from meeting text
#[async_trait]
pub trait ExtractionStage: Send + Sync {
    /// Run extraction over sanitized meeting text
    async fn extract(&self, request: ExtractionRequest) -> StageResult<ExtractionOutput>;
}

/// Request to the attribution stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionRequest {
    /// Action descriptions from extraction
    pub raw_actions: Vec<String>,
    /// Original meeting text for context
    pub meeting_text: String,
    /// Participant names for owner matching
    pub participants: Vec<String>,
}

/// Action items with owner/deadline populated where explicitly stated
///
/// The stage contract forbids inference: owner and deadline stay unset unless
/// the source text names them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributionOutput {
    /// One item per raw action, ids assigned at creation
    pub action_items: Vec<ActionItem>,
}

impl AttributionOutput {
    /// Require one item per raw action with unique, non-empty ids
    pub fn ensure_covers(&self, raw_action_count: usize) -> StageResult<()> {
        if self.action_items.len() != raw_action_count {
            return Err(StageError::SchemaValidation(format!(
                "expected {} action items, got {}",
                raw_action_count,
                self.action_items.len()
            )));
        }
        let mut seen: HashSet<&ItemId> = HashSet::new();
        for item in &self.action_items {
            if item.id.as_str().is_empty() {
                return Err(StageError::SchemaValidation("empty item id".to_string()));
            }
            if !seen.insert(&item.id) {
                return Err(StageError::SchemaValidation(format!(
                    "duplicate item id `{}`",
                    item.id
                )));
            }
        }
        Ok(())
    }
}

/// Attributes owners and deadlines to extracted actions
#[async_trait]
pub trait AttributionStage: Send + Sync {
    /// Run attribution over raw actions with meeting context
    async fn attribute(&self, request: AttributionRequest) -> StageResult<AttributionOutput>;
}

/// Request to the validation stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRequest {
    /// Items to annotate with risks, confidence, and priority
    pub action_items: Vec<ActionItem>,
}

/// Validated items with risk flags and confidence populated
///
/// Also the pipeline's final result shape. The stage scores confidence under
/// its own narrative scale; the refinement loop rescoring uses the
/// deterministic scale in `tally_model::confidence` instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationOutput {
    /// Annotated items, same identities as the request
    pub validated_items: Vec<ActionItem>,
    /// Arithmetic mean of item confidence scores; 0.0 when empty
    pub overall_confidence: f64,
}

impl ValidationOutput {
    /// Require one item per input with scores inside [0.0, 1.0]
    pub fn ensure_covers(&self, item_count: usize) -> StageResult<()> {
        if self.validated_items.len() != item_count {
            return Err(StageError::SchemaValidation(format!(
                "expected {} validated items, got {}",
                item_count,
                self.validated_items.len()
            )));
        }
        for item in &self.validated_items {
            if !item.confidence_score.is_finite()
                || !(0.0..=1.0).contains(&item.confidence_score)
            {
                return Err(StageError::SchemaValidation(format!(
                    "item `{}` confidence score {} out of range",
                    item.id, item.confidence_score
                )));
            }
        }
        if !self.overall_confidence.is_finite()
            || !(0.0..=1.0).contains(&self.overall_confidence)
        {
            return Err(StageError::SchemaValidation(format!(
                "overall confidence {} out of range",
                self.overall_confidence
            )));
        }
        Ok(())
    }
}

/// Annotates items with risk flags, confidence, and priority
#[async_trait]
pub trait ValidationStage: Send + Sync {
    /// Run validation over attributed items
    async fn validate(&self, request: ValidationRequest) -> StageResult<ValidationOutput>;
}

/// Request to the clarification stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClarificationRequest {
    /// Items that still need clarification (risk flags present)
    pub action_items: Vec<ActionItem>,
    /// Original meeting notes for context
    pub meeting_context: String,
}

/// Prioritized clarification questions for incomplete items
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClarificationOutput {
    /// Questions in priority order; ids are renumbered by the caller
    pub questions: Vec<ClarificationQuestion>,
}

impl ClarificationOutput {
    /// Require every question to reference an item from the request
    pub fn ensure_references(&self, items: &[ActionItem]) -> StageResult<()> {
        let known: HashSet<&ItemId> = items.iter().map(|i| &i.id).collect();
        for question in &self.questions {
            if !known.contains(&question.action_item_id) {
                return Err(StageError::SchemaValidation(format!(
                    "question {} references unknown item `{}`",
                    question.question_id, question.action_item_id
                )));
            }
        }
        Ok(())
    }
}

/// Generates targeted clarification questions for incomplete items
#[async_trait]
pub trait ClarificationStage: Send + Sync {
    /// Generate prioritized questions for the given items
    async fn clarify(&self, request: ClarificationRequest) -> StageResult<ClarificationOutput>;
}
