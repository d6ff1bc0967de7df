//! Refinement workflow controller
//!
//! A re-enterable generate-questions / apply-answers loop. Each call is one
//! step of the round-trip state machine:
//!
//! AwaitingResponse → Applying → Resolved, or back to AwaitingResponse while
//! risk flags remain. The controller imposes no maximum round count; the
//! caller bounds the loop.

use std::collections::BTreeMap;
use std::sync::Arc;

use uuid::Uuid;

use tally_model::{ActionItem, ClarificationBatch, ClarificationQuestion};
use tally_stage::{ClarificationStage, FallbackError, RetryPolicy};

use crate::apply::apply_answers;
use crate::generate::ClarificationGenerator;

/// Refinement round-trip states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RefinementState {
    /// Questions issued, no answers yet
    AwaitingResponse,
    /// Answers supplied and being applied
    Applying,
    /// No remaining risk flags
    Resolved,
}

/// Errors from the refinement controller
#[derive(Debug, thiserror::Error)]
pub enum RefinementError {
    /// A stage fallback failed; fatal
    #[error(transparent)]
    Fallback(#[from] FallbackError),

    /// A state transition outside the round-trip table was attempted
    #[error("illegal refinement transition: {from:?} -> {to:?}")]
    IllegalTransition {
        /// State transitioned from
        from: RefinementState,
        /// State transitioned to
        to: RefinementState,
    },
}

/// States reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: RefinementState) -> Vec<RefinementState> {
    use RefinementState::*;
    match from {
        AwaitingResponse => vec![Applying],
        Applying => vec![Resolved, AwaitingResponse],
        Resolved => vec![],
    }
}

/// Validate a state transition against the round-trip table
pub fn validate_transition(
    from: RefinementState,
    to: RefinementState,
) -> Result<(), RefinementError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(RefinementError::IllegalTransition { from, to })
    }
}

/// Outcome of one refinement call
#[derive(Debug, Clone)]
pub struct RefinementRound {
    /// The (possibly updated) item set; always an independent copy
    pub items: Vec<ActionItem>,
    /// Remaining questions; `None` exactly when no item carries risk flags
    pub questions: Option<ClarificationBatch>,
    /// Questions applied this round, stamped with answers and timestamps
    pub answered: Vec<ClarificationQuestion>,
    /// State the round ended in
    pub state: RefinementState,
}

/// Composes question generation and answer application into a loop
///
/// Stateless across calls: each invocation reconstructs the outstanding
/// batch from the item set it is given, so concurrent refinements never
/// share state.
pub struct RefinementController {
    generator: ClarificationGenerator,
}

impl RefinementController {
    /// Create a controller over the clarification capability
    #[must_use]
    pub fn new(stage: Arc<dyn ClarificationStage>, retry: RetryPolicy) -> Self {
        Self {
            generator: ClarificationGenerator::new(stage, retry),
        }
    }

    /// Run one refinement step
    ///
    /// Without responses (or with an empty map): generate questions over the
    /// items and return them with the items unchanged. With responses:
    /// reconstruct the issued batch, apply the answers to a private copy,
    /// regenerate over the updated items, and return both. The returned
    /// question batch is absent exactly when every item's risk-flag list is
    /// empty.
    pub async fn run(
        &self,
        items: &[ActionItem],
        meeting_context: &str,
        responses: Option<&BTreeMap<u32, String>>,
    ) -> Result<RefinementRound, RefinementError> {
        let round_id = Uuid::new_v4();
        tracing::info!("starting refinement round {round_id} over {} items", items.len());

        let issued = self.generator.generate(items, meeting_context).await?;

        let responses = match responses {
            Some(map) if !map.is_empty() => map,
            _ => {
                let state = if issued.is_empty() && items.iter().all(|i| !i.needs_clarification())
                {
                    RefinementState::Resolved
                } else {
                    RefinementState::AwaitingResponse
                };
                tracing::info!(
                    "refinement round {round_id}: issued {} questions, state {state:?}",
                    issued.len()
                );
                return Ok(RefinementRound {
                    items: items.to_vec(),
                    questions: match state {
                        RefinementState::Resolved => None,
                        _ => Some(issued),
                    },
                    answered: Vec::new(),
                    state,
                });
            }
        };

        validate_transition(RefinementState::AwaitingResponse, RefinementState::Applying)?;

        let applied = apply_answers(items, &issued.questions, responses);
        let remaining = self
            .generator
            .generate(&applied.items, meeting_context)
            .await?;

        let resolved = applied.items.iter().all(|i| !i.needs_clarification());
        let state = if resolved {
            RefinementState::Resolved
        } else {
            RefinementState::AwaitingResponse
        };
        validate_transition(RefinementState::Applying, state)?;

        tracing::info!(
            "refinement round {round_id}: applied {} answers, {} questions remain, state {state:?}",
            applied.answered.len(),
            remaining.len()
        );

        Ok(RefinementRound {
            items: applied.items,
            questions: if resolved { None } else { Some(remaining) },
            answered: applied.answered,
            state,
        })
    }
}
