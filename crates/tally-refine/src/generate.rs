//! Clarification question generation
//!
//! Filters the item set to those still carrying risk flags and asks the
//! clarification stage for targeted questions. An item set with nothing to
//! clarify never reaches the stage.

use std::sync::Arc;

use tally_model::{ActionItem, ClarificationBatch, ClarificationQuestion, Priority, QuestionField};
use tally_stage::{
    ClarificationOutput, ClarificationRequest, ClarificationStage, FallbackError, RetryPolicy,
    StageInvoker,
};

/// Generates prioritized clarification questions for incomplete items
pub struct ClarificationGenerator {
    stage: Arc<dyn ClarificationStage>,
    invoker: StageInvoker,
}

impl ClarificationGenerator {
    /// Create a generator over the clarification capability
    #[must_use]
    pub fn new(stage: Arc<dyn ClarificationStage>, retry: RetryPolicy) -> Self {
        Self {
            stage,
            invoker: StageInvoker::new(retry),
        }
    }

    /// Generate a question batch for items that need clarification
    ///
    /// Items without risk flags are filtered out first; when none remain the
    /// stage is not invoked and the batch is empty. Question ids are
    /// renumbered sequentially from 1 within the returned batch; ids are not
    /// stable across batches.
    pub async fn generate(
        &self,
        items: &[ActionItem],
        meeting_context: &str,
    ) -> Result<ClarificationBatch, FallbackError> {
        let needing: Vec<ActionItem> = items
            .iter()
            .filter(|i| i.needs_clarification())
            .cloned()
            .collect();

        tracing::info!(
            "generating clarification questions: {} of {} items need clarification",
            needing.len(),
            items.len()
        );

        if needing.is_empty() {
            return Ok(ClarificationBatch::empty());
        }

        let request = ClarificationRequest {
            action_items: needing,
            meeting_context: meeting_context.to_string(),
        };

        let outcome = self
            .invoker
            .invoke(
                "clarify",
                request,
                |request| {
                    let stage = Arc::clone(&self.stage);
                    async move {
                        let items = request.action_items.clone();
                        let output = stage.clarify(request).await?;
                        output.ensure_references(&items)?;
                        Ok(output)
                    }
                },
                |request| Ok(clarification_fallback(&request)),
            )
            .await?;

        let mut batch = ClarificationBatch::new(outcome.into_value().questions);
        batch.renumber();

        tracing::info!("generated {} clarification questions", batch.len());
        Ok(batch)
    }
}

/// Clarification fallback: one question per still-missing field
///
/// For each item, an owner question (critical) before a deadline question
/// (high), each referencing the item and field. Fields already filled get no
/// question.
#[must_use]
pub fn clarification_fallback(request: &ClarificationRequest) -> ClarificationOutput {
    tracing::warn!("using clarification fallback, generic questions only");

    let mut questions = Vec::new();
    let mut question_id = 1u32;

    for item in &request.action_items {
        if item.owner.is_none() {
            questions.push(ClarificationQuestion::new(
                question_id,
                format!("Who should be responsible for: {}?", item.description),
                QuestionField::Owner,
                item.id.clone(),
                Priority::Critical,
            ));
            question_id += 1;
        }

        if item.deadline.is_none() {
            questions.push(ClarificationQuestion::new(
                question_id,
                format!("What is the deadline for: {}?", item.description),
                QuestionField::Deadline,
                item.id.clone(),
                Priority::High,
            ));
            question_id += 1;
        }
    }

    ClarificationOutput { questions }
}
