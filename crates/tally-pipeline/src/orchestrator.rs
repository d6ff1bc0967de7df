//! Pipeline orchestration
//!
//! Sequences Extraction → Attribution → Validation through the stage
//! invoker. Every stage is individually fault-tolerant; the only error that
//! can escape `run` is a failure inside a deterministic fallback.

use std::sync::Arc;

use tally_model::ActionItem;
use tally_stage::{
    sanitize_text, AttributionRequest, AttributionStage, ExtractionRequest, ExtractionStage,
    FallbackError, StageInvoker, ValidationOutput, ValidationRequest, ValidationStage,
};

use crate::config::PipelineConfig;
use crate::fallback;

/// Orchestrates the meeting-to-action-item pipeline
///
/// Stateless across calls; a single instance can serve concurrent runs.
pub struct MeetingPipeline {
    extraction: Arc<dyn ExtractionStage>,
    attribution: Arc<dyn AttributionStage>,
    validation: Arc<dyn ValidationStage>,
    invoker: StageInvoker,
    config: PipelineConfig,
}

impl MeetingPipeline {
    /// Create a pipeline over the three stage capabilities
    #[must_use]
    pub fn new(
        extraction: Arc<dyn ExtractionStage>,
        attribution: Arc<dyn AttributionStage>,
        validation: Arc<dyn ValidationStage>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            extraction,
            attribution,
            validation,
            invoker: StageInvoker::new(config.retry),
            config,
        }
    }

    /// Run the full pipeline over raw meeting text
    ///
    /// Returns a usable result even when every stage degrades; degraded runs
    /// are distinguishable only by conservative confidence scores and
    /// explanatory risk flags. An empty extraction short-circuits: the result
    /// is empty with 0.0 overall confidence and the remaining stages are
    /// never invoked.
    pub async fn run(
        &self,
        meeting_text: &str,
        participants: &[String],
    ) -> Result<ValidationOutput, FallbackError> {
        tracing::info!(
            "starting pipeline: {} chars of meeting text, {} participants",
            meeting_text.chars().count(),
            participants.len()
        );

        let raw_actions = self.run_extraction(meeting_text).await?;
        if raw_actions.is_empty() {
            tracing::warn!("no actions extracted from meeting");
            return Ok(ValidationOutput {
                validated_items: Vec::new(),
                overall_confidence: 0.0,
            });
        }

        let action_items = self
            .run_attribution(raw_actions, meeting_text, participants)
            .await?;
        let output = self.run_validation(action_items).await?;

        tracing::info!(
            "pipeline completed: {} items, overall confidence {:.2}",
            output.validated_items.len(),
            output.overall_confidence
        );
        Ok(output)
    }

    /// Extraction stage: sanitized meeting text in, raw action list out
    async fn run_extraction(&self, meeting_text: &str) -> Result<Vec<String>, FallbackError> {
        let cap = self.config.input_cap;
        let request = ExtractionRequest {
            meeting_text: meeting_text.to_string(),
        };

        let outcome = self
            .invoker
            .invoke_sanitized(
                "extract",
                request,
                move |mut request| {
                    request.meeting_text = sanitize_text(&request.meeting_text, cap);
                    request
                },
                |request| {
                    let stage = Arc::clone(&self.extraction);
                    async move {
                        let output = stage.extract(request).await?;
                        output.ensure_well_formed()?;
                        Ok(output)
                    }
                },
                |request| Ok(fallback::extraction_fallback(&request)),
            )
            .await?;

        let degraded = outcome.is_degraded();
        let output = outcome.into_value();
        tracing::info!(
            "extraction completed: {} actions found, degraded={degraded}",
            output.raw_actions.len()
        );
        Ok(output.raw_actions)
    }

    /// Attribution stage: raw actions plus context in, action items out
    async fn run_attribution(
        &self,
        raw_actions: Vec<String>,
        meeting_text: &str,
        participants: &[String],
    ) -> Result<Vec<ActionItem>, FallbackError> {
        let cap = self.config.input_cap;
        let expected = raw_actions.len();
        let request = AttributionRequest {
            raw_actions,
            meeting_text: meeting_text.to_string(),
            participants: participants.to_vec(),
        };

        let outcome = self
            .invoker
            .invoke_sanitized(
                "attribute",
                request,
                move |mut request| {
                    request.meeting_text = sanitize_text(&request.meeting_text, cap);
                    request
                },
                |request| {
                    let stage = Arc::clone(&self.attribution);
                    async move {
                        let output = stage.attribute(request).await?;
                        output.ensure_covers(expected)?;
                        Ok(output)
                    }
                },
                |request| Ok(fallback::attribution_fallback(&request)),
            )
            .await?;

        let degraded = outcome.is_degraded();
        let items = outcome.into_value().action_items;
        tracing::info!(
            "attribution completed: {} with owner, {} with deadline, degraded={degraded}",
            items.iter().filter(|i| i.owner.is_some()).count(),
            items.iter().filter(|i| i.deadline.is_some()).count()
        );
        Ok(items)
    }

    /// Validation stage: items in, risk-annotated items out
    async fn run_validation(
        &self,
        action_items: Vec<ActionItem>,
    ) -> Result<ValidationOutput, FallbackError> {
        let expected = action_items.len();
        let request = ValidationRequest { action_items };

        let outcome = self
            .invoker
            .invoke(
                "validate",
                request,
                |request| {
                    let stage = Arc::clone(&self.validation);
                    async move {
                        let output = stage.validate(request).await?;
                        output.ensure_covers(expected)?;
                        Ok(output)
                    }
                },
                |request| Ok(fallback::validation_fallback(request.action_items)),
            )
            .await?;

        let degraded = outcome.is_degraded();
        let output = outcome.into_value();
        tracing::info!(
            "validation completed: {} total risks, degraded={degraded}",
            output
                .validated_items
                .iter()
                .map(|i| i.risk_flags.len())
                .sum::<usize>()
        );
        Ok(output)
    }
}
