//! Deterministic stage fallbacks
//!
//! Conservative substitute results used when a stage fails after exhausting
//! retries. Each is a pure function of the original stage input, so degraded
//! runs are exactly reproducible.

use tally_model::{
    overall_confidence, ActionItem, ConfidenceLevel, Priority, RiskFlag, RiskType,
};
use tally_stage::{
    AttributionOutput, AttributionRequest, ExtractionOutput, ExtractionRequest, ValidationOutput,
};

/// Confidence score forced onto every item produced under fallback
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

/// Extraction fallback: one synthetic action naming the input length
///
/// Guarantees downstream stages always see at least one item.
#[must_use]
pub fn extraction_fallback(request: &ExtractionRequest) -> ExtractionOutput {
    tracing::warn!("using extraction fallback, returning generic action");
    ExtractionOutput {
        raw_actions: vec![format!(
            "Review meeting notes and identify action items (length: {} chars)",
            request.meeting_text.chars().count()
        )],
    }
}

/// Attribution fallback: wrap each raw action without owner or deadline
///
/// Every item gets Medium priority, Low/0.3 confidence, and a missing_owner
/// plus missing_deadline flag, each with a clarification question that
/// references the description.
#[must_use]
pub fn attribution_fallback(request: &AttributionRequest) -> AttributionOutput {
    tracing::warn!("using attribution fallback, no owner/deadline assignment");

    let action_items = request
        .raw_actions
        .iter()
        .enumerate()
        .map(|(index, action)| {
            ActionItem::new((index + 1).to_string(), action.clone())
                .with_priority(Priority::Medium)
                .with_confidence(ConfidenceLevel::Low, FALLBACK_CONFIDENCE)
                .with_risk(RiskFlag::new(
                    RiskType::MissingOwner,
                    "Owner not assigned; attribution stage unavailable",
                    Priority::High,
                    format!("Who should be responsible for: {action}?"),
                ))
                .with_risk(RiskFlag::new(
                    RiskType::MissingDeadline,
                    "Deadline not set; attribution stage unavailable",
                    Priority::High,
                    format!("What is the deadline for: {action}?"),
                ))
        })
        .collect();

    AttributionOutput { action_items }
}

/// Validation fallback: conservative flags and confidence
///
/// Appends a missing_owner (High) or missing_deadline (Medium) flag only
/// where the field is absent and no flag of that type exists yet, so
/// repeated application never duplicates flags. Forces Low/0.3 confidence on
/// every item.
#[must_use]
pub fn validation_fallback(action_items: Vec<ActionItem>) -> ValidationOutput {
    tracing::warn!("using validation fallback, conservative confidence assignment");

    let mut items = action_items;
    for item in &mut items {
        if item.owner.is_none() && !item.has_risk(RiskType::MissingOwner) {
            let question = format!("Who will handle: {}?", item.description);
            item.risk_flags.push(RiskFlag::new(
                RiskType::MissingOwner,
                "No owner assigned",
                Priority::High,
                question,
            ));
        }

        if item.deadline.is_none() && !item.has_risk(RiskType::MissingDeadline) {
            let question = format!("When is the deadline for: {}?", item.description);
            item.risk_flags.push(RiskFlag::new(
                RiskType::MissingDeadline,
                "No deadline specified",
                Priority::Medium,
                question,
            ));
        }

        item.confidence = ConfidenceLevel::Low;
        item.confidence_score = FALLBACK_CONFIDENCE;
    }

    let overall_confidence = overall_confidence(&items);
    ValidationOutput {
        validated_items: items,
        overall_confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn extraction_fallback_names_input_length() {
        let request = ExtractionRequest {
            meeting_text: "x".repeat(42),
        };
        let output = extraction_fallback(&request);
        assert_eq!(output.raw_actions.len(), 1);
        assert!(output.raw_actions[0].contains("42 chars"));
    }

    #[test]
    fn attribution_fallback_flags_every_item() {
        let request = AttributionRequest {
            raw_actions: vec!["Review docs".to_string(), "Ship release".to_string()],
            meeting_text: String::new(),
            participants: vec![],
        };

        let output = attribution_fallback(&request);
        assert_eq!(output.action_items.len(), 2);

        let first = &output.action_items[0];
        assert_eq!(first.id.as_str(), "1");
        assert_eq!(first.owner, None);
        assert_eq!(first.deadline, None);
        assert_eq!(first.priority, Priority::Medium);
        assert_eq!(first.confidence, ConfidenceLevel::Low);
        assert_eq!(first.confidence_score, FALLBACK_CONFIDENCE);
        assert!(first.has_risk(RiskType::MissingOwner));
        assert!(first.has_risk(RiskType::MissingDeadline));
        assert!(first.risk_flags[0]
            .suggested_clarification
            .as_deref()
            .unwrap()
            .contains("Review docs"));
    }

    #[test]
    fn validation_fallback_is_idempotent() {
        let items = vec![
            ActionItem::new("1", "Review docs"),
            ActionItem::new("2", "Ship release").with_owner("Alice"),
        ];

        let once = validation_fallback(items);
        let twice = validation_fallback(once.validated_items.clone());

        for (a, b) in once.validated_items.iter().zip(&twice.validated_items) {
            assert_eq!(a.risk_flags.len(), b.risk_flags.len());
        }

        // Item without owner gains both flags; item with owner only the deadline flag.
        assert_eq!(twice.validated_items[0].risk_flags.len(), 2);
        assert_eq!(twice.validated_items[1].risk_flags.len(), 1);
        assert!(twice.validated_items[1].has_risk(RiskType::MissingDeadline));
    }

    #[test]
    fn validation_fallback_respects_existing_fields() {
        let deadline = NaiveDate::from_ymd_opt(2026, 1, 30).unwrap();
        let items = vec![ActionItem::new("1", "Implement auth")
            .with_owner("Alice")
            .with_deadline(deadline)];

        let output = validation_fallback(items);
        let item = &output.validated_items[0];
        assert!(item.risk_flags.is_empty());
        assert_eq!(item.confidence, ConfidenceLevel::Low);
        assert_eq!(item.confidence_score, FALLBACK_CONFIDENCE);
        assert_eq!(output.overall_confidence, FALLBACK_CONFIDENCE);
    }

    #[test]
    fn validation_fallback_on_empty_set_reports_zero_confidence() {
        let output = validation_fallback(vec![]);
        assert!(output.validated_items.is_empty());
        assert_eq!(output.overall_confidence, 0.0);
    }
}
