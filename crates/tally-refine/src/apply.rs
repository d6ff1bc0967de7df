//! Batched answer application
//!
//! Applies a batch of clarification answers to a private copy of the item
//! set, resolves matching risk flags, and rescores confidence. Each answer
//! is isolated: a bad answer is logged and dropped without disturbing the
//! rest of the batch.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, Utc};

use tally_model::{
    confidence, ActionItem, ClarificationQuestion, ItemId, QuestionField, RiskType,
};

/// Date format accepted for deadline answers
pub const DEADLINE_FORMAT: &str = "%Y-%m-%d";

/// Result of applying one answer batch
#[derive(Debug, Clone)]
pub struct AppliedAnswers {
    /// The updated item set; an independent copy of the input
    pub items: Vec<ActionItem>,
    /// Questions that were applied, stamped with answer and timestamp, for
    /// the persistence collaborator
    pub answered: Vec<ClarificationQuestion>,
}

/// Apply answered questions to a copy of the item set
///
/// The caller's items are never touched. An empty answer map is a no-op
/// returning an unchanged copy. Per applied answer:
/// - owner: set verbatim, drop all missing_owner flags
/// - deadline: parse year-month-day; on success set and drop all
///   missing_deadline flags, on failure log and skip this answer only
/// - description: overwrite, drop all vague_description flags
///
/// Answers referencing unknown items are logged and skipped. Confidence is
/// recomputed exactly once per touched item, after all of its answers.
#[must_use]
pub fn apply_answers(
    items: &[ActionItem],
    questions: &[ClarificationQuestion],
    answers: &BTreeMap<u32, String>,
) -> AppliedAnswers {
    let mut updated: Vec<ActionItem> = items.to_vec();
    let mut answered: Vec<ClarificationQuestion> = Vec::new();

    if answers.is_empty() {
        return AppliedAnswers {
            items: updated,
            answered,
        };
    }

    tracing::info!(
        "applying {} answers against {} questions",
        answers.len(),
        questions.len()
    );

    let mut touched: BTreeSet<ItemId> = BTreeSet::new();

    for question in questions {
        let Some(answer) = answers.get(&question.question_id) else {
            continue;
        };

        let Some(item) = updated.iter_mut().find(|i| i.id == question.action_item_id) else {
            tracing::warn!(
                "item `{}` not found for question {}, skipping answer",
                question.action_item_id,
                question.question_id
            );
            continue;
        };

        match question.field {
            QuestionField::Owner => {
                item.owner = Some(answer.clone());
                item.clear_risks(RiskType::MissingOwner);
                tracing::debug!("item `{}` owner set to `{answer}`", item.id);
            }
            QuestionField::Deadline => match NaiveDate::parse_from_str(answer, DEADLINE_FORMAT) {
                Ok(date) => {
                    item.deadline = Some(date);
                    item.clear_risks(RiskType::MissingDeadline);
                    tracing::debug!("item `{}` deadline set to {date}", item.id);
                }
                Err(error) => {
                    tracing::warn!(
                        "could not parse deadline answer `{answer}` for item `{}`: {error}",
                        item.id
                    );
                    continue;
                }
            },
            QuestionField::Description => {
                item.description = answer.clone();
                item.clear_risks(RiskType::VagueDescription);
                tracing::debug!("item `{}` description updated", item.id);
            }
        }

        touched.insert(question.action_item_id.clone());

        let mut stamped = question.clone();
        stamped.answer = Some(answer.clone());
        stamped.answered_at = Some(Utc::now());
        answered.push(stamped);
    }

    for item in updated.iter_mut().filter(|i| touched.contains(&i.id)) {
        confidence::rescore(item);
    }

    tracing::info!(
        "applied {} of {} answers, {} risk flags remain",
        answered.len(),
        answers.len(),
        updated.iter().map(|i| i.risk_flags.len()).sum::<usize>()
    );

    AppliedAnswers {
        items: updated,
        answered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tally_model::{ConfidenceLevel, Priority, RiskFlag};

    fn incomplete_item() -> ActionItem {
        ActionItem::new("2", "Integrate with existing user database")
            .with_risk(RiskFlag::new(
                RiskType::MissingOwner,
                "No owner assigned",
                Priority::High,
                "Who is responsible for integrating with the existing user database?",
            ))
            .with_risk(RiskFlag::new(
                RiskType::MissingDeadline,
                "No deadline specified",
                Priority::Medium,
                "What is the deadline for the user database integration?",
            ))
    }

    fn question_pair() -> Vec<ClarificationQuestion> {
        vec![
            ClarificationQuestion::new(
                1,
                "Who is responsible for this?",
                QuestionField::Owner,
                "2",
                Priority::Critical,
            ),
            ClarificationQuestion::new(
                2,
                "When is it due?",
                QuestionField::Deadline,
                "2",
                Priority::High,
            ),
        ]
    }

    #[test]
    fn owner_and_deadline_answers_fully_resolve_an_item() {
        let items = vec![incomplete_item()];
        let answers = BTreeMap::from([
            (1, "Carol".to_string()),
            (2, "2026-02-05".to_string()),
        ]);

        let applied = apply_answers(&items, &question_pair(), &answers);
        let item = &applied.items[0];

        assert_eq!(item.owner.as_deref(), Some("Carol"));
        assert_eq!(item.deadline, NaiveDate::from_ymd_opt(2026, 2, 5));
        assert!(item.risk_flags.is_empty());
        assert_eq!(item.confidence_score, 1.0);
        assert_eq!(item.confidence, ConfidenceLevel::High);

        // Input untouched.
        assert_eq!(items[0].owner, None);
        assert_eq!(items[0].risk_flags.len(), 2);
    }

    #[test]
    fn unparseable_deadline_changes_nothing_on_the_item() {
        let items = vec![incomplete_item()];
        let before = items[0].confidence_score;
        let answers = BTreeMap::from([(2, "not-a-date".to_string())]);

        let applied = apply_answers(&items, &question_pair(), &answers);
        let item = &applied.items[0];

        assert_eq!(item.deadline, None);
        assert!(item.has_risk(RiskType::MissingDeadline));
        assert_eq!(item.confidence_score, before);
        assert!(applied.answered.is_empty());
    }

    #[test]
    fn bad_deadline_does_not_block_the_rest_of_the_batch() {
        let items = vec![incomplete_item()];
        let answers = BTreeMap::from([
            (1, "Carol".to_string()),
            (2, "next Friday".to_string()),
        ]);

        let applied = apply_answers(&items, &question_pair(), &answers);
        let item = &applied.items[0];

        assert_eq!(item.owner.as_deref(), Some("Carol"));
        assert!(!item.has_risk(RiskType::MissingOwner));
        assert_eq!(item.deadline, None);
        assert!(item.has_risk(RiskType::MissingDeadline));
        assert_eq!(applied.answered.len(), 1);
    }

    #[test]
    fn unknown_item_reference_is_skipped() {
        let items = vec![incomplete_item()];
        let questions = vec![ClarificationQuestion::new(
            1,
            "Who owns the mystery item?",
            QuestionField::Owner,
            "99",
            Priority::Critical,
        )];
        let answers = BTreeMap::from([(1, "Carol".to_string())]);

        let applied = apply_answers(&items, &questions, &answers);
        assert_eq!(applied.items, items);
        assert!(applied.answered.is_empty());
    }

    #[test]
    fn empty_answer_map_is_a_no_op() {
        let items = vec![incomplete_item()];
        let applied = apply_answers(&items, &question_pair(), &BTreeMap::new());
        assert_eq!(applied.items, items);
        assert!(applied.answered.is_empty());
    }

    #[test]
    fn description_answer_clears_vague_description_flags() {
        let items = vec![ActionItem::new("3", "Security review").with_risk(RiskFlag::new(
            RiskType::VagueDescription,
            "Description lacks specifics",
            Priority::High,
            "What should the security review cover?",
        ))];
        let questions = vec![ClarificationQuestion::new(
            1,
            "What should the security review cover?",
            QuestionField::Description,
            "3",
            Priority::High,
        )];
        let answers = BTreeMap::from([(1, "Review auth flows for the launch".to_string())]);

        let applied = apply_answers(&items, &questions, &answers);
        let item = &applied.items[0];
        assert_eq!(item.description, "Review auth flows for the launch");
        assert!(!item.has_risk(RiskType::VagueDescription));

        let answered = &applied.answered[0];
        assert_eq!(answered.answer.as_deref(), Some("Review auth flows for the launch"));
        assert!(answered.answered_at.is_some());
    }

    #[test]
    fn answers_for_one_item_rescore_it_once_with_final_fields() {
        // Owner applied then deadline applied; rescore happens after both, so
        // the final score reflects owner + deadline + no flags.
        let items = vec![incomplete_item()];
        let answers = BTreeMap::from([
            (1, "Carol".to_string()),
            (2, "2026-02-05".to_string()),
        ]);

        let applied = apply_answers(&items, &question_pair(), &answers);
        assert_eq!(applied.items[0].confidence_score, 1.0);
        assert_eq!(applied.answered.len(), 2);
    }
}
