//! Clarification questions
//!
//! Targeted requests for one missing field on one item, issued in numbered
//! batches by the refinement loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::item::{ItemId, Priority};

/// The item field a clarification question targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionField {
    /// Who is responsible
    Owner,
    /// When it is due
    Deadline,
    /// What specifically needs to be done
    Description,
}

impl std::fmt::Display for QuestionField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Owner => "owner",
            Self::Deadline => "deadline",
            Self::Description => "description",
        };
        write!(f, "{s}")
    }
}

/// One clarification question for one field of one item
///
/// `question_id` is unique within its generation batch only; ids restart at 1
/// in every batch. The question references its item, it does not own it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarificationQuestion {
    /// Sequential id within the batch, starting at 1
    pub question_id: u32,
    /// The question text shown to the respondent
    pub question: String,
    /// Which field the answer fills
    pub field: QuestionField,
    /// The referenced action item
    pub action_item_id: ItemId,
    /// How urgent the missing information is
    pub priority: Priority,
    /// The respondent's answer, set once when applied
    #[serde(default)]
    pub answer: Option<String>,
    /// When the answer was recorded
    #[serde(default)]
    pub answered_at: Option<DateTime<Utc>>,
}

impl ClarificationQuestion {
    /// Create an unanswered question
    #[must_use]
    pub fn new(
        question_id: u32,
        question: impl Into<String>,
        field: QuestionField,
        action_item_id: impl Into<ItemId>,
        priority: Priority,
    ) -> Self {
        Self {
            question_id,
            question: question.into(),
            field,
            action_item_id: action_item_id.into(),
            priority,
            answer: None,
            answered_at: None,
        }
    }
}

/// One generation batch of clarification questions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClarificationBatch {
    /// Questions in priority order
    pub questions: Vec<ClarificationQuestion>,
}

impl ClarificationBatch {
    /// An empty batch
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Batch from a question list
    #[inline]
    #[must_use]
    pub fn new(questions: Vec<ClarificationQuestion>) -> Self {
        Self { questions }
    }

    /// Number of questions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the batch has no questions
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Reassign question ids sequentially from 1, keeping order
    ///
    /// Generation normalizes ids after the semantic stage returns so batch
    /// numbering never depends on what the backend produced.
    pub fn renumber(&mut self) {
        for (index, question) in self.questions.iter_mut().enumerate() {
            question.question_id = index as u32 + 1;
        }
    }

    /// Find a question by its batch-local id
    #[must_use]
    pub fn find(&self, question_id: u32) -> Option<&ClarificationQuestion> {
        self.questions.iter().find(|q| q.question_id == question_id)
    }
}
