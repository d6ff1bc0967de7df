//! Action items and their risk annotations
//!
//! The central record produced by the pipeline:
//! - `ActionItem` with attribution, confidence, and risk metadata
//! - `RiskFlag` typed concerns attached to an item
//! - Query helpers over item sets

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Stable action-item identifier
///
/// Assigned once when the item is created (by the attribution stage or its
/// fallback) and never reused. Opaque to the core; external layers may use
/// UUIDs or sequence numbers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create an id from any string-like value
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Priority scale, shared by items, risk severities, and questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Nice-to-have, no immediate deadline
    Low,
    /// Standard work item
    Medium,
    /// Important for project success
    High,
    /// Urgent or blocking other work
    Critical,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// Discrete confidence level derived from a confidence score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    /// Significant missing information
    Low,
    /// Most information present, minor clarification needed
    Medium,
    /// Clear task, explicit owner, specific deadline
    High,
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        write!(f, "{s}")
    }
}

/// Typed concern attached to an action item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskType {
    /// Task is unclear or open to interpretation
    VagueDescription,
    /// No person assigned
    MissingOwner,
    /// No timeline specified
    MissingDeadline,
    /// Depends on something not clearly defined
    UnclearDependency,
    /// Too large; should be broken into smaller items
    ScopeTooBroad,
    /// Owner may be overloaded with critical tasks
    ConflictingAssignment,
}

impl std::fmt::Display for RiskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::VagueDescription => "vague_description",
            Self::MissingOwner => "missing_owner",
            Self::MissingDeadline => "missing_deadline",
            Self::UnclearDependency => "unclear_dependency",
            Self::ScopeTooBroad => "scope_too_broad",
            Self::ConflictingAssignment => "conflicting_assignment",
        };
        write!(f, "{s}")
    }
}

/// A risk identified on one action item
///
/// Flags have no identity beyond owning item + type; deduplication within a
/// fallback pass compares `risk_type` only. Insertion order is preserved for
/// display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFlag {
    /// Kind of concern
    pub risk_type: RiskType,
    /// Specific explanation of the issue
    pub description: String,
    /// How critical the risk is
    pub severity: Priority,
    /// Question that would resolve the risk, if one can be phrased
    pub suggested_clarification: Option<String>,
}

impl RiskFlag {
    /// Create a flag with a resolving question
    #[must_use]
    pub fn new(
        risk_type: RiskType,
        description: impl Into<String>,
        severity: Priority,
        suggested_clarification: impl Into<String>,
    ) -> Self {
        Self {
            risk_type,
            description: description.into(),
            severity,
            suggested_clarification: Some(suggested_clarification.into()),
        }
    }
}

/// One extracted task with attribution, risk, and confidence metadata
///
/// Items are created by the attribution stage, annotated by the validation
/// stage, and updated by the refinement loop. All mutation happens on private
/// copies; the core never deletes an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    /// Stable identifier, assigned at creation
    pub id: ItemId,
    /// What needs to be done
    pub description: String,
    /// Responsible person; only set when explicitly stated in the source
    pub owner: Option<String>,
    /// Calendar deadline; only set when explicitly stated in the source
    pub deadline: Option<NaiveDate>,
    /// Priority level
    pub priority: Priority,
    /// Discrete confidence level
    pub confidence: ConfidenceLevel,
    /// Confidence score in [0.0, 1.0]
    pub confidence_score: f64,
    /// Risks needing clarification, in insertion order
    #[serde(default)]
    pub risk_flags: Vec<RiskFlag>,
    /// Ids of items this one depends on (no cycle detection)
    #[serde(default)]
    pub dependencies: Vec<ItemId>,
    /// Relevant surrounding information from the meeting
    #[serde(default)]
    pub context: Option<String>,
    /// Caller-settable completion marker; advisory only, never derived here
    #[serde(default)]
    pub is_complete: bool,
}

impl ActionItem {
    /// Create an item with neutral defaults (Medium priority, Low/0.3 confidence)
    #[must_use]
    pub fn new(id: impl Into<ItemId>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            owner: None,
            deadline: None,
            priority: Priority::Medium,
            confidence: ConfidenceLevel::Low,
            confidence_score: 0.3,
            risk_flags: Vec::new(),
            dependencies: Vec::new(),
            context: None,
            is_complete: false,
        }
    }

    /// With an owner
    #[inline]
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// With a deadline
    #[inline]
    #[must_use]
    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// With a priority
    #[inline]
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// With confidence level and score
    #[inline]
    #[must_use]
    pub fn with_confidence(mut self, level: ConfidenceLevel, score: f64) -> Self {
        self.confidence = level;
        self.confidence_score = score;
        self
    }

    /// With a risk flag appended
    #[inline]
    #[must_use]
    pub fn with_risk(mut self, flag: RiskFlag) -> Self {
        self.risk_flags.push(flag);
        self
    }

    /// Whether the item still needs human clarification
    ///
    /// Derived: true exactly when the risk-flag list is non-empty. This
    /// predicate, not `is_complete`, drives the refinement loop.
    #[inline]
    #[must_use]
    pub fn needs_clarification(&self) -> bool {
        !self.risk_flags.is_empty()
    }

    /// Whether a flag of the given type is present
    #[inline]
    #[must_use]
    pub fn has_risk(&self, risk_type: RiskType) -> bool {
        self.risk_flags.iter().any(|r| r.risk_type == risk_type)
    }

    /// Remove every flag of the given type, preserving the order of the rest
    pub fn clear_risks(&mut self, risk_type: RiskType) {
        self.risk_flags.retain(|r| r.risk_type != risk_type);
    }
}

/// Arithmetic mean of item confidence scores; 0.0 for an empty set
#[must_use]
pub fn overall_confidence(items: &[ActionItem]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    items.iter().map(|i| i.confidence_score).sum::<f64>() / items.len() as f64
}

/// Items carrying two or more risk flags
#[must_use]
pub fn high_risk_items(items: &[ActionItem]) -> Vec<&ActionItem> {
    items.iter().filter(|i| i.risk_flags.len() >= 2).collect()
}

/// Items at the given priority level
#[must_use]
pub fn items_by_priority(items: &[ActionItem], priority: Priority) -> Vec<&ActionItem> {
    items.iter().filter(|i| i.priority == priority).collect()
}
