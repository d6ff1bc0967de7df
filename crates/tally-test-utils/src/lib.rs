//! Testing utilities for the Tally workspace
//!
//! Scripted mock stages, canonical item fixtures, and tracing setup.

#![allow(missing_docs)]

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;

use tally_model::{
    overall_confidence, ActionItem, ClarificationQuestion, ConfidenceLevel, Priority, RiskFlag,
    RiskType,
};
use tally_stage::{
    AttributionOutput, AttributionRequest, AttributionStage, ClarificationOutput,
    ClarificationRequest, ClarificationStage, ExtractionOutput, ExtractionRequest,
    ExtractionStage, StageError, StageResult, ValidationOutput, ValidationRequest,
    ValidationStage,
};

/// Install a test tracing subscriber; safe to call from every test.
pub fn init_test_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// How a scripted stage responds to successive calls.
#[derive(Debug, Clone, Copy)]
pub enum CallPlan {
    /// Succeed on every call
    Succeed,
    /// Fail transiently this many times, then succeed
    FailTimes(u32),
    /// Fail transiently on every call
    AlwaysFail,
    /// Fail non-transiently on every call
    AlwaysFailFatal,
}

impl CallPlan {
    /// Error for the given 0-based call index, or None to succeed.
    fn error_for(&self, call_index: u32) -> Option<StageError> {
        match self {
            Self::Succeed => None,
            Self::FailTimes(failures) if call_index < *failures => {
                Some(StageError::RemoteCall("scripted transient failure".to_string()))
            }
            Self::FailTimes(_) => None,
            Self::AlwaysFail => {
                Some(StageError::RemoteCall("scripted transient failure".to_string()))
            }
            Self::AlwaysFailFatal => {
                Some(StageError::Other("scripted fatal failure".to_string()))
            }
        }
    }
}

// === MOCK STAGES ===

/// Scripted extraction stage returning a fixed action list.
pub struct MockExtraction {
    plan: CallPlan,
    raw_actions: Vec<String>,
    calls: AtomicU32,
}

impl MockExtraction {
    pub fn returning(raw_actions: Vec<&str>) -> Self {
        Self {
            plan: CallPlan::Succeed,
            raw_actions: raw_actions.into_iter().map(String::from).collect(),
            calls: AtomicU32::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::returning(vec![])
    }

    pub fn flaky(failures: u32, raw_actions: Vec<&str>) -> Self {
        Self {
            plan: CallPlan::FailTimes(failures),
            raw_actions: raw_actions.into_iter().map(String::from).collect(),
            calls: AtomicU32::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            plan: CallPlan::AlwaysFail,
            raw_actions: vec![],
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExtractionStage for MockExtraction {
    async fn extract(&self, _request: ExtractionRequest) -> StageResult<ExtractionOutput> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.plan.error_for(index) {
            Some(error) => Err(error),
            None => Ok(ExtractionOutput {
                raw_actions: self.raw_actions.clone(),
            }),
        }
    }
}

/// Scripted attribution stage; echoes raw actions into items or returns a
/// fixed item set.
pub struct MockAttribution {
    plan: CallPlan,
    fixed: Option<Vec<ActionItem>>,
    calls: AtomicU32,
}

impl MockAttribution {
    /// Wrap each raw action into a fresh item with a 1-based id.
    pub fn echoing() -> Self {
        Self {
            plan: CallPlan::Succeed,
            fixed: None,
            calls: AtomicU32::new(0),
        }
    }

    pub fn returning(items: Vec<ActionItem>) -> Self {
        Self {
            plan: CallPlan::Succeed,
            fixed: Some(items),
            calls: AtomicU32::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            plan: CallPlan::AlwaysFail,
            fixed: None,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AttributionStage for MockAttribution {
    async fn attribute(&self, request: AttributionRequest) -> StageResult<AttributionOutput> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.plan.error_for(index) {
            return Err(error);
        }
        let action_items = match &self.fixed {
            Some(items) => items.clone(),
            None => request
                .raw_actions
                .iter()
                .enumerate()
                .map(|(i, action)| ActionItem::new((i + 1).to_string(), action.clone()))
                .collect(),
        };
        Ok(AttributionOutput { action_items })
    }
}

/// Scripted validation stage; passes items through or returns a fixed set.
pub struct MockValidation {
    plan: CallPlan,
    fixed: Option<Vec<ActionItem>>,
    calls: AtomicU32,
}

impl MockValidation {
    /// Echo the request items, with overall confidence as their mean score.
    pub fn passthrough() -> Self {
        Self {
            plan: CallPlan::Succeed,
            fixed: None,
            calls: AtomicU32::new(0),
        }
    }

    pub fn returning(items: Vec<ActionItem>) -> Self {
        Self {
            plan: CallPlan::Succeed,
            fixed: Some(items),
            calls: AtomicU32::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            plan: CallPlan::AlwaysFail,
            fixed: None,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ValidationStage for MockValidation {
    async fn validate(&self, request: ValidationRequest) -> StageResult<ValidationOutput> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.plan.error_for(index) {
            return Err(error);
        }
        let validated_items = match &self.fixed {
            Some(items) => items.clone(),
            None => request.action_items,
        };
        let overall = overall_confidence(&validated_items);
        Ok(ValidationOutput {
            validated_items,
            overall_confidence: overall,
        })
    }
}

/// Scripted clarification stage returning a fixed question list.
pub struct MockClarification {
    plan: CallPlan,
    questions: Vec<ClarificationQuestion>,
    calls: AtomicU32,
}

impl MockClarification {
    pub fn returning(questions: Vec<ClarificationQuestion>) -> Self {
        Self {
            plan: CallPlan::Succeed,
            questions,
            calls: AtomicU32::new(0),
        }
    }

    pub fn flaky(failures: u32, questions: Vec<ClarificationQuestion>) -> Self {
        Self {
            plan: CallPlan::FailTimes(failures),
            questions,
            calls: AtomicU32::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            plan: CallPlan::AlwaysFail,
            questions: vec![],
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClarificationStage for MockClarification {
    async fn clarify(&self, _request: ClarificationRequest) -> StageResult<ClarificationOutput> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.plan.error_for(index) {
            Some(error) => Err(error),
            None => Ok(ClarificationOutput {
                questions: self.questions.clone(),
            }),
        }
    }
}

// === FIXTURES ===

/// Canonical meeting notes used across integration tests.
pub fn meeting_context() -> &'static str {
    "Q1 2026 Planning Meeting - January 20, 2026\n\
     Attendees: Alice (Auth Lead), Bob (Performance Engineer), Carol (Backend), David (Security)\n\
     \n\
     Alice will implement OAuth2 authentication by end of January.\n\
     We need to integrate with the existing user database.\n\
     Bob will profile the critical endpoints by Friday.\n\
     Security review is needed before launch."
}

/// Four items in canonical states: complete, missing both fields, missing a
/// deadline, and missing everything.
pub fn sample_items() -> Vec<ActionItem> {
    vec![
        ActionItem::new("1", "Implement OAuth2 authentication")
            .with_owner("Alice")
            .with_deadline(NaiveDate::from_ymd_opt(2026, 1, 30).unwrap())
            .with_priority(Priority::High)
            .with_confidence(ConfidenceLevel::High, 0.85),
        ActionItem::new("2", "Integrate with existing user database")
            .with_priority(Priority::Medium)
            .with_confidence(ConfidenceLevel::Medium, 0.50)
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
            )),
        ActionItem::new("3", "Profile critical endpoints")
            .with_owner("Bob")
            .with_priority(Priority::High)
            .with_confidence(ConfidenceLevel::Medium, 0.65)
            .with_risk(RiskFlag::new(
                RiskType::MissingDeadline,
                "No deadline specified",
                Priority::Medium,
                "What is the deadline for profiling critical endpoints?",
            ))
            .with_risk(RiskFlag::new(
                RiskType::VagueDescription,
                "Description lacks specifics",
                Priority::High,
                "Which specific endpoints need profiling?",
            )),
        ActionItem::new("4", "Security review")
            .with_priority(Priority::Critical)
            .with_confidence(ConfidenceLevel::Low, 0.35)
            .with_risk(RiskFlag::new(
                RiskType::MissingOwner,
                "No owner assigned",
                Priority::Critical,
                "Who will conduct the security review?",
            ))
            .with_risk(RiskFlag::new(
                RiskType::MissingDeadline,
                "No deadline specified",
                Priority::Critical,
                "What is the deadline for the security review?",
            ))
            .with_risk(RiskFlag::new(
                RiskType::VagueDescription,
                "Description lacks specifics",
                Priority::High,
                "What should the security review cover?",
            )),
    ]
}
