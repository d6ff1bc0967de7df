//! Tally refinement loop
//!
//! Human-in-the-loop correction for validated action items:
//! - Clarification question generation over items that still carry risk
//!   flags, with a deterministic fallback
//! - Batched answer application on private copies with per-answer failure
//!   isolation and deterministic confidence rescoring
//! - The re-enterable refinement workflow controller
//!
//! # Example
//!
//! ```rust,ignore
//! use tally_refine::RefinementController;
//!
//! let controller = RefinementController::new(clarify, retry);
//!
//! // First call issues questions; a later call applies the answers.
//! let round = controller.run(&items, context, None).await?;
//! let round = controller.run(&items, context, Some(&responses)).await?;
//! ```

pub mod apply;
pub mod controller;
pub mod generate;

pub use apply::{apply_answers, AppliedAnswers, DEADLINE_FORMAT};
pub use controller::{
    allowed_transitions, validate_transition, RefinementController, RefinementError,
    RefinementRound, RefinementState,
};
pub use generate::{clarification_fallback, ClarificationGenerator};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
