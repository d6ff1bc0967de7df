//! Tally stage layer
//!
//! Everything the core needs to talk to a semantic stage without depending
//! on any backend:
//! - Capability traits for the four stages (extract, attribute, validate,
//!   clarify) with typed request/output shapes
//! - The stage error taxonomy with transient classification
//! - Free-text input sanitization
//! - The generic [`StageInvoker`] retry/backoff/fallback wrapper
//!
//! # Example
//!
//! ```rust,ignore
//! use tally_stage::{RetryPolicy, StageInvoker};
//!
//! let invoker = StageInvoker::new(RetryPolicy::new());
//! let outcome = invoker
//!     .invoke("extract", request, |req| backend.extract(req), fallback)
//!     .await?;
//! ```

pub mod capability;
pub mod error;
pub mod invoker;
pub mod sanitize;

pub use capability::{
    AttributionOutput, AttributionRequest, AttributionStage, ClarificationOutput,
    ClarificationRequest, ClarificationStage, ExtractionOutput, ExtractionRequest,
    ExtractionStage, ValidationOutput, ValidationRequest, ValidationStage,
};
pub use error::{FallbackError, StageError, StageResult};
pub use invoker::{RetryPolicy, StageInvoker, StageOutcome};
pub use sanitize::{sanitize_text, DEFAULT_INPUT_CAP, TRUNCATION_MARKER};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
