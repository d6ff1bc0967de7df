//! Tally pipeline
//!
//! The orchestrator that turns unstructured meeting text into validated,
//! risk-annotated action items:
//! - Extraction → Attribution → Validation, each behind the stage invoker
//! - Deterministic per-stage fallbacks so a run never aborts on one failure
//! - Empty-extraction short-circuit
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tally_pipeline::{MeetingPipeline, PipelineConfig};
//!
//! let pipeline = MeetingPipeline::new(extract, attribute, validate, PipelineConfig::new());
//! let result = pipeline.run(notes, &participants).await?;
//! println!("{} items extracted", result.validated_items.len());
//! ```

pub mod config;
pub mod fallback;
pub mod orchestrator;

pub use config::PipelineConfig;
pub use orchestrator::MeetingPipeline;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
