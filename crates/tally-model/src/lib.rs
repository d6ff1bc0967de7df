//! Tally data model
//!
//! The typed vocabulary shared by every pipeline and refinement component:
//! - Action items with attribution, risk, and confidence metadata
//! - Risk flags and the priority/confidence scales
//! - Clarification questions issued in numbered batches
//! - The deterministic confidence scorer
//!
//! # Example
//!
//! ```rust
//! use tally_model::{ActionItem, confidence};
//!
//! let mut item = ActionItem::new("1", "Publish the API changelog").with_owner("Alice");
//! confidence::rescore(&mut item);
//! assert!(item.confidence_score > 0.5);
//! ```

pub mod confidence;
pub mod item;
pub mod question;

pub use item::{
    high_risk_items, items_by_priority, overall_confidence, ActionItem, ConfidenceLevel, ItemId,
    Priority, RiskFlag, RiskType,
};
pub use question::{ClarificationBatch, ClarificationQuestion, QuestionField};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the Tally data model
    pub use crate::{
        ActionItem, ClarificationBatch, ClarificationQuestion, ConfidenceLevel, ItemId, Priority,
        QuestionField, RiskFlag, RiskType,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
