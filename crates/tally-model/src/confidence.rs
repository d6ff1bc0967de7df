//! Deterministic confidence scoring
//!
//! Pure function of one item's current fields. This is the single source of
//! truth for confidence recomputation inside the refinement loop. The
//! validation stage's own narrative scoring guidance uses different
//! thresholds; the two scales are deliberately independent.

use crate::item::{ActionItem, ConfidenceLevel};

/// Base score for any extracted item
pub const BASE: f64 = 0.5;
/// Bonus when an owner is assigned
pub const OWNER_BONUS: f64 = 0.35;
/// Bonus when a deadline is set
pub const DEADLINE_BONUS: f64 = 0.25;
/// Bonus when the description is longer than [`MIN_DESCRIPTION_LEN`] chars
pub const DESCRIPTION_BONUS: f64 = 0.10;
/// Penalty per outstanding risk flag
pub const RISK_PENALTY: f64 = 0.10;
/// Description length above which the description bonus applies
pub const MIN_DESCRIPTION_LEN: usize = 10;

/// Score at or above which the level is High
pub const HIGH_THRESHOLD: f64 = 0.75;
/// Score at or above which the level is Medium
pub const MEDIUM_THRESHOLD: f64 = 0.50;

/// Compute the confidence score for an item, clamped to [0.0, 1.0]
#[must_use]
pub fn score(item: &ActionItem) -> f64 {
    let mut score = BASE;

    if item.owner.is_some() {
        score += OWNER_BONUS;
    }
    if item.deadline.is_some() {
        score += DEADLINE_BONUS;
    }
    if item.description.chars().count() > MIN_DESCRIPTION_LEN {
        score += DESCRIPTION_BONUS;
    }

    score -= item.risk_flags.len() as f64 * RISK_PENALTY;

    score.clamp(0.0, 1.0)
}

/// Map a score to its discrete level
#[inline]
#[must_use]
pub fn level_for(score: f64) -> ConfidenceLevel {
    if score >= HIGH_THRESHOLD {
        ConfidenceLevel::High
    } else if score >= MEDIUM_THRESHOLD {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    }
}

/// Recompute and store both score and level on an item
pub fn rescore(item: &mut ActionItem) {
    item.confidence_score = score(item);
    item.confidence = level_for(item.confidence_score);
}
