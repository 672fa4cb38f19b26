//! # Confidence Module
//!
//! Qualitative confidence scoring for truth results.
//!
//! - Integer score, starting at `CONFIDENCE_BASE_SCORE`
//! - One point is deducted per missing or uncertain input
//! - Each deduction contributes a note explaining it

use crate::primitives::{CONFIDENCE_BASE_SCORE, CONFIDENCE_HIGH_THRESHOLD, CONFIDENCE_MEDIUM_SCORE};
use crate::truth::PositionInput;
use crate::{AssetType, ConfidenceLevel};

/// Confidence assessment for a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfidenceAssessment {
    /// Remaining score after deductions.
    pub score: u8,
    /// Resulting qualitative level.
    pub level: ConfidenceLevel,
    /// One note per deduction, in deduction order.
    pub notes: Vec<String>,
}

impl ConfidenceAssessment {
    /// Check if the assessment reached HIGH.
    #[must_use]
    pub fn is_high(&self) -> bool {
        self.level == ConfidenceLevel::High
    }
}

/// Map a score to its level.
#[must_use]
pub fn level_for_score(score: u8) -> ConfidenceLevel {
    if score >= CONFIDENCE_HIGH_THRESHOLD {
        ConfidenceLevel::High
    } else if score == CONFIDENCE_MEDIUM_SCORE {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    }
}

/// Assess how much the inputs of a position can be trusted.
///
/// Deductions:
/// - missing state tax rate
/// - crypto asset (taxation varies by jurisdiction)
/// - zero quantity or zero price (also forces LOW)
#[must_use]
pub fn assess_confidence(position: &PositionInput) -> ConfidenceAssessment {
    let mut score = CONFIDENCE_BASE_SCORE;
    let mut notes = Vec::new();

    if position.state_tax_rate.is_none() {
        score = score.saturating_sub(1);
        notes.push("State tax rate missing; result excludes state-level obligations.".to_string());
    }

    if position.asset_type == AssetType::Crypto {
        score = score.saturating_sub(1);
        notes.push(
            "Crypto taxation varies; using generalized capital gains assumptions.".to_string(),
        );
    }

    let degenerate = position.is_degenerate();
    if degenerate {
        score = score.saturating_sub(1);
        notes.push("Zero quantity or price reduces certainty of liquidation math.".to_string());
    }

    let level = if degenerate {
        ConfidenceLevel::Low
    } else {
        level_for_score(score)
    };

    ConfidenceAssessment {
        score,
        level,
        notes,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_stock_position_is_high() {
        let position =
            PositionInput::new(AssetType::Stock, "A", 1.0, 1.0, 1.0, 1).with_state_tax_rate(0.05);
        let assessment = assess_confidence(&position);
        assert_eq!(assessment.score, 4);
        assert!(assessment.is_high());
        assert!(assessment.notes.is_empty());
    }

    #[test]
    fn missing_state_rate_alone_stays_high() {
        let position = PositionInput::new(AssetType::Stock, "A", 1.0, 1.0, 1.0, 1);
        let assessment = assess_confidence(&position);
        assert_eq!(assessment.score, 3);
        assert_eq!(assessment.level, ConfidenceLevel::High);
        assert_eq!(assessment.notes.len(), 1);
    }

    #[test]
    fn crypto_without_state_rate_is_medium() {
        let position = PositionInput::new(AssetType::Crypto, "B", 1.0, 1.0, 1.0, 1);
        let assessment = assess_confidence(&position);
        assert_eq!(assessment.score, 2);
        assert_eq!(assessment.level, ConfidenceLevel::Medium);
    }

    #[test]
    fn zero_price_forces_low() {
        let position =
            PositionInput::new(AssetType::Stock, "C", 1.0, 1.0, 0.0, 1).with_state_tax_rate(0.05);
        let assessment = assess_confidence(&position);
        assert_eq!(assessment.score, 3);
        assert_eq!(assessment.level, ConfidenceLevel::Low);
    }

    #[test]
    fn everything_missing_is_low() {
        let position = PositionInput::new(AssetType::Crypto, "D", 0.0, 1.0, 1.0, 1);
        let assessment = assess_confidence(&position);
        assert_eq!(assessment.score, 1);
        assert_eq!(assessment.level, ConfidenceLevel::Low);
        assert_eq!(assessment.notes.len(), 3);
    }

    #[test]
    fn level_thresholds() {
        assert_eq!(level_for_score(4), ConfidenceLevel::High);
        assert_eq!(level_for_score(3), ConfidenceLevel::High);
        assert_eq!(level_for_score(2), ConfidenceLevel::Medium);
        assert_eq!(level_for_score(1), ConfidenceLevel::Low);
        assert_eq!(level_for_score(0), ConfidenceLevel::Low);
    }
}
