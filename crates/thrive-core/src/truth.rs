//! # Truth Engine
//!
//! After-tax liquidation math for a single position.
//!
//! Given what a position would sell for today, the engine reports the
//! capital gain, the federal and state tax owed on it, the net liquid wealth
//! left over and how efficient the liquidation is. Losses produce no tax bill
//! but an estimated offset value. Every number is accompanied by the list of
//! assumptions it rests on.
//!
//! The computation is pure: the same `PositionInput` always produces the
//! same `TruthResult`.

use crate::confidence::assess_confidence;
use crate::primitives::{
    COUNTDOWN_WINDOW_DAYS, DEFAULT_FILING_STATUS, FEDERAL_LONG_TERM_RATE,
    FEDERAL_SHORT_TERM_RATE, LONG_TERM_THRESHOLD_DAYS,
};
use crate::{AssetType, ConfidenceLevel, TaxClassification, ThriveError};
use serde::{Deserialize, Serialize};

// =============================================================================
// INPUT / OUTPUT
// =============================================================================

fn default_filing_status() -> String {
    DEFAULT_FILING_STATUS.to_string()
}

/// One position to liquidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionInput {
    pub asset_type: AssetType,
    pub ticker: String,
    pub quantity: f64,
    pub cost_basis_per_unit: f64,
    pub current_price: f64,
    pub days_held: i64,
    #[serde(default = "default_filing_status")]
    pub filing_status: String,
    #[serde(default)]
    pub state_tax_rate: Option<f64>,
}

impl PositionInput {
    /// Create a position with the default filing status and no state rate.
    #[must_use]
    pub fn new(
        asset_type: AssetType,
        ticker: impl Into<String>,
        quantity: f64,
        cost_basis_per_unit: f64,
        current_price: f64,
        days_held: i64,
    ) -> Self {
        Self {
            asset_type,
            ticker: ticker.into(),
            quantity,
            cost_basis_per_unit,
            current_price,
            days_held,
            filing_status: default_filing_status(),
            state_tax_rate: None,
        }
    }

    /// Attach a state tax rate (e.g. `0.05` for 5%).
    #[must_use]
    pub fn with_state_tax_rate(mut self, rate: f64) -> Self {
        self.state_tax_rate = Some(rate);
        self
    }

    /// The position used by `thrive truth --demo`.
    #[must_use]
    pub fn demo() -> Self {
        Self::new(AssetType::Stock, "AAPL", 50.0, 120.0, 180.0, 340).with_state_tax_rate(0.05)
    }

    /// True when the position has nothing to liquidate or no price.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.quantity == 0.0 || self.current_price == 0.0
    }
}

/// Deterministic calculation output for a single position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruthResult {
    pub gross_value: f64,
    pub total_gain: f64,
    pub tax_classification: TaxClassification,
    pub federal_tax: f64,
    pub state_tax: f64,
    pub total_tax: f64,
    pub net_liquid_wealth: f64,
    pub efficiency_score: f64,
    pub confidence_level: ConfidenceLevel,
    pub assumptions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss_offset_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_classification_countdown: Option<i64>,
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Long-term when held strictly longer than a year.
#[must_use]
pub fn determine_tax_classification(days_held: i64) -> TaxClassification {
    if days_held > LONG_TERM_THRESHOLD_DAYS {
        TaxClassification::LongTerm
    } else {
        TaxClassification::ShortTerm
    }
}

/// Assumed federal capital gains rate for the classification.
#[must_use]
pub fn determine_federal_rate(classification: TaxClassification) -> f64 {
    match classification {
        TaxClassification::LongTerm => FEDERAL_LONG_TERM_RATE,
        TaxClassification::ShortTerm => FEDERAL_SHORT_TERM_RATE,
    }
}

/// Days until the position turns long-term, when that is within the window.
#[must_use]
pub fn tax_classification_countdown(days_held: i64) -> Option<i64> {
    let adjusted = days_held.max(0);
    if adjusted > LONG_TERM_THRESHOLD_DAYS {
        return None;
    }
    let days_until = LONG_TERM_THRESHOLD_DAYS + 1 - adjusted;
    (days_until <= COUNTDOWN_WINDOW_DAYS).then_some(days_until)
}

// =============================================================================
// VALIDATION
// =============================================================================

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Reject positions the engine cannot reason about.
pub fn validate_position(position: &PositionInput) -> Result<(), ThriveError> {
    if !is_non_negative(position.quantity) {
        return Err(ThriveError::InvalidPosition(
            "quantity must be non-negative.".to_string(),
        ));
    }
    if !is_non_negative(position.cost_basis_per_unit) || !is_non_negative(position.current_price)
    {
        return Err(ThriveError::InvalidPosition(
            "Prices and cost basis must be non-negative.".to_string(),
        ));
    }
    if position.days_held < 0 {
        return Err(ThriveError::InvalidPosition(
            "days_held cannot be negative.".to_string(),
        ));
    }
    if let Some(rate) = position.state_tax_rate
        && !rate.is_finite()
    {
        return Err(ThriveError::InvalidPosition(
            "state_tax_rate must be a finite number.".to_string(),
        ));
    }
    Ok(())
}

// =============================================================================
// CALCULATION
// =============================================================================

/// Render a rate as a percentage with two decimals (`0.05` -> `5.00%`).
#[must_use]
pub fn format_percent(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

/// Compute after-tax liquidation values and related insights.
pub fn calculate_truth(position: &PositionInput) -> Result<TruthResult, ThriveError> {
    validate_position(position)?;

    let gross_value = position.current_price * position.quantity;
    let total_gain = (position.current_price - position.cost_basis_per_unit) * position.quantity;
    let tax_classification = determine_tax_classification(position.days_held);
    let federal_rate = determine_federal_rate(tax_classification);
    let state_rate = position.state_tax_rate;

    let mut assumptions = vec![
        "Federal long-term capital gains rate assumed at 15%.".to_string(),
        "Federal short-term capital gains rate assumed at 25%.".to_string(),
        "Taxes applied only on gains; losses generate no immediate tax bill.".to_string(),
        "No trading fees, spreads, or liquidity slippage included.".to_string(),
    ];

    match state_rate {
        None => assumptions
            .push("No state tax applied because state_tax_rate was not provided.".to_string()),
        Some(rate) => assumptions.push(format!(
            "State tax rate applied at {} on positive gains.",
            format_percent(rate)
        )),
    }

    let mut federal_tax = 0.0;
    let mut state_tax = 0.0;
    let total_tax;
    let mut loss_offset_value = None;

    if total_gain > 0.0 {
        federal_tax = total_gain * federal_rate;
        state_tax = state_rate.map_or(0.0, |rate| total_gain * rate);
        total_tax = federal_tax + state_tax;
    } else {
        total_tax = 0.0;
        let marginal_rate = federal_rate + state_rate.unwrap_or(0.0);
        loss_offset_value = Some(total_gain.abs() * marginal_rate);
        assumptions.push(format!(
            "Loss offset value estimated using marginal rate of {}.",
            format_percent(marginal_rate)
        ));
    }

    let net_liquid_wealth = gross_value - total_tax;
    let efficiency_score = if gross_value > 0.0 {
        net_liquid_wealth / gross_value * 100.0
    } else {
        100.0
    };

    let confidence = assess_confidence(position);
    assumptions.extend(confidence.notes);

    Ok(TruthResult {
        gross_value,
        total_gain,
        tax_classification,
        federal_tax,
        state_tax,
        total_tax,
        net_liquid_wealth,
        efficiency_score,
        confidence_level: confidence.level,
        assumptions,
        loss_offset_value,
        tax_classification_countdown: tax_classification_countdown(position.days_held),
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn long_term_gain_with_state_rate() {
        let position = PositionInput::new(AssetType::Stock, "TEST", 100.0, 10.0, 20.0, 400)
            .with_state_tax_rate(0.05);
        let result = calculate_truth(&position).expect("valid position");

        assert!(close(result.gross_value, 2000.0));
        assert!(close(result.total_gain, 1000.0));
        assert_eq!(result.tax_classification, TaxClassification::LongTerm);
        assert!(close(result.federal_tax, 150.0));
        assert!(close(result.state_tax, 50.0));
        assert!(close(result.total_tax, 200.0));
        assert!(close(result.net_liquid_wealth, 1800.0));
        assert!(close(result.efficiency_score, 90.0));
        assert_eq!(result.confidence_level, ConfidenceLevel::High);
        assert!(result.loss_offset_value.is_none());
        assert!(result.tax_classification_countdown.is_none());
    }

    #[test]
    fn assumptions_are_ordered() {
        let position = PositionInput::new(AssetType::Stock, "TEST", 1.0, 1.0, 2.0, 10)
            .with_state_tax_rate(0.05);
        let result = calculate_truth(&position).expect("valid position");
        assert_eq!(
            result.assumptions,
            vec![
                "Federal long-term capital gains rate assumed at 15%.",
                "Federal short-term capital gains rate assumed at 25%.",
                "Taxes applied only on gains; losses generate no immediate tax bill.",
                "No trading fees, spreads, or liquidity slippage included.",
                "State tax rate applied at 5.00% on positive gains.",
            ]
        );
    }

    #[test]
    fn loss_produces_offset_and_full_efficiency() {
        let position = PositionInput::new(AssetType::Stock, "LOSS", 10.0, 100.0, 80.0, 500)
            .with_state_tax_rate(0.05);
        let result = calculate_truth(&position).expect("valid position");

        assert!(close(result.total_tax, 0.0));
        assert!(close(result.loss_offset_value.expect("offset"), 40.0));
        assert!(close(result.efficiency_score, 100.0));
        assert_eq!(result.confidence_level, ConfidenceLevel::High);
        assert!(result
            .assumptions
            .contains(&"Loss offset value estimated using marginal rate of 20.00%.".to_string()));
    }

    #[test]
    fn crypto_without_state_rate_is_medium() {
        let position = PositionInput::new(AssetType::Crypto, "BTC", 2.0, 1000.0, 1500.0, 200);
        let result = calculate_truth(&position).expect("valid position");

        assert_eq!(result.tax_classification, TaxClassification::ShortTerm);
        assert!(close(result.total_tax, 250.0));
        assert!(close(result.efficiency_score, 91.666_666_666_666_67));
        assert_eq!(result.confidence_level, ConfidenceLevel::Medium);
    }

    #[test]
    fn zero_quantity_is_low_confidence() {
        let position = PositionInput::new(AssetType::Stock, "ZERO", 0.0, 10.0, 20.0, 10)
            .with_state_tax_rate(0.05);
        let result = calculate_truth(&position).expect("valid position");

        assert!(close(result.gross_value, 0.0));
        assert!(close(result.net_liquid_wealth, 0.0));
        assert!(close(result.efficiency_score, 100.0));
        assert_eq!(result.confidence_level, ConfidenceLevel::Low);
    }

    #[test]
    fn countdown_window() {
        assert_eq!(tax_classification_countdown(350), Some(16));
        assert_eq!(tax_classification_countdown(365), Some(1));
        assert_eq!(tax_classification_countdown(306), Some(60));
        assert_eq!(tax_classification_countdown(305), None);
        assert_eq!(tax_classification_countdown(366), None);
    }

    #[test]
    fn classification_boundary() {
        assert_eq!(determine_tax_classification(365), TaxClassification::ShortTerm);
        assert_eq!(determine_tax_classification(366), TaxClassification::LongTerm);
    }

    #[test]
    fn validation_messages() {
        let mut position = PositionInput::new(AssetType::Stock, "X", -1.0, 1.0, 1.0, 1);
        let err = calculate_truth(&position).expect_err("negative quantity");
        assert_eq!(err.to_string(), "quantity must be non-negative.");

        position.quantity = 1.0;
        position.current_price = -1.0;
        let err = calculate_truth(&position).expect_err("negative price");
        assert_eq!(err.to_string(), "Prices and cost basis must be non-negative.");

        position.current_price = 1.0;
        position.days_held = -5;
        let err = calculate_truth(&position).expect_err("negative days");
        assert_eq!(err.to_string(), "days_held cannot be negative.");
    }

    #[test]
    fn optional_fields_are_omitted_from_json() {
        let position = PositionInput::new(AssetType::Stock, "TEST", 100.0, 10.0, 20.0, 400)
            .with_state_tax_rate(0.05);
        let result = calculate_truth(&position).expect("valid position");
        let json = serde_json::to_value(&result).expect("serialize");
        assert!(json.get("loss_offset_value").is_none());
        assert!(json.get("tax_classification_countdown").is_none());
        assert_eq!(json["tax_classification"], "long_term");
        assert_eq!(json["confidence_level"], "HIGH");
    }

    #[test]
    fn position_defaults_from_json() {
        let position: PositionInput = serde_json::from_str(
            r#"{"asset_type":"Stock","ticker":"T","quantity":1,"cost_basis_per_unit":1,"current_price":2,"days_held":3}"#,
        )
        .expect("deserialize");
        assert_eq!(position.filing_status, "single");
        assert!(position.state_tax_rate.is_none());
    }
}
