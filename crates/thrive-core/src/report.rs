//! # Liquidation Report
//!
//! Human-readable rendering of a `TruthResult`.
//!
//! This is a pure transformation to `String`; printing is done by the app.

use crate::truth::{PositionInput, TruthResult};

/// Title line of every report.
pub const REPORT_TITLE: &str = "Thrive Truth Engine - Liquidation Reality Check";

/// Width of the rule under the title.
const RULE_WIDTH: usize = 60;

/// Format a value as dollars with thousands separators (`$1,234.56`, `$-200.00`).
#[must_use]
pub fn format_currency(value: f64) -> String {
    let rounded = format!("{:.2}", value.abs());
    let (whole, cents) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // "-0.00" is not a loss worth signalling
    let sign = if value < 0.0 && rounded != "0.00" { "-" } else { "" };
    format!("${}{}.{}", sign, grouped, cents)
}

/// Render the full liquidation report.
#[must_use]
pub fn render_report(position: &PositionInput, result: &TruthResult) -> String {
    let gain_label = if result.total_gain >= 0.0 { "gain" } else { "loss" };

    let mut lines = vec![
        REPORT_TITLE.to_string(),
        "=".repeat(RULE_WIDTH),
        format!("Position: {} ({})", position.ticker, position.asset_type),
        format!("Quantity: {} units", position.quantity),
        format!("Current price: {}", format_currency(position.current_price)),
        format!(
            "Cost basis per unit: {}",
            format_currency(position.cost_basis_per_unit)
        ),
        String::new(),
        format!(
            "Gross liquidation value: {}",
            format_currency(result.gross_value)
        ),
        format!(
            "Total {}: {} ({})",
            gain_label,
            format_currency(result.total_gain),
            result.tax_classification.label()
        ),
        format!("Federal tax: {}", format_currency(result.federal_tax)),
        format!("State tax: {}", format_currency(result.state_tax)),
        format!("Total estimated tax: {}", format_currency(result.total_tax)),
        format!(
            "Net liquid wealth: {}",
            format_currency(result.net_liquid_wealth)
        ),
        format!("Efficiency score: {:.2}%", result.efficiency_score),
        format!("Confidence: {}", result.confidence_level),
    ];

    if let Some(days) = result.tax_classification_countdown {
        lines.push(format!(
            "Timing note: Tax classification changes in {} days.",
            days
        ));
    }

    if let Some(offset) = result.loss_offset_value {
        lines.push(format!(
            "Loss offset insight: Potential future tax offset worth {}.",
            format_currency(offset)
        ));
    }

    lines.push(String::new());
    lines.push("Assumptions and caveats:".to_string());
    lines.extend(result.assumptions.iter().map(|a| format!("- {}", a)));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::truth::calculate_truth;

    #[test]
    fn currency_grouping() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(999.5), "$999.50");
        assert_eq!(format_currency(1234.567), "$1,234.57");
        assert_eq!(format_currency(1_234_567.0), "$1,234,567.00");
        assert_eq!(format_currency(-2500.0), "$-2,500.00");
        assert_eq!(format_currency(-200.0), "$-200.00");
        assert_eq!(format_currency(-0.001), "$0.00");
    }

    #[test]
    fn demo_report_layout() {
        let position = PositionInput::demo();
        let result = calculate_truth(&position).expect("demo is valid");
        let report = render_report(&position, &result);
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines[0], REPORT_TITLE);
        assert_eq!(lines[1].len(), 60);
        assert_eq!(lines[2], "Position: AAPL (stock)");
        assert_eq!(lines[3], "Quantity: 50 units");
        assert!(report.contains("Gross liquidation value: $9,000.00"));
        assert!(report.contains("Total gain: $3,000.00 (short-term)"));
        assert!(report.contains("Federal tax: $750.00"));
        assert!(report.contains("State tax: $150.00"));
        assert!(report.contains("Net liquid wealth: $8,100.00"));
        assert!(report.contains("Efficiency score: 90.00%"));
        assert!(report.contains("Timing note: Tax classification changes in 26 days."));
        assert!(!report.contains("Loss offset insight"));
        assert!(report.contains("Assumptions and caveats:\n- Federal long-term"));
    }

    #[test]
    fn loss_report_mentions_offset() {
        let position = PositionInput::new(crate::AssetType::Stock, "DOWN", 10.0, 100.0, 80.0, 500);
        let result = calculate_truth(&position).expect("valid");
        let report = render_report(&position, &result);
        assert!(report.contains("Total loss: $-200.00 (long-term)"));
        assert!(report.contains("Loss offset insight: Potential future tax offset worth $30.00."));
    }
}
