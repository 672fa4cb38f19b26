//! # Property-Based Tests
//!
//! Determinism and bound invariants checked with proptest.

use proptest::collection::vec;
use proptest::prelude::*;
use thrive_core::{
    ActionType, AssetType, CapitalExposure, CapitalState, ExecutionIntent, ExecutionPlanner,
    ObservedBalance, PositionInput, StateEngine, calculate_truth, plan_digest, plan_to_payloads,
    simulate, validate_plan,
};

fn asset_type() -> impl Strategy<Value = AssetType> {
    prop_oneof![Just(AssetType::Stock), Just(AssetType::Crypto)]
}

fn position() -> impl Strategy<Value = PositionInput> {
    (
        asset_type(),
        0.0f64..10_000.0,
        0.0f64..1_000.0,
        0.0f64..1_000.0,
        0i64..2_000,
        proptest::option::of(0.0f64..0.2),
    )
        .prop_map(|(kind, quantity, cost, price, days, state)| {
            let position = PositionInput::new(kind, "PROP", quantity, cost, price, days);
            match state {
                Some(rate) => position.with_state_tax_rate(rate),
                None => position,
            }
        })
}

fn asset_code() -> impl Strategy<Value = String> {
    prop_oneof![Just("USD"), Just("EUR"), Just("BTC"), Just("SOL")].prop_map(str::to_string)
}

// =============================================================================
// TRUTH ENGINE
// =============================================================================

proptest! {
    /// Same position, same result.
    #[test]
    fn truth_is_deterministic(position in position()) {
        let a = calculate_truth(&position).expect("valid");
        let b = calculate_truth(&position).expect("valid");
        prop_assert_eq!(a, b);
    }

    /// Taxes never exceed the gross value and never go negative.
    #[test]
    fn net_is_bounded_by_gross(position in position()) {
        let result = calculate_truth(&position).expect("valid");
        prop_assert!(result.total_tax >= 0.0);
        prop_assert!(result.net_liquid_wealth <= result.gross_value + 1e-9);
        prop_assert!(result.efficiency_score >= 0.0);
        prop_assert!(result.efficiency_score <= 100.0 + 1e-9);
    }

    /// Gains are taxed; losses carry an offset instead.
    #[test]
    fn gains_and_losses_are_exclusive(position in position()) {
        let result = calculate_truth(&position).expect("valid");
        if result.total_gain > 0.0 {
            prop_assert!(result.loss_offset_value.is_none());
        } else {
            prop_assert_eq!(result.total_tax, 0.0);
            prop_assert!(result.loss_offset_value.is_some());
        }
    }

    /// A countdown only exists inside the 60 day window before long-term.
    #[test]
    fn countdown_window(days in 0i64..1_000) {
        let position = PositionInput::new(AssetType::Stock, "X", 1.0, 1.0, 1.0, days);
        let result = calculate_truth(&position).expect("valid");
        match result.tax_classification_countdown {
            Some(n) => {
                prop_assert!((1..=60).contains(&n));
                prop_assert_eq!(days + n, 366);
            }
            None => prop_assert!(days > 365 || days < 306),
        }
    }

    /// Negative inputs are always rejected.
    #[test]
    fn negative_quantity_rejected(quantity in -10_000.0f64..-0.001) {
        let position = PositionInput::new(AssetType::Stock, "X", quantity, 1.0, 1.0, 1);
        prop_assert!(calculate_truth(&position).is_err());
    }
}

// =============================================================================
// PLANS
// =============================================================================

proptest! {
    /// Every planner output passes validation and adapts cleanly.
    #[test]
    fn planner_output_validates(
        action in prop_oneof![
            Just(ActionType::Swap),
            Just(ActionType::Transfer),
            Just(ActionType::Hold),
        ],
        amount in 0.001f64..1_000_000.0,
        quantities in vec(0.0f64..1_000.0, 1..5),
    ) {
        let exposures = quantities
            .iter()
            .enumerate()
            .map(|(i, q)| CapitalExposure::new(format!("A{}", i), *q))
            .collect();
        let plan = ExecutionPlanner::new()
            .plan(
                ExecutionIntent::new(action, "USD", "EUR", amount),
                CapitalState::new("prop", exposures),
            )
            .expect("planner output is valid");

        prop_assert!(validate_plan(&plan).is_ok());
        let payloads = plan_to_payloads(&plan).expect("adapts");
        let expected = usize::from(action != ActionType::Hold);
        prop_assert_eq!(payloads.len(), expected);

        let dry_run = simulate(&payloads).expect("simulates");
        prop_assert_eq!(dry_run.total_gas_used, 21_000 * expected as u64);
    }

    /// Digests are stable and distinguish amounts.
    #[test]
    fn digest_tracks_amount(a in 1u32..10_000, b in 1u32..10_000) {
        let build = |amount: u32| {
            ExecutionPlanner::new()
                .plan(
                    ExecutionIntent::new(ActionType::Swap, "USD", "EUR", f64::from(amount)),
                    CapitalState::new("prop", vec![CapitalExposure::new("USD", 1.0)]),
                )
                .expect("valid")
        };
        let da = plan_digest(&build(a)).expect("digest");
        prop_assert_eq!(&da, &plan_digest(&build(a)).expect("digest"));
        if a != b {
            prop_assert_ne!(da, plan_digest(&build(b)).expect("digest"));
        }
    }
}

// =============================================================================
// CAPITAL
// =============================================================================

proptest! {
    /// Snapshot totals equal the sum of observations, exposures are sorted
    /// and unique.
    #[test]
    fn ingest_conserves_and_sorts(
        observations in vec((asset_code(), 0u32..10_000, prop_oneof![Just("a"), Just("b")]), 0..20)
    ) {
        let observed: Vec<ObservedBalance> = observations
            .iter()
            .map(|(code, qty, src)| ObservedBalance::new(code.clone(), f64::from(*qty), *src))
            .collect();
        let expected: f64 = observed.iter().map(|o| o.quantity).sum();

        let state = StateEngine::default().ingest(observed, "now");
        prop_assert_eq!(state.snapshot.total_quantity(), expected);

        let codes: Vec<&str> = state
            .snapshot
            .exposures
            .iter()
            .map(|e| e.unit.asset_code.as_str())
            .collect();
        let mut sorted = codes.clone();
        sorted.sort_unstable();
        sorted.dedup();
        prop_assert_eq!(codes, sorted);
    }
}
