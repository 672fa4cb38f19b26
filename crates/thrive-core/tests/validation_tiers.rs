//! # Validation Tier Tests (T0-T4)
//!
//! If ANY tier fails, the engine is INVALID.
//!
//! ## Tiers
//! - T0: Truth Engine Reference Values
//! - T1: Plan Construction & Validation
//! - T2: Execution Gating
//! - T3: Adapter & Dry Run
//! - T4: Custody Lifecycle

use thrive_core::{
    ActionType, AssetType, CapitalExposure, CapitalState, ConfidenceLevel, ExecutionController,
    ExecutionIntent, ExecutionMode, ExecutionPlan, ExecutionPlanner, GuardPolicy, PositionInput,
    TaxClassification, ThriveError, calculate_truth,
};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn transfer_plan(amount: f64) -> ExecutionPlan {
    ExecutionPlanner::new()
        .plan(
            ExecutionIntent::new(ActionType::Transfer, "USD", "EUR", amount),
            CapitalState::new(
                "snapshot-1",
                vec![CapitalExposure::new("EUR", 25.0), CapitalExposure::new("USD", 100.0)],
            ),
        )
        .expect("valid plan")
}

// =============================================================================
// TIER T0: TRUTH ENGINE REFERENCE VALUES
// =============================================================================

mod t0_truth_reference {
    use super::*;

    /// T0.1: Long-term gain with a state rate.
    #[test]
    fn long_term_gain() {
        let position = PositionInput::new(AssetType::Stock, "TEST", 100.0, 10.0, 20.0, 400)
            .with_state_tax_rate(0.05);
        let result = calculate_truth(&position).expect("valid");

        assert!(close(result.gross_value, 2000.0));
        assert!(close(result.total_tax, 200.0));
        assert!(close(result.net_liquid_wealth, 1800.0));
        assert!(close(result.efficiency_score, 90.0));
        assert_eq!(result.tax_classification, TaxClassification::LongTerm);
        assert_eq!(result.confidence_level, ConfidenceLevel::High);
    }

    /// T0.2: Short-term gain without a state rate is still HIGH.
    #[test]
    fn short_term_gain_without_state_rate() {
        let position = PositionInput::new(AssetType::Stock, "TEST", 10.0, 50.0, 60.0, 100);
        let result = calculate_truth(&position).expect("valid");

        assert!(close(result.federal_tax, 25.0));
        assert!(close(result.state_tax, 0.0));
        assert_eq!(result.tax_classification, TaxClassification::ShortTerm);
        assert_eq!(result.confidence_level, ConfidenceLevel::High);
        assert!(
            result
                .assumptions
                .iter()
                .any(|a| a == "No state tax applied because state_tax_rate was not provided.")
        );
    }

    /// T0.3: Losses yield an offset, not a tax bill.
    #[test]
    fn loss_offset() {
        let position = PositionInput::new(AssetType::Crypto, "COIN", 2.0, 100.0, 50.0, 30)
            .with_state_tax_rate(0.05);
        let result = calculate_truth(&position).expect("valid");

        assert!(close(result.total_gain, -100.0));
        assert!(close(result.total_tax, 0.0));
        assert!(close(result.loss_offset_value.expect("offset"), 30.0));
        assert_eq!(result.confidence_level, ConfidenceLevel::High);
    }

    /// T0.4: Zero price forces LOW confidence and 100% efficiency.
    #[test]
    fn zero_price() {
        let position = PositionInput::new(AssetType::Stock, "ZERO", 10.0, 5.0, 0.0, 10);
        let result = calculate_truth(&position).expect("valid");
        assert_eq!(result.confidence_level, ConfidenceLevel::Low);
        assert!(close(result.efficiency_score, 100.0));
    }

    /// T0.5: Day 365 is short-term with a one-day countdown.
    #[test]
    fn threshold_boundary() {
        let at = PositionInput::new(AssetType::Stock, "B", 1.0, 1.0, 2.0, 365);
        let result = calculate_truth(&at).expect("valid");
        assert_eq!(result.tax_classification, TaxClassification::ShortTerm);
        assert_eq!(result.tax_classification_countdown, Some(1));

        let after = PositionInput::new(AssetType::Stock, "B", 1.0, 1.0, 2.0, 366);
        let result = calculate_truth(&after).expect("valid");
        assert_eq!(result.tax_classification, TaxClassification::LongTerm);
        assert_eq!(result.tax_classification_countdown, None);
    }

    /// T0.6: Invalid inputs are rejected with their messages.
    #[test]
    fn invalid_inputs() {
        let bad = PositionInput::new(AssetType::Stock, "B", 1.0, 1.0, 1.0, -1);
        let err = calculate_truth(&bad).expect_err("negative days");
        assert_eq!(err.to_string(), "days_held cannot be negative.");

        let bad = PositionInput::new(AssetType::Stock, "B", 1.0, -1.0, 1.0, 1);
        let err = calculate_truth(&bad).expect_err("negative basis");
        assert_eq!(err.to_string(), "Prices and cost basis must be non-negative.");
    }
}

// =============================================================================
// TIER T1: PLAN CONSTRUCTION & VALIDATION
// =============================================================================

mod t1_plans {
    use super::*;

    /// T1.1: Same intent and state produce the same plan.
    #[test]
    fn deterministic() {
        assert_eq!(transfer_plan(10.0), transfer_plan(10.0));
    }

    /// T1.2: Plans survive a JSON round trip and stay valid.
    #[test]
    fn json_wire_format() {
        let plan = transfer_plan(10.0);
        let json = serde_json::to_value(&plan).expect("serialize");
        assert_eq!(json["intent"]["action_type"], "TRANSFER");
        assert_eq!(json["steps"][0]["sequence"], 1);
        assert_eq!(json["required_signatures"][0]["signer_reference"], "primary");

        let parsed: ExecutionPlan = serde_json::from_value(json).expect("deserialize");
        assert_eq!(parsed, plan);
        thrive_core::validate_plan(&parsed).expect("still valid");
    }

    /// T1.3: Unknown action types are rejected at the boundary.
    #[test]
    fn unknown_action_rejected() {
        let mut json = serde_json::to_value(transfer_plan(10.0)).expect("serialize");
        json["intent"]["action_type"] = "BRIDGE".into();
        let err = serde_json::from_value::<ExecutionPlan>(json).expect_err("unknown action");
        assert!(err.to_string().contains("Unsupported action type: BRIDGE"));
    }

    /// T1.4: Chain vocabulary never enters a plan.
    #[test]
    fn forbidden_vocabulary() {
        let err = ExecutionPlanner::new()
            .plan(
                ExecutionIntent::new(ActionType::Swap, "USD", "EUR", 1.0),
                CapitalState::new("gas-snapshot", vec![]),
            )
            .expect_err("forbidden token");
        assert_eq!(err.to_string(), "Plan contains forbidden execution knowledge.");
    }
}

// =============================================================================
// TIER T2: EXECUTION GATING
// =============================================================================

mod t2_gating {
    use super::*;

    /// T2.1: A fresh controller blocks every plan.
    #[test]
    fn fresh_controller_blocks() {
        let mut controller = ExecutionController::new();
        assert!(matches!(
            controller.evaluate_plan(&transfer_plan(1.0), None),
            Err(ThriveError::ExecutionBlocked(_))
        ));
    }

    /// T2.2: Guarded mode passes only allow-listed steps, once per arming.
    #[test]
    fn guarded_once() {
        let policy = GuardPolicy::new(vec![ActionType::Transfer])
            .with_allowed_assets(vec!["USD".to_string(), "EUR".to_string()]);
        let mut controller = ExecutionController::new();
        controller
            .set_mode(ExecutionMode::Guarded, Some(policy))
            .expect("guarded");
        controller.arm();

        let decisions = controller
            .evaluate_plan(&transfer_plan(1.0), None)
            .expect("allowed");
        assert!(decisions.iter().all(|d| d.allowed));
        assert!(controller.evaluate_plan(&transfer_plan(1.0), None).is_err());
    }
}

// =============================================================================
// TIER T3: ADAPTER & DRY RUN
// =============================================================================

mod t3_adapter {
    use super::*;
    use thrive_core::{plan_to_payloads, simulate};

    /// T3.1: One payload per moving step, priced at 21 000 gas.
    #[test]
    fn dry_run_totals() {
        let payloads = plan_to_payloads(&transfer_plan(10.0)).expect("payloads");
        assert_eq!(
            payloads[0].data,
            format!("0x{}", "5452414e534645527c5553447c4555527c31307c31")
        );
        let result = simulate(&payloads).expect("simulate");
        assert_eq!(result.total_gas_used, 21_000);
        assert_eq!(result.total_cost_wei, 21_000);
    }
}

// =============================================================================
// TIER T4: CUSTODY LIFECYCLE
// =============================================================================

mod t4_custody {
    use thrive_core::{FileKeyStore, KeyStore, PassphraseEncryptor, ThriveError, WalletCore};

    /// T4.1: Wallets persist to disk and only the right passphrase opens them.
    #[test]
    fn file_backed_lifecycle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("wallets.json");

        let make = || {
            WalletCore::new(
                Box::new(FileKeyStore::new(&path)),
                Box::new(PassphraseEncryptor::new().with_iterations(1_000)),
            )
        };

        let mut wallet = make();
        let meta = wallet.create_wallet("cold", "correct horse").expect("create");
        let account = wallet.add_account(&meta.wallet_id, "main", None).expect("account");

        let mut reopened = make();
        assert_eq!(reopened.list_wallets().expect("list"), vec![meta.clone()]);
        assert!(matches!(
            reopened.unlock(&meta.wallet_id, "battery staple"),
            Err(ThriveError::InvalidPassphrase)
        ));
        reopened.unlock(&meta.wallet_id, "correct horse").expect("unlock");
        let signature = reopened
            .sign(&meta.wallet_id, &account.derivation_path, b"WALLET PROOF CHECK")
            .expect("sign");
        assert_eq!(signature.len(), 64);

        let record = FileKeyStore::new(&path).load(&meta.wallet_id).expect("record");
        assert_eq!(record.accounts, vec![account]);
    }
}
