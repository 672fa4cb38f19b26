//! # Execution Planner
//!
//! Builds explainable, unsigned plans from intents and validates plans
//! from any source (planner output, plan files, HTTP payloads).
//!
//! `validate_plan` is the single gate every consumer passes through: the
//! controller, the adapter and the CLI all call it before trusting a plan.

use crate::plan::{
    CapitalState, ExecutionIntent, ExecutionPlan, ExecutionStep, SignatureRequirement,
};
use crate::primitives::{CONSERVATION_DECIMALS, FORBIDDEN_PLAN_TOKENS, PRIMARY_SIGNER};
use crate::{ActionType, ThriveError};
use std::collections::BTreeMap;

fn invalid(message: &str) -> ThriveError {
    ThriveError::PlanValidation(message.to_string())
}

// =============================================================================
// PLANNER
// =============================================================================

/// Builds deterministic plans. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionPlanner;

impl ExecutionPlanner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Turn an intent over a capital state into a validated plan.
    pub fn plan(
        &self,
        intent: ExecutionIntent,
        capital_state: CapitalState,
    ) -> Result<ExecutionPlan, ThriveError> {
        let (steps, assumptions, failure_modes) = match intent.action_type {
            ActionType::Hold => (
                vec![ExecutionStep {
                    sequence: 1,
                    action_type: ActionType::Hold,
                    from_asset: intent.from_asset.clone(),
                    to_asset: intent.from_asset.clone(),
                    amount: 0.0,
                    rationale: "Hold position; no execution required.".to_string(),
                }],
                vec![
                    "Hold intent produces no execution steps beyond acknowledgement.",
                    "Capital state is a snapshot and may be stale.",
                ],
                vec!["Intent rejected by policy gate."],
            ),
            ActionType::Swap | ActionType::Transfer => (
                vec![ExecutionStep {
                    sequence: 1,
                    action_type: intent.action_type,
                    from_asset: intent.from_asset.clone(),
                    to_asset: intent.to_asset.clone(),
                    amount: intent.amount,
                    rationale: format!(
                        "{} {:?} {} to {}.",
                        intent.action_type, intent.amount, intent.from_asset, intent.to_asset
                    ),
                }],
                vec![
                    "No fees, slippage, or taxes included.",
                    "Execution venues and routing are outside this engine.",
                    "Capital state is a snapshot and may be stale.",
                ],
                vec![
                    "Insufficient balance for requested quantity.",
                    "Required signer unavailable or rejects the request.",
                ],
            ),
        };

        let steps = ordered_steps(steps);
        let required_signatures = derive_required_signatures(&steps);
        let plan = ExecutionPlan {
            intent,
            capital_state,
            steps,
            assumptions: ordered_strings(assumptions),
            failure_modes: ordered_strings(failure_modes),
            required_signatures,
            estimated_cost: 0.0,
        };

        validate_plan(&plan)?;
        Ok(plan)
    }
}

fn ordered_strings(values: Vec<&str>) -> Vec<String> {
    let mut out: Vec<String> = values.into_iter().map(str::to_string).collect();
    out.sort();
    out
}

fn ordered_steps(mut steps: Vec<ExecutionStep>) -> Vec<ExecutionStep> {
    steps.sort_by_key(|s| s.sequence);
    steps
}

/// One `primary` signature per step that moves capital.
#[must_use]
pub fn derive_required_signatures(steps: &[ExecutionStep]) -> Vec<SignatureRequirement> {
    steps
        .iter()
        .filter(|step| step.action_type.moves_capital())
        .map(|step| SignatureRequirement {
            signer_reference: PRIMARY_SIGNER.to_string(),
            purpose: format!("authorize step {}", step.sequence),
        })
        .collect()
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Check every hard rule a plan must satisfy.
pub fn validate_plan(plan: &ExecutionPlan) -> Result<(), ThriveError> {
    if plan.steps.is_empty() {
        return Err(invalid("Plan must include at least one step."));
    }
    if plan.assumptions.is_empty() {
        return Err(invalid("Plan must include assumptions."));
    }
    if plan.failure_modes.is_empty() {
        return Err(invalid("Plan must include failure modes."));
    }
    if !plan.estimated_cost.is_finite() {
        return Err(invalid("Plan must include an estimated cost."));
    }

    validate_steps(&plan.steps)?;
    validate_deterministic_order(plan)?;
    validate_signatures(&plan.steps, &plan.required_signatures)?;
    validate_capital_conservation(plan)?;
    validate_no_hidden_execution_knowledge(plan)
}

fn validate_steps(steps: &[ExecutionStep]) -> Result<(), ThriveError> {
    for step in steps {
        if step.rationale.is_empty() {
            return Err(invalid("Step rationale must be non-empty."));
        }
        if step.action_type == ActionType::Hold {
            if step.from_asset != step.to_asset {
                return Err(invalid("HOLD steps must keep the same asset."));
            }
            if step.amount != 0.0 {
                return Err(invalid("HOLD steps must not move capital."));
            }
        } else {
            if step.from_asset == step.to_asset {
                return Err(invalid("from_asset must differ from to_asset."));
            }
            // NaN fails this comparison too
            if !(step.amount > 0.0) || !step.amount.is_finite() {
                return Err(invalid("Step amount must be positive."));
            }
        }
    }
    Ok(())
}

fn is_sorted<T: PartialOrd>(values: &[T]) -> bool {
    values.windows(2).all(|pair| pair[0] <= pair[1])
}

fn validate_deterministic_order(plan: &ExecutionPlan) -> Result<(), ThriveError> {
    let sequences: Vec<u32> = plan.steps.iter().map(|s| s.sequence).collect();
    if !is_sorted(&sequences) {
        return Err(invalid("Steps must be ordered by sequence."));
    }
    if !is_sorted(&plan.assumptions) {
        return Err(invalid("Assumptions must be deterministically ordered."));
    }
    if !is_sorted(&plan.failure_modes) {
        return Err(invalid("Failure modes must be deterministically ordered."));
    }
    Ok(())
}

fn validate_signatures(
    steps: &[ExecutionStep],
    required: &[SignatureRequirement],
) -> Result<(), ThriveError> {
    let derived = derive_required_signatures(steps);
    if !derived.is_empty() && required.is_empty() {
        return Err(invalid("Required signatures missing for ownership changes."));
    }
    if derived.is_empty() && !required.is_empty() {
        return Err(invalid("HOLD plans must not require signatures."));
    }
    if derived != required {
        return Err(invalid("Required signatures must be derived from steps."));
    }
    Ok(())
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn apply_steps(steps: &[ExecutionStep]) -> BTreeMap<&str, f64> {
    let mut deltas: BTreeMap<&str, f64> = BTreeMap::new();
    for step in steps.iter().filter(|s| s.action_type.moves_capital()) {
        *deltas.entry(step.from_asset.as_str()).or_insert(0.0) -= step.amount;
        *deltas.entry(step.to_asset.as_str()).or_insert(0.0) += step.amount;
    }
    deltas
}

fn validate_capital_conservation(plan: &ExecutionPlan) -> Result<(), ThriveError> {
    let total_before = plan.capital_state.total();
    let total_after = total_before + apply_steps(&plan.steps).values().sum::<f64>();
    let expected = round_to(total_before - plan.estimated_cost, CONSERVATION_DECIMALS);
    if expected != round_to(total_after, CONSERVATION_DECIMALS) {
        return Err(invalid("Capital is not conserved."));
    }
    Ok(())
}

/// Every free-text string a plan carries.
fn plan_strings(plan: &ExecutionPlan) -> Vec<&str> {
    let mut out: Vec<&str> = vec![
        plan.intent.from_asset.as_str(),
        plan.intent.to_asset.as_str(),
        plan.capital_state.snapshot_id.as_str(),
    ];
    out.extend(plan.intent.notes.iter().map(String::as_str));
    out.extend(plan.capital_state.notes.iter().map(String::as_str));
    out.extend(plan.capital_state.exposures.iter().map(|e| e.asset_code.as_str()));
    for step in &plan.steps {
        out.push(&step.from_asset);
        out.push(&step.to_asset);
        out.push(&step.rationale);
    }
    out.extend(plan.assumptions.iter().map(String::as_str));
    out.extend(plan.failure_modes.iter().map(String::as_str));
    for requirement in &plan.required_signatures {
        out.push(&requirement.signer_reference);
        out.push(&requirement.purpose);
    }
    out
}

fn validate_no_hidden_execution_knowledge(plan: &ExecutionPlan) -> Result<(), ThriveError> {
    let leaks = plan_strings(plan).into_iter().any(|value| {
        let lower = value.to_lowercase();
        FORBIDDEN_PLAN_TOKENS.iter().any(|token| lower.contains(token))
    });
    if leaks {
        return Err(invalid("Plan contains forbidden execution knowledge."));
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::CapitalExposure;

    fn state() -> CapitalState {
        CapitalState::new(
            "snap-1",
            vec![CapitalExposure::new("EUR", 50.0), CapitalExposure::new("USD", 100.0)],
        )
    }

    fn transfer_plan() -> ExecutionPlan {
        ExecutionPlanner::new()
            .plan(
                ExecutionIntent::new(ActionType::Transfer, "USD", "EUR", 10.0),
                state(),
            )
            .expect("valid transfer")
    }

    fn expect_invalid(plan: &ExecutionPlan, message: &str) {
        let err = validate_plan(plan).expect_err("plan should be rejected");
        assert_eq!(err.to_string(), message);
    }

    #[test]
    fn hold_plan_shape() {
        let plan = ExecutionPlanner::new()
            .plan(ExecutionIntent::new(ActionType::Hold, "USD", "EUR", 99.0), state())
            .expect("valid hold");

        assert_eq!(plan.steps.len(), 1);
        let step = &plan.steps[0];
        assert_eq!(step.from_asset, "USD");
        assert_eq!(step.to_asset, "USD");
        assert_eq!(step.amount, 0.0);
        assert_eq!(step.rationale, "Hold position; no execution required.");
        assert_eq!(
            plan.assumptions,
            vec![
                "Capital state is a snapshot and may be stale.",
                "Hold intent produces no execution steps beyond acknowledgement.",
            ]
        );
        assert_eq!(plan.failure_modes, vec!["Intent rejected by policy gate."]);
        assert!(plan.required_signatures.is_empty());
        assert_eq!(plan.estimated_cost, 0.0);
    }

    #[test]
    fn transfer_plan_shape() {
        let plan = transfer_plan();
        assert_eq!(plan.steps[0].rationale, "TRANSFER 10.0 USD to EUR.");
        assert_eq!(
            plan.assumptions,
            vec![
                "Capital state is a snapshot and may be stale.",
                "Execution venues and routing are outside this engine.",
                "No fees, slippage, or taxes included.",
            ]
        );
        assert_eq!(
            plan.required_signatures,
            vec![SignatureRequirement {
                signer_reference: "primary".to_string(),
                purpose: "authorize step 1".to_string(),
            }]
        );
    }

    #[test]
    fn swap_rationale_uses_action_name() {
        let plan = ExecutionPlanner::new()
            .plan(ExecutionIntent::new(ActionType::Swap, "USD", "EUR", 2.5), state())
            .expect("valid swap");
        assert_eq!(plan.steps[0].rationale, "SWAP 2.5 USD to EUR.");
    }

    #[test]
    fn planner_rejects_same_asset_transfer() {
        let err = ExecutionPlanner::new()
            .plan(ExecutionIntent::new(ActionType::Transfer, "USD", "USD", 1.0), state())
            .expect_err("same asset");
        assert_eq!(err.to_string(), "from_asset must differ from to_asset.");
    }

    #[test]
    fn planner_rejects_non_positive_amount() {
        let err = ExecutionPlanner::new()
            .plan(ExecutionIntent::new(ActionType::Swap, "USD", "EUR", -5.0), state())
            .expect_err("negative amount");
        assert_eq!(err.to_string(), "Step amount must be positive.");
    }

    #[test]
    fn empty_sections_rejected() {
        let mut plan = transfer_plan();
        plan.steps.clear();
        expect_invalid(&plan, "Plan must include at least one step.");

        let mut plan = transfer_plan();
        plan.assumptions.clear();
        expect_invalid(&plan, "Plan must include assumptions.");

        let mut plan = transfer_plan();
        plan.failure_modes.clear();
        expect_invalid(&plan, "Plan must include failure modes.");
    }

    #[test]
    fn ordering_enforced() {
        let mut plan = transfer_plan();
        plan.assumptions.reverse();
        expect_invalid(&plan, "Assumptions must be deterministically ordered.");

        let mut plan = transfer_plan();
        plan.failure_modes.reverse();
        expect_invalid(&plan, "Failure modes must be deterministically ordered.");
    }

    #[test]
    fn signatures_must_be_derived() {
        let mut plan = transfer_plan();
        plan.required_signatures.clear();
        expect_invalid(&plan, "Required signatures missing for ownership changes.");

        let mut plan = transfer_plan();
        plan.required_signatures[0].purpose = "authorize everything".to_string();
        expect_invalid(&plan, "Required signatures must be derived from steps.");

        let mut hold = ExecutionPlanner::new()
            .plan(ExecutionIntent::new(ActionType::Hold, "USD", "USD", 0.0), state())
            .expect("valid hold");
        hold.required_signatures.push(SignatureRequirement {
            signer_reference: "primary".to_string(),
            purpose: "authorize step 1".to_string(),
        });
        expect_invalid(&hold, "HOLD plans must not require signatures.");
    }

    #[test]
    fn hold_step_rules() {
        let mut hold = ExecutionPlanner::new()
            .plan(ExecutionIntent::new(ActionType::Hold, "USD", "USD", 0.0), state())
            .expect("valid hold");
        hold.steps[0].amount = 1.0;
        expect_invalid(&hold, "HOLD steps must not move capital.");
        hold.steps[0].amount = 0.0;
        hold.steps[0].to_asset = "EUR".to_string();
        expect_invalid(&hold, "HOLD steps must keep the same asset.");
    }

    #[test]
    fn empty_rationale_rejected() {
        let mut plan = transfer_plan();
        plan.steps[0].rationale.clear();
        expect_invalid(&plan, "Step rationale must be non-empty.");
    }

    #[test]
    fn estimated_cost_breaks_conservation() {
        let mut plan = transfer_plan();
        plan.estimated_cost = 1.0;
        expect_invalid(&plan, "Capital is not conserved.");

        plan.estimated_cost = f64::NAN;
        expect_invalid(&plan, "Plan must include an estimated cost.");
    }

    #[test]
    fn forbidden_tokens_rejected() {
        let mut plan = transfer_plan();
        plan.capital_state.notes.push("Bridged via Wallet".to_string());
        expect_invalid(&plan, "Plan contains forbidden execution knowledge.");

        let err = ExecutionPlanner::new()
            .plan(ExecutionIntent::new(ActionType::Transfer, "USD", "0xDEAD", 1.0), state())
            .expect_err("hex target");
        assert_eq!(err.to_string(), "Plan contains forbidden execution knowledge.");
    }

    #[test]
    fn steps_sorted_by_sequence() {
        let mut plan = transfer_plan();
        let mut second = plan.steps[0].clone();
        second.sequence = 2;
        plan.steps.insert(0, second);
        plan.required_signatures = derive_required_signatures(&plan.steps);
        expect_invalid(&plan, "Steps must be ordered by sequence.");
    }
}
