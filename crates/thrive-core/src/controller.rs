//! # Execution Controller
//!
//! Gates plan execution without performing it.
//!
//! The controller starts in SAFE mode and unarmed. A plan only passes when
//! the operator has armed the controller and selected MANUAL or GUARDED
//! mode. Passing consumes the arming.

use crate::plan::{ExecutionPlan, ExecutionStep};
use crate::planner::validate_plan;
use crate::{ActionType, ExecutionMode, ThriveError};
use serde::{Deserialize, Serialize};

// =============================================================================
// POLICY
// =============================================================================

/// Allow-list applied to every step in GUARDED mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardPolicy {
    pub allowed_action_types: Vec<ActionType>,
    /// `None` allows every asset.
    #[serde(default)]
    pub allowed_assets: Option<Vec<String>>,
}

impl GuardPolicy {
    #[must_use]
    pub fn new(allowed_action_types: Vec<ActionType>) -> Self {
        Self {
            allowed_action_types,
            allowed_assets: None,
        }
    }

    #[must_use]
    pub fn with_allowed_assets(mut self, assets: Vec<String>) -> Self {
        self.allowed_assets = Some(assets);
        self
    }

    /// Violations of one step, in check order.
    #[must_use]
    pub fn validate_step(&self, step: &ExecutionStep) -> Vec<&'static str> {
        let mut violations = Vec::new();

        if !self.allowed_action_types.contains(&step.action_type) {
            violations.push("Action type not allowed.");
        }

        if let Some(assets) = &self.allowed_assets {
            if !assets.contains(&step.from_asset) {
                violations.push("from_asset not allowed.");
            }
            if !assets.contains(&step.to_asset) {
                violations.push("to_asset not allowed.");
            }
        }

        violations
    }

    /// Violations of every step, concatenated in step order.
    #[must_use]
    pub fn validate_steps(&self, steps: &[ExecutionStep]) -> Vec<&'static str> {
        steps.iter().flat_map(|s| self.validate_step(s)).collect()
    }
}

/// Outcome of gating one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionDecision {
    pub step_sequence: u32,
    pub allowed: bool,
    pub reason: String,
}

// =============================================================================
// CONTROLLER
// =============================================================================

/// Per-step confirmation callback used in MANUAL mode.
pub type ConfirmStep<'a> = &'a mut dyn FnMut(&ExecutionStep) -> bool;

/// Mode, arming state and policy for plan execution.
#[derive(Debug, Clone, Default)]
pub struct ExecutionController {
    mode: ExecutionMode,
    armed: bool,
    policy: Option<GuardPolicy>,
}

impl ExecutionController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    #[must_use]
    pub fn armed(&self) -> bool {
        self.armed
    }

    #[must_use]
    pub fn policy(&self) -> Option<&GuardPolicy> {
        self.policy.as_ref()
    }

    pub fn arm(&mut self) {
        self.armed = true;
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Switch mode. Non-SAFE modes are only reachable from SAFE.
    pub fn set_mode(
        &mut self,
        mode: ExecutionMode,
        policy: Option<GuardPolicy>,
    ) -> Result<(), ThriveError> {
        if mode != ExecutionMode::Safe && self.mode != ExecutionMode::Safe {
            return Err(ThriveError::ModeTransition(
                "Mode escalation must pass through SAFE.".to_string(),
            ));
        }
        if mode == ExecutionMode::Guarded && policy.is_none() {
            return Err(ThriveError::PolicyViolation(
                "Guarded mode requires an explicit policy.".to_string(),
            ));
        }
        if mode != ExecutionMode::Guarded && policy.is_some() {
            return Err(ThriveError::ModeTransition(
                "Policies may only be set in GUARDED mode.".to_string(),
            ));
        }

        self.mode = mode;
        self.policy = policy;
        Ok(())
    }

    /// Gate a plan. On success the controller is disarmed.
    pub fn evaluate_plan(
        &mut self,
        plan: &ExecutionPlan,
        confirm: Option<ConfirmStep<'_>>,
    ) -> Result<Vec<ExecutionDecision>, ThriveError> {
        validate_plan(plan)?;

        if !self.armed {
            return Err(ThriveError::ExecutionBlocked(
                "Execution is not armed.".to_string(),
            ));
        }

        let decisions = match self.mode {
            ExecutionMode::Safe => {
                return Err(ThriveError::ExecutionBlocked(
                    "SAFE mode blocks execution.".to_string(),
                ));
            }
            ExecutionMode::Manual => Self::evaluate_manual(plan, confirm)?,
            ExecutionMode::Guarded => self.evaluate_guarded(plan)?,
        };

        self.armed = false;
        Ok(decisions)
    }

    fn evaluate_manual(
        plan: &ExecutionPlan,
        confirm: Option<ConfirmStep<'_>>,
    ) -> Result<Vec<ExecutionDecision>, ThriveError> {
        let confirm = confirm.ok_or_else(|| {
            ThriveError::ExecutionBlocked("Manual mode requires per-step confirmation.".to_string())
        })?;

        let mut decisions = Vec::with_capacity(plan.steps.len());
        for step in &plan.steps {
            if !confirm(step) {
                return Err(ThriveError::ExecutionBlocked(
                    "Manual confirmation rejected.".to_string(),
                ));
            }
            decisions.push(ExecutionDecision {
                step_sequence: step.sequence,
                allowed: true,
                reason: "Confirmed manually.".to_string(),
            });
        }
        Ok(decisions)
    }

    fn evaluate_guarded(
        &self,
        plan: &ExecutionPlan,
    ) -> Result<Vec<ExecutionDecision>, ThriveError> {
        let policy = self.policy.as_ref().ok_or_else(|| {
            ThriveError::PolicyViolation("Guarded mode requires a policy.".to_string())
        })?;

        let violations = policy.validate_steps(&plan.steps);
        if !violations.is_empty() {
            return Err(ThriveError::PolicyViolation(format!(
                "Policy violation: {}",
                violations.join(", ")
            )));
        }

        Ok(plan
            .steps
            .iter()
            .map(|step| ExecutionDecision {
                step_sequence: step.sequence,
                allowed: true,
                reason: "Guarded policy passed.".to_string(),
            })
            .collect())
    }
}

// =============================================================================
// TESTS
// =============================================================================
