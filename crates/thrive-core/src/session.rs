//! # Session Module
//!
//! Server-side operator state shared by the HTTP API.
//!
//! A session holds:
//! - the wallet context (keystore path + wallet id)
//! - one `WalletCore` per keystore path, so unlock state survives requests
//! - the `ExecutionController`
//! - the last plan, its digest and the last dry run
//!
//! Nothing here is persisted except through the keystore and the
//! active-account file.

use crate::adapter::{DryRunResult, EthereumTxPayload, plan_to_payloads, simulate};
use crate::controller::{ExecutionController, ExecutionDecision, GuardPolicy};
use crate::plan::{ExecutionPlan, PlanSummary, plan_digest};
use crate::primitives::PBKDF2_ITERATIONS;
use crate::wallet::{
    Account, ActiveAccounts, PassphraseEncryptor, WalletCore, open_keystore, resolve_active,
};
use crate::{ExecutionMode, ThriveError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// VIEWS
// =============================================================================

/// The keystore and wallet the operator is working with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletContext {
    pub keystore_path: String,
    pub wallet_id: String,
}

/// Wallet and controller state as shown to the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    /// `LOCKED` or `UNLOCKED`.
    pub wallet_state: String,
    pub active_account: Option<String>,
    pub active_account_id: Option<String>,
    /// Address of the active account, or `LOCKED`.
    pub active_address: String,
    pub execution_mode: ExecutionMode,
    pub armed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_plan: Option<PlanSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_dry_run: Option<DryRunResult>,
}

/// One account with its selection flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountView {
    pub account_id: String,
    pub label: String,
    pub active: bool,
}

/// Payloads and dry run for one plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub payloads: Vec<EthereumTxPayload>,
    pub dry_run: DryRunResult,
}

// =============================================================================
// SESSION
// =============================================================================

/// Operator session.
#[derive(Debug)]
pub struct Session {
    context: Option<WalletContext>,
    wallets: BTreeMap<String, WalletCore>,
    controller: ExecutionController,
    last_plan: Option<ExecutionPlan>,
    last_plan_digest: Option<String>,
    last_dry_run: Option<DryRunResult>,
    pbkdf2_iterations: u32,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self {
            context: None,
            wallets: BTreeMap::new(),
            controller: ExecutionController::new(),
            last_plan: None,
            last_plan_digest: None,
            last_dry_run: None,
            pbkdf2_iterations: PBKDF2_ITERATIONS,
        }
    }

    /// Override the PBKDF2 round count for wallets opened by this session.
    #[must_use]
    pub fn with_pbkdf2_iterations(mut self, iterations: u32) -> Self {
        self.pbkdf2_iterations = iterations;
        self
    }

    #[must_use]
    pub fn controller(&self) -> &ExecutionController {
        &self.controller
    }

    #[must_use]
    pub fn last_plan(&self) -> Option<&ExecutionPlan> {
        self.last_plan.as_ref()
    }

    #[must_use]
    pub fn last_dry_run(&self) -> Option<&DryRunResult> {
        self.last_dry_run.as_ref()
    }

    // -------------------------------------------------------------------------
    // Context & wallets
    // -------------------------------------------------------------------------

    /// Select a keystore and wallet. The wallet must exist.
    pub fn set_context(&mut self, keystore_path: &str, wallet_id: &str) -> Result<(), ThriveError> {
        self.wallet_for(keystore_path)?.wallet(wallet_id)?;
        self.context = Some(WalletContext {
            keystore_path: keystore_path.to_string(),
            wallet_id: wallet_id.to_string(),
        });
        Ok(())
    }

    pub fn context(&self) -> Result<&WalletContext, ThriveError> {
        self.context.as_ref().ok_or(ThriveError::ContextNotSet)
    }

    fn wallet_for(&mut self, keystore_path: &str) -> Result<&mut WalletCore, ThriveError> {
        if !self.wallets.contains_key(keystore_path) {
            let encryptor = PassphraseEncryptor::new().with_iterations(self.pbkdf2_iterations);
            let wallet = WalletCore::new(open_keystore(keystore_path)?, Box::new(encryptor));
            self.wallets.insert(keystore_path.to_string(), wallet);
        }
        self.wallets
            .get_mut(keystore_path)
            .ok_or_else(|| ThriveError::UnknownWallet(keystore_path.to_string()))
    }

    /// Wallet core and context for the current selection.
    fn current(&mut self) -> Result<(WalletContext, &mut WalletCore), ThriveError> {
        let context = self.context()?.clone();
        let wallet = self.wallet_for(&context.keystore_path)?;
        Ok((context, wallet))
    }

    fn active_account(
        wallet: &WalletCore,
        context: &WalletContext,
    ) -> Result<Option<Account>, ThriveError> {
        let accounts = wallet.list_accounts(&context.wallet_id)?;
        let active_id =
            ActiveAccounts::for_keystore(&context.keystore_path).get(&context.wallet_id)?;
        Ok(resolve_active(&accounts, active_id.as_deref()).cloned())
    }

    pub fn status(&mut self) -> Result<SessionStatus, ThriveError> {
        let (context, wallet) = self.current()?;
        let unlocked = wallet.status(&context.wallet_id).unlocked;
        let account = Self::active_account(wallet, &context)?;

        let active_address = match (&account, unlocked) {
            (Some(account), true) => {
                wallet.get_public_key(&context.wallet_id, &account.derivation_path)?
            }
            _ => "LOCKED".to_string(),
        };

        Ok(SessionStatus {
            wallet_state: if unlocked { "UNLOCKED" } else { "LOCKED" }.to_string(),
            active_account: account.as_ref().map(|a| a.label.clone()),
            active_account_id: account.map(|a| a.account_id),
            active_address,
            execution_mode: self.controller.mode(),
            armed: self.controller.armed(),
            last_plan: self.last_plan.as_ref().map(ExecutionPlan::summary),
            last_dry_run: self.last_dry_run.clone(),
        })
    }

    pub fn unlock(&mut self, passphrase: &str) -> Result<(), ThriveError> {
        let (context, wallet) = self.current()?;
        if passphrase.is_empty() {
            return Err(ThriveError::InvalidRequest("Passphrase required.".to_string()));
        }
        wallet.unlock(&context.wallet_id, passphrase)?;
        Ok(())
    }

    pub fn lock(&mut self) -> Result<(), ThriveError> {
        let (_, wallet) = self.current()?;
        wallet.lock();
        Ok(())
    }

    /// Export the recovery phrase. A wallet that was locked is locked again.
    ///
    /// A wrong passphrase is a rejected request here, not a failed unlock.
    pub fn export_seed(
        &mut self,
        passphrase: &str,
        acknowledged: bool,
    ) -> Result<String, ThriveError> {
        if !acknowledged {
            return Err(ThriveError::InvalidRequest(
                "Warning acknowledgement required.".to_string(),
            ));
        }
        let (context, wallet) = self.current()?;
        if passphrase.is_empty() {
            return Err(ThriveError::InvalidRequest("Passphrase required.".to_string()));
        }

        let was_unlocked = wallet.is_unlocked(&context.wallet_id);
        wallet
            .unlock(&context.wallet_id, passphrase)
            .map_err(|e| match e {
                ThriveError::InvalidPassphrase => {
                    ThriveError::InvalidRequest(ThriveError::InvalidPassphrase.to_string())
                }
                other => other,
            })?;
        let phrase = wallet.export_recovery_phrase(&context.wallet_id);
        if !was_unlocked {
            wallet.lock();
        }
        phrase
    }

    pub fn accounts(&mut self) -> Result<Vec<AccountView>, ThriveError> {
        let (context, wallet) = self.current()?;
        let active_id =
            ActiveAccounts::for_keystore(&context.keystore_path).get(&context.wallet_id)?;
        Ok(wallet
            .list_accounts(&context.wallet_id)?
            .into_iter()
            .map(|a| AccountView {
                active: active_id.as_deref() == Some(a.account_id.as_str()),
                account_id: a.account_id,
                label: a.label,
            })
            .collect())
    }

    pub fn select_account(&mut self, account_id: &str) -> Result<(), ThriveError> {
        let (context, wallet) = self.current()?;
        let exists = wallet
            .list_accounts(&context.wallet_id)?
            .iter()
            .any(|a| a.account_id == account_id);
        if !exists {
            return Err(ThriveError::AccountNotFound);
        }
        ActiveAccounts::for_keystore(&context.keystore_path).set(&context.wallet_id, account_id)
    }

    // -------------------------------------------------------------------------
    // Plans & execution
    // -------------------------------------------------------------------------

    /// Remember a freshly built plan. Clears the previous dry run.
    pub fn record_plan(&mut self, plan: ExecutionPlan) -> Result<(), ThriveError> {
        self.last_plan_digest = Some(plan_digest(&plan)?);
        self.last_plan = Some(plan);
        self.last_dry_run = None;
        Ok(())
    }

    /// Adapt and dry-run a plan, remembering it as the simulated plan.
    pub fn simulate(&mut self, plan: ExecutionPlan) -> Result<SimulationOutcome, ThriveError> {
        let payloads = plan_to_payloads(&plan)?;
        let dry_run = simulate(&payloads)?;
        self.last_plan_digest = Some(plan_digest(&plan)?);
        self.last_plan = Some(plan);
        self.last_dry_run = Some(dry_run.clone());
        Ok(SimulationOutcome { payloads, dry_run })
    }

    pub fn set_mode(
        &mut self,
        mode: ExecutionMode,
        policy: Option<GuardPolicy>,
    ) -> Result<ExecutionMode, ThriveError> {
        self.controller.set_mode(mode, policy)?;
        Ok(self.controller.mode())
    }

    pub fn set_armed(&mut self, armed: bool) -> bool {
        if armed {
            self.controller.arm();
        } else {
            self.controller.disarm();
        }
        self.controller.armed()
    }

    /// Gate a plan with every step pre-confirmed by the caller.
    ///
    /// When a dry run exists, the plan must be the one that was simulated.
    pub fn execute(
        &mut self,
        plan: &ExecutionPlan,
        confirm_all: bool,
    ) -> Result<Vec<ExecutionDecision>, ThriveError> {
        if !confirm_all {
            return Err(ThriveError::InvalidRequest(
                "Explicit confirmation required.".to_string(),
            ));
        }
        if self.last_dry_run.is_some()
            && self.last_plan_digest.as_deref() != Some(plan_digest(plan)?.as_str())
        {
            return Err(ThriveError::ExecutionBlocked(
                "Plan does not match the last simulated plan.".to_string(),
            ));
        }

        let mut confirm = |_: &crate::plan::ExecutionStep| true;
        self.controller.evaluate_plan(plan, Some(&mut confirm))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{CapitalExposure, CapitalState, ExecutionIntent};
    use crate::planner::ExecutionPlanner;
    use crate::wallet::{MemoryKeyStore, open_keystore};
    use crate::ActionType;

    fn plan(amount: f64) -> ExecutionPlan {
        ExecutionPlanner::new()
            .plan(
                ExecutionIntent::new(ActionType::Transfer, "USD", "EUR", amount),
                CapitalState::new("snap", vec![CapitalExposure::new("USD", 100.0)]),
            )
            .expect("valid plan")
    }

    /// A session over a fresh in-memory keystore holding one wallet.
    fn session_with_wallet(name: &str) -> (Session, String) {
        let path = format!("mem://session-{}", name);
        let mut wallet = WalletCore::new(
            open_keystore(&path).expect("open"),
            Box::new(PassphraseEncryptor::new().with_iterations(1_000)),
        );
        let meta = wallet.create_wallet("main", "pass").expect("create");
        wallet.add_account(&meta.wallet_id, "primary", None).expect("account");

        let mut session = Session::new().with_pbkdf2_iterations(1_000);
        session.set_context(&path, &meta.wallet_id).expect("context");
        (session, meta.wallet_id)
    }

    #[test]
    fn context_required() {
        let mut session = Session::new();
        assert_eq!(session.status().expect_err("no context").to_string(), "Context not set.");
        assert!(matches!(session.lock(), Err(ThriveError::ContextNotSet)));
    }

    #[test]
    fn context_requires_existing_wallet() {
        let _ = MemoryKeyStore::named("mem://session-empty");
        let mut session = Session::new();
        let err = session
            .set_context("mem://session-empty", "missing")
            .expect_err("unknown wallet");
        assert_eq!(err.to_string(), "Unknown wallet_id: missing");
    }

    #[test]
    fn status_tracks_unlock() {
        let (mut session, _) = session_with_wallet("status");
        let status = session.status().expect("status");
        assert_eq!(status.wallet_state, "LOCKED");
        assert_eq!(status.active_address, "LOCKED");
        assert_eq!(status.active_account.as_deref(), Some("primary"));
        assert_eq!(status.execution_mode, ExecutionMode::Safe);

        session.unlock("pass").expect("unlock");
        let status = session.status().expect("status");
        assert_eq!(status.wallet_state, "UNLOCKED");
        assert_eq!(status.active_address.len(), 64);

        session.lock().expect("lock");
        assert_eq!(session.status().expect("status").wallet_state, "LOCKED");
    }

    #[test]
    fn seed_export_relocks() {
        let (mut session, _) = session_with_wallet("seed");
        let err = session.export_seed("pass", false).expect_err("ack");
        assert_eq!(err.to_string(), "Warning acknowledgement required.");

        let phrase = session.export_seed("pass", true).expect("phrase");
        assert_eq!(phrase.split(' ').count(), 16);
        assert_eq!(session.status().expect("status").wallet_state, "LOCKED");

        session.unlock("pass").expect("unlock");
        session.export_seed("pass", true).expect("phrase");
        assert_eq!(session.status().expect("status").wallet_state, "UNLOCKED");
    }

    #[test]
    fn seed_export_wrong_passphrase_is_rejected_request() {
        let (mut session, _) = session_with_wallet("seed-wrong");
        let err = session.export_seed("nope", true).expect_err("wrong passphrase");
        assert!(matches!(err, ThriveError::InvalidRequest(_)));
        assert_eq!(err.to_string(), "Invalid passphrase or corrupted payload.");
        assert_eq!(session.status().expect("status").wallet_state, "LOCKED");
    }

    #[test]
    fn unlock_checks_context_before_passphrase() {
        let mut session = Session::new();
        assert!(matches!(session.unlock(""), Err(ThriveError::ContextNotSet)));

        let (mut session, _) = session_with_wallet("unlock-empty");
        let err = session.unlock("").expect_err("empty");
        assert_eq!(err.to_string(), "Passphrase required.");
    }

    #[test]
    fn account_selection() {
        let (mut session, _) = session_with_wallet("accounts");
        let accounts = session.accounts().expect("accounts");
        assert_eq!(accounts.len(), 1);
        assert!(!accounts[0].active);

        assert!(matches!(
            session.select_account("nope"),
            Err(ThriveError::AccountNotFound)
        ));
        let id = accounts[0].account_id.clone();
        session.select_account(&id).expect("select");
        assert!(session.accounts().expect("accounts")[0].active);
    }

    #[test]
    fn execute_requires_simulated_plan_match() {
        let (mut session, _) = session_with_wallet("execute");
        session.simulate(plan(10.0)).expect("simulate");
        session.set_mode(ExecutionMode::Manual, None).expect("manual");
        session.set_armed(true);

        let err = session.execute(&plan(20.0), true).expect_err("mismatch");
        assert_eq!(err.to_string(), "Plan does not match the last simulated plan.");

        let err = session.execute(&plan(10.0), false).expect_err("unconfirmed");
        assert_eq!(err.to_string(), "Explicit confirmation required.");

        let decisions = session.execute(&plan(10.0), true).expect("execute");
        assert_eq!(decisions.len(), 1);
        assert!(!session.controller().armed());
    }

    #[test]
    fn record_plan_clears_dry_run() {
        let mut session = Session::new();
        session.simulate(plan(10.0)).expect("simulate");
        assert!(session.last_dry_run().is_some());
        session.record_plan(plan(5.0)).expect("record");
        assert!(session.last_dry_run().is_none());
        assert_eq!(session.last_plan().map(|p| p.intent.amount), Some(5.0));
    }
}
