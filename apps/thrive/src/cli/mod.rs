//! # Thrive CLI Module
//!
//! This module implements the CLI interface for Thrive.
//!
//! ## Available Commands
//!
//! - `truth` - Liquidation reality check for one position
//! - `server` - Start the local HTTP server
//! - `wallet` - Create, unlock and inspect wallets
//! - `account` - Create, switch and rename accounts
//! - `state` - Show a capital snapshot
//! - `plan` - Build an execution plan
//! - `simulate` - Dry-run a plan file
//! - `execute` - Gate a plan through the execution controller
//! - `status` - Wallet, capital and plan overview
//! - `prove` - Proof of custody signature
//!
//! With no subcommand the interactive dashboard runs.

mod commands;
mod dashboard;
mod output;

use crate::api;
use crate::config::{CliOverrides, ConfigError, ThriveConfig};
use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use thrive_core::{Session, ThriveError};

pub use commands::*;
pub use dashboard::run_dashboard;
pub use output::{Terminal, color_supported};

// =============================================================================
// ERRORS
// =============================================================================

/// Errors surfaced to the operator as `ERROR: {msg}`.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Thrive(#[from] ThriveError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Bad operator input.
    #[error("{0}")]
    Invalid(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Thrive - Capital OS
///
/// After-tax liquidation truth, explainable plans and gated execution,
/// with local key custody.
#[derive(Parser, Debug)]
#[command(name = "thrive")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a thrive.toml config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Banner only for the long-running modes, so scripted output stays clean.
    pub fn wants_banner(&self) -> bool {
        !self.quiet
            && !self.json_mode
            && matches!(self.command, None | Some(Commands::Server { .. }))
    }
}

/// Keystore location. Falls back to `wallet.keystore` from the config.
#[derive(Args, Debug, Clone, Default)]
pub struct KeystoreArgs {
    /// Keystore path: `mem://name`, a `.redb` file or a JSON file
    #[arg(long)]
    pub keystore: Option<String>,
}

/// A wallet inside a keystore.
#[derive(Args, Debug, Clone)]
pub struct WalletArgs {
    #[command(flatten)]
    pub keystore: KeystoreArgs,

    #[arg(long)]
    pub wallet_id: String,
}

/// Passphrase and account selection for commands that may derive keys.
#[derive(Args, Debug, Clone, Default)]
pub struct AccountArgs {
    #[arg(long)]
    pub passphrase: Option<String>,

    #[arg(long)]
    pub account_id: Option<String>,

    /// Use this derivation path instead of a stored account
    #[arg(long)]
    pub derivation_path: Option<String>,
}

/// Capital snapshot given as repeated `--exposure ASSET=AMOUNT`.
#[derive(Args, Debug, Clone)]
pub struct StateArgs {
    #[arg(long)]
    pub snapshot_id: String,

    #[arg(long, required = true)]
    pub exposure: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct TruthArgs {
    /// Asset type (stock, crypto)
    #[arg(short = 't', long, required_unless_present = "demo")]
    pub asset_type: Option<String>,

    #[arg(long, default_value = "TICKER")]
    pub ticker: String,

    #[arg(long, required_unless_present = "demo")]
    pub quantity: Option<f64>,

    /// Cost basis per unit
    #[arg(long, required_unless_present = "demo")]
    pub cost_basis: Option<f64>,

    /// Current price per unit
    #[arg(long, required_unless_present = "demo")]
    pub price: Option<f64>,

    #[arg(long, required_unless_present = "demo")]
    pub days_held: Option<i64>,

    /// State tax rate as a fraction (0.05 = 5%)
    #[arg(long)]
    pub state_tax_rate: Option<f64>,

    /// Run the built-in demo position
    #[arg(long)]
    pub demo: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExecuteArgs {
    /// Plan file, or `-` for stdin
    #[arg(long)]
    pub plan: String,

    #[arg(long, value_parser = ["manual", "guarded"])]
    pub mode: String,

    /// Arm the controller for this run
    #[arg(long)]
    pub arm: bool,

    /// Skip confirmation prompts
    #[arg(long)]
    pub yes: bool,

    #[arg(long)]
    pub allowed_action: Vec<String>,

    #[arg(long)]
    pub allowed_asset: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub wallet: WalletArgs,

    #[command(flatten)]
    pub account: AccountArgs,

    #[arg(long)]
    pub snapshot_id: Option<String>,

    #[arg(long)]
    pub exposure: Vec<String>,

    /// Plan file to summarize
    #[arg(long)]
    pub plan: Option<String>,

    /// Simulation output (JSON with a `dry_run` key) to summarize
    #[arg(long)]
    pub dry_run: Option<PathBuf>,

    #[arg(long)]
    pub json: bool,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Liquidation reality check for one position
    Truth(TruthArgs),

    /// Start the local HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Wallet lifecycle
    Wallet {
        #[command(subcommand)]
        command: WalletCommand,
    },

    /// Account management
    Account {
        #[command(subcommand)]
        command: AccountCommand,
    },

    /// Capital snapshots
    State {
        #[command(subcommand)]
        command: StateCommand,
    },

    /// Execution plans
    Plan {
        #[command(subcommand)]
        command: PlanCommand,
    },

    /// Dry-run a plan
    Simulate {
        /// Plan file, or `-` for stdin
        #[arg(long)]
        plan: String,

        #[arg(long)]
        json: bool,
    },

    /// Gate a plan through the execution controller
    Execute(ExecuteArgs),

    /// Wallet, capital and plan overview
    Status(StatusArgs),

    /// Sign the proof message with the selected account
    Prove {
        #[command(flatten)]
        wallet: WalletArgs,

        #[command(flatten)]
        account: AccountArgs,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum WalletCommand {
    /// Create a wallet with a default account
    Init {
        #[command(flatten)]
        keystore: KeystoreArgs,

        #[arg(long)]
        label: String,

        #[arg(long)]
        passphrase: String,
    },

    /// Check a passphrase against a wallet
    Unlock {
        #[command(flatten)]
        wallet: WalletArgs,

        #[arg(long)]
        passphrase: String,
    },

    Lock {
        #[command(flatten)]
        keystore: KeystoreArgs,
    },

    /// List accounts
    Accounts {
        #[command(flatten)]
        wallet: WalletArgs,

        #[arg(long)]
        show_path: bool,
    },

    /// Set the active account
    Select {
        #[command(flatten)]
        wallet: WalletArgs,

        #[arg(long)]
        account_id: String,
    },

    /// Wallet status without capital
    Show {
        #[command(flatten)]
        wallet: WalletArgs,

        #[command(flatten)]
        account: AccountArgs,
    },

    /// Address of the selected account
    Address {
        #[command(flatten)]
        wallet: WalletArgs,

        #[command(flatten)]
        account: AccountArgs,
    },

    /// Export the recovery phrase
    Seed {
        #[command(flatten)]
        keystore: KeystoreArgs,

        #[arg(long)]
        wallet_id: Option<String>,

        #[arg(long)]
        passphrase: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Files to back up
    Backup {
        #[command(flatten)]
        wallet: WalletArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum AccountCommand {
    /// Add an account and make it active
    New {
        #[command(flatten)]
        wallet: WalletArgs,

        #[arg(long)]
        label: String,

        #[arg(long)]
        derivation_path: Option<String>,
    },

    /// Set the active account
    Switch {
        #[command(flatten)]
        wallet: WalletArgs,

        #[arg(long)]
        account_id: String,
    },

    Rename {
        #[command(flatten)]
        wallet: WalletArgs,

        #[arg(long)]
        account_id: String,

        #[arg(long)]
        label: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum StateCommand {
    /// Print a capital state as JSON
    Show(StateArgs),
}

#[derive(Subcommand, Debug)]
pub enum PlanCommand {
    /// Plan an intent against a capital state and print it as JSON
    Create {
        /// Action type (SWAP, TRANSFER, HOLD)
        #[arg(long)]
        action: String,

        #[arg(long)]
        from_asset: String,

        #[arg(long)]
        to_asset: String,

        #[arg(long)]
        amount: f64,

        #[command(flatten)]
        state: StateArgs,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), CliError> {
    let overrides = match &cli.command {
        Some(Commands::Server { host, port }) => CliOverrides {
            host: host.clone(),
            port: *port,
            keystore: None,
        },
        _ => CliOverrides::default(),
    };
    let config = ThriveConfig::load(cli.config.as_deref(), Some(&overrides))?;

    if cli.verbose {
        eprintln!(
            "config: keystore={} kdf_iterations={} server={}:{}",
            config.wallet.keystore(),
            config.wallet.kdf_iterations(),
            config.server.host(),
            config.server.port()
        );
    }

    if let Some(Commands::Server { .. }) = cli.command {
        return cmd_server(&config).await;
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut stdout = io::stdout();
    let mut term = Terminal::new(&mut input, &mut stdout, color_supported());
    dispatch(&config, cli.command, cli.json_mode, &mut term)
}

/// Run one synchronous command against a terminal.
pub fn dispatch(
    config: &ThriveConfig,
    command: Option<Commands>,
    json_mode: bool,
    term: &mut Terminal<'_>,
) -> Result<(), CliError> {
    match command {
        None => run_dashboard(config, term),
        Some(Commands::Truth(args)) => cmd_truth(&args, json_mode, term),
        Some(Commands::Server { .. }) => Err(CliError::Invalid(
            "The server must be started with `thrive server`.".to_string(),
        )),
        Some(Commands::Wallet { command }) => match command {
            WalletCommand::Init {
                keystore,
                label,
                passphrase,
            } => cmd_wallet_init(config, &keystore, &label, &passphrase, term),
            WalletCommand::Unlock { wallet, passphrase } => {
                cmd_wallet_unlock(config, &wallet, &passphrase, term)
            }
            WalletCommand::Lock { keystore } => cmd_wallet_lock(config, &keystore, term),
            WalletCommand::Accounts { wallet, show_path } => {
                cmd_wallet_accounts(config, &wallet, show_path, term)
            }
            WalletCommand::Select { wallet, account_id } => {
                cmd_account_switch(config, &wallet, &account_id, term)
            }
            WalletCommand::Show { wallet, account } => {
                let args = StatusArgs {
                    wallet,
                    account,
                    snapshot_id: None,
                    exposure: Vec::new(),
                    plan: None,
                    dry_run: None,
                    json: false,
                };
                cmd_status(config, &args, json_mode, term)
            }
            WalletCommand::Address { wallet, account } => {
                cmd_wallet_address(config, &wallet, &account, term)
            }
            WalletCommand::Seed {
                keystore,
                wallet_id,
                passphrase,
                json,
            } => cmd_wallet_seed(
                config,
                &keystore,
                wallet_id,
                passphrase,
                json || json_mode,
                term,
            ),
            WalletCommand::Backup { wallet } => cmd_wallet_backup(config, &wallet, term),
        },
        Some(Commands::Account { command }) => match command {
            AccountCommand::New {
                wallet,
                label,
                derivation_path,
            } => cmd_account_new(config, &wallet, &label, derivation_path.as_deref(), term),
            AccountCommand::Switch { wallet, account_id } => {
                cmd_account_switch(config, &wallet, &account_id, term)
            }
            AccountCommand::Rename {
                wallet,
                account_id,
                label,
            } => cmd_account_rename(config, &wallet, &account_id, &label, term),
        },
        Some(Commands::State {
            command: StateCommand::Show(state),
        }) => cmd_state_show(&state, term),
        Some(Commands::Plan {
            command:
                PlanCommand::Create {
                    action,
                    from_asset,
                    to_asset,
                    amount,
                    state,
                },
        }) => cmd_plan_create(&action, &from_asset, &to_asset, amount, &state, term),
        Some(Commands::Simulate { plan, json }) => cmd_simulate(&plan, json || json_mode, term),
        Some(Commands::Execute(args)) => cmd_execute(&args, term),
        Some(Commands::Status(args)) => cmd_status(config, &args, json_mode, term),
        Some(Commands::Prove {
            wallet,
            account,
            json,
        }) => cmd_prove(config, &wallet, &account, json || json_mode, term),
    }
}

/// Start the HTTP server.
pub async fn cmd_server(config: &ThriveConfig) -> Result<(), CliError> {
    let session = Session::new().with_pbkdf2_iterations(config.wallet.kdf_iterations());
    let addr = format!("{}:{}", config.server.host(), config.server.port());

    println!("Thrive Capital OS Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:       {}", config.server.host());
    println!("  Port:       {}", config.server.port());
    println!("  Rate limit: {} req/s", config.server.rate_limit());
    println!();
    println!("Dashboard:    http://{}/", addr);
    println!("Truth Engine: http://{}/truth-engine", addr);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let state = api::AppState::with_config(session, config);
    api::run_server(&addr, state).await?;
    Ok(())
}
