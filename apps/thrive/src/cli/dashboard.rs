//! # Interactive Dashboard
//!
//! Numbered menus over the same commands the CLI exposes. Each menu action
//! gathers its answers into an argument vector and runs it through the
//! regular parser, so the dashboard can never do anything the CLI cannot.
//! End of input exits.

use super::commands::{prompt_optional, prompt_required};
use super::{Cli, CliError, Terminal, dispatch};
use crate::config::ThriveConfig;
use clap::Parser;

type MenuAction = fn(&ThriveConfig, &mut Terminal<'_>) -> Result<(), CliError>;

const MAIN_MENU: [(&str, Option<MenuAction>); 8] = [
    ("Wallet", Some(wallet_menu)),
    ("Accounts", Some(accounts_menu)),
    ("Capital", Some(capital_menu)),
    ("Plans", Some(plans_menu)),
    ("Simulate", Some(simulate_menu)),
    ("Execute", Some(execute_menu)),
    ("Backup / Export", Some(backup_menu)),
    ("Exit", None),
];

/// Parse a menu selection in `1..=count`.
fn parse_selection(choice: &str, count: usize) -> Option<usize> {
    if !choice.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    choice.parse::<usize>().ok().filter(|n| (1..=count).contains(n))
}

/// Run the main menu until Exit or end of input.
pub fn run_dashboard(config: &ThriveConfig, term: &mut Terminal<'_>) -> Result<(), CliError> {
    loop {
        term.header("Thrive Capital OS")?;
        for (idx, (label, _)) in MAIN_MENU.iter().enumerate() {
            term.line(&format!("{}. {}", idx + 1, label))?;
        }

        let Some(choice) = term.read_line("Select option: ")? else {
            return Ok(());
        };
        if choice.is_empty() {
            continue;
        }
        let Some(selection) = parse_selection(&choice, MAIN_MENU.len()) else {
            term.line("Invalid selection.")?;
            continue;
        };

        let Some(action) = MAIN_MENU[selection - 1].1 else {
            return Ok(());
        };
        if let Err(e) = action(config, term) {
            term.line(&format!("ERROR: {}", e))?;
        }
    }
}

/// Parse `args` as a `thrive` command line and run it.
fn run_args(
    config: &ThriveConfig,
    term: &mut Terminal<'_>,
    args: Vec<String>,
) -> Result<(), CliError> {
    let argv = std::iter::once("thrive".to_string()).chain(args);
    let cli = Cli::try_parse_from(argv).map_err(|e| CliError::Invalid(e.to_string()))?;
    if cli.command.is_none() {
        return Err(CliError::Invalid("No command selected.".to_string()));
    }
    dispatch(config, cli.command, cli.json_mode, term)
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// Comma-separated entries, trimmed, blanks dropped.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn push_repeated(argv: &mut Vec<String>, flag: &str, values: Vec<String>) {
    for value in values {
        argv.push(flag.to_string());
        argv.push(value);
    }
}

/// `--keystore K --wallet-id W` from two prompts.
fn wallet_args(term: &mut Terminal<'_>) -> Result<Vec<String>, CliError> {
    let keystore = prompt_required(term, "Keystore path")?;
    let wallet_id = prompt_required(term, "Wallet ID")?;
    Ok(vec![
        "--keystore".to_string(),
        keystore,
        "--wallet-id".to_string(),
        wallet_id,
    ])
}

// =============================================================================
// MENUS
// =============================================================================

fn wallet_menu(config: &ThriveConfig, term: &mut Terminal<'_>) -> Result<(), CliError> {
    term.header("Wallet")?;
    for line in [
        "1. Init", "2. Unlock", "3. Lock", "4. Show", "5. Address", "6. Seed", "7. Backup",
        "8. Back",
    ] {
        term.line(line)?;
    }
    let choice = term.read_line("Select option: ")?.unwrap_or_default();

    let argv = match choice.as_str() {
        "1" => {
            let mut argv = args(&["wallet", "init", "--keystore"]);
            argv.push(prompt_required(term, "Keystore path")?);
            argv.push("--label".to_string());
            argv.push(prompt_required(term, "Label")?);
            argv.push("--passphrase".to_string());
            argv.push(prompt_required(term, "Passphrase")?);
            argv
        }
        "2" => {
            let mut argv = args(&["wallet", "unlock"]);
            argv.extend(wallet_args(term)?);
            argv.push("--passphrase".to_string());
            argv.push(prompt_required(term, "Passphrase")?);
            argv
        }
        "3" => {
            let mut argv = args(&["wallet", "lock", "--keystore"]);
            argv.push(prompt_required(term, "Keystore path")?);
            argv
        }
        "4" => {
            let mut argv = args(&["wallet", "show"]);
            argv.extend(wallet_args(term)?);
            let passphrase = prompt_optional(term, "Passphrase (optional)")?;
            if !passphrase.is_empty() {
                argv.push("--passphrase".to_string());
                argv.push(passphrase);
            }
            argv
        }
        "5" => {
            let mut argv = args(&["wallet", "address"]);
            argv.extend(wallet_args(term)?);
            argv.push("--passphrase".to_string());
            argv.push(prompt_required(term, "Passphrase")?);
            argv
        }
        "6" => {
            let mut argv = args(&["wallet", "seed"]);
            argv.extend(wallet_args(term)?);
            argv
        }
        "7" => {
            let mut argv = args(&["wallet", "backup"]);
            argv.extend(wallet_args(term)?);
            argv
        }
        _ => return Ok(()),
    };
    run_args(config, term, argv)
}

fn accounts_menu(config: &ThriveConfig, term: &mut Terminal<'_>) -> Result<(), CliError> {
    term.header("Accounts")?;
    for line in ["1. List", "2. New", "3. Switch", "4. Rename", "5. Back"] {
        term.line(line)?;
    }
    let choice = term.read_line("Select option: ")?.unwrap_or_default();

    let argv = match choice.as_str() {
        "1" => {
            let mut argv = args(&["wallet", "accounts"]);
            argv.extend(wallet_args(term)?);
            argv
        }
        "2" => {
            let mut argv = args(&["account", "new"]);
            argv.extend(wallet_args(term)?);
            argv.push("--label".to_string());
            argv.push(prompt_required(term, "Label")?);
            let path = prompt_optional(term, "Derivation path (optional)")?;
            if !path.is_empty() {
                argv.push("--derivation-path".to_string());
                argv.push(path);
            }
            argv
        }
        "3" => {
            let mut argv = args(&["account", "switch"]);
            argv.extend(wallet_args(term)?);
            argv.push("--account-id".to_string());
            argv.push(prompt_required(term, "Account ID")?);
            argv
        }
        "4" => {
            let mut argv = args(&["account", "rename"]);
            argv.extend(wallet_args(term)?);
            argv.push("--account-id".to_string());
            argv.push(prompt_required(term, "Account ID")?);
            argv.push("--label".to_string());
            argv.push(prompt_required(term, "New label")?);
            argv
        }
        _ => return Ok(()),
    };
    run_args(config, term, argv)
}

fn capital_menu(config: &ThriveConfig, term: &mut Terminal<'_>) -> Result<(), CliError> {
    term.header("Capital Snapshot")?;
    let exposures = prompt_optional(term, "Exposures (e.g. ETH=1,USDC=100)")?;

    let mut argv = args(&["status"]);
    argv.extend(wallet_args(term)?);
    if !exposures.is_empty() {
        argv.push("--snapshot-id".to_string());
        argv.push(prompt_required(term, "Snapshot ID")?);
        push_repeated(&mut argv, "--exposure", split_list(&exposures));
        let passphrase = prompt_optional(term, "Passphrase (optional)")?;
        if !passphrase.is_empty() {
            argv.push("--passphrase".to_string());
            argv.push(passphrase);
        }
    }
    run_args(config, term, argv)
}

fn plans_menu(config: &ThriveConfig, term: &mut Terminal<'_>) -> Result<(), CliError> {
    term.header("Create Plan")?;
    let mut argv = args(&["plan", "create", "--action"]);
    argv.push(prompt_required(term, "Action (SWAP/TRANSFER/HOLD)")?);
    argv.push("--from-asset".to_string());
    argv.push(prompt_required(term, "From asset")?);
    argv.push("--to-asset".to_string());
    argv.push(prompt_required(term, "To asset")?);
    argv.push("--amount".to_string());
    argv.push(prompt_required(term, "Amount")?);
    argv.push("--snapshot-id".to_string());
    argv.push(prompt_required(term, "Snapshot ID")?);
    let exposures = prompt_required(term, "Exposures (e.g. ETH=1,USDC=100)")?;
    push_repeated(&mut argv, "--exposure", split_list(&exposures));
    run_args(config, term, argv)
}

fn simulate_menu(config: &ThriveConfig, term: &mut Terminal<'_>) -> Result<(), CliError> {
    term.header("Simulate Plan")?;
    let mut argv = args(&["simulate", "--plan"]);
    argv.push(prompt_required(term, "Plan file path")?);
    run_args(config, term, argv)
}

fn execute_menu(config: &ThriveConfig, term: &mut Terminal<'_>) -> Result<(), CliError> {
    term.header("Execute Plan")?;
    let mode = prompt_required(term, "Mode (manual/guarded)")?;
    let mut argv = args(&["execute", "--plan"]);
    argv.push(prompt_required(term, "Plan file path")?);
    argv.push("--mode".to_string());
    argv.push(mode.clone());
    argv.push("--arm".to_string());

    if mode == "guarded" {
        let actions = prompt_required(term, "Allowed actions (comma-separated)")?;
        push_repeated(&mut argv, "--allowed-action", split_list(&actions));
        let assets = prompt_optional(term, "Allowed assets (comma-separated)")?;
        push_repeated(&mut argv, "--allowed-asset", split_list(&assets));
    }
    if prompt_optional(term, "Confirm execution now? (y/N)")?.eq_ignore_ascii_case("y") {
        argv.push("--yes".to_string());
    }
    run_args(config, term, argv)
}

fn backup_menu(config: &ThriveConfig, term: &mut Terminal<'_>) -> Result<(), CliError> {
    term.header("Backup / Export")?;
    let mut argv = args(&["wallet", "backup"]);
    argv.extend(wallet_args(term)?);
    run_args(config, term, argv)
}
