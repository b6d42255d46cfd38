pub mod execute;
pub mod proposals;
pub mod propose;
pub mod status;
pub mod vote;
pub mod withdraw;

use alloy::primitives::{utils::format_ether, TxHash, U256};
use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use dao_cli::config::{Config, SEPOLIA_NETWORK_ID};
use dao_cli::contracts::EvmLedger;
use dao_cli::{wallet, CommandOutcome, ControllerOptions, GovernanceController, GovernanceError};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

/// Build the ledger client from config and run the initial synchronization.
pub async fn open_session(need_signer: bool, skip_checks: bool) -> Result<(Config, GovernanceController)> {
    // Load config
    let config = Config::load_with_env()?;
    let governance = config.governance_address()?;
    let membership = config.membership_address()?;

    // Load wallet
    let signer = if need_signer {
        Some(wallet::require_signer(&config)?)
    } else {
        wallet::load_signer(&config)?
    };

    // Create ledger client
    let ledger = Arc::new(EvmLedger::new(
        &config.endpoint_url,
        governance,
        membership,
        signer,
        config.call_timeout(),
    )?);

    let options = ControllerOptions {
        confirmation_timeout: config.confirmation_timeout(),
        enforce_advisory_checks: !skip_checks,
    };
    let controller = GovernanceController::new(ledger.clone(), ledger, config.expected_network_id, options);

    println!("{}", format!("Connecting to {}...", config.endpoint_url).dimmed());
    controller.connect().await?;

    Ok((config, controller))
}

/// Spinner that follows the controller's command phases.
pub fn phase_spinner(controller: GovernanceController) -> (GovernanceController, ProgressBar) {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner());
    spinner.enable_steady_tick(Duration::from_millis(120));

    let tracker = spinner.clone();
    let controller = controller.with_phase_listener(Arc::new(move |_, phase| {
        tracker.set_message(format!("{}...", phase));
    }));

    (controller, spinner)
}

/// Print the result of a confirmed command
pub fn report_outcome(network_id: u64, outcome: &CommandOutcome) {
    println!("  Transaction: {}", outcome.receipt.tx_hash.to_string().bright_yellow());
    if let Some(block) = outcome.receipt.block_number {
        println!("  Block:       {}", block.to_string().dimmed());
    }
    if let Some(url) = explorer_url(network_id, &outcome.receipt.tx_hash) {
        println!("  Explorer:    {}", url.bright_blue());
    }

    if let Some(e) = &outcome.resync_error {
        println!();
        println!("{}", "⚠ Transaction confirmed, but refreshing proposals failed".yellow());
        println!("  Error: {}", e);
        println!("  {}", "Run 'dao-cli proposals list' to refresh".dimmed());
    }
}

/// Print a failed command with troubleshooting hints
pub fn report_failure(title: &str, error: &GovernanceError, hints: &[&str]) {
    println!();
    println!("{}", format!("❌ {}", title).bright_red());
    println!("  Error: {}", error);
    println!();

    if error.is_advisory() {
        println!("  {}", "This was a local check; pass --skip-checks to submit anyway".dimmed());
        return;
    }

    match error {
        GovernanceError::WrongNetwork { expected, .. } => {
            println!("{}", "Troubleshooting:".bright_yellow());
            println!("  • Point 'dao-cli config set-endpoint' at a node for chain {}", expected);
        }
        GovernanceError::TxTimeout { .. } => {
            println!("{}", "Troubleshooting:".bright_yellow());
            println!("  • The transaction may still be mined; check the explorer");
            println!("  • Run 'dao-cli proposals list' before retrying");
        }
        _ if !hints.is_empty() => {
            println!("{}", "Troubleshooting:".bright_yellow());
            for hint in hints {
                println!("  • {}", hint);
            }
        }
        _ => {}
    }
}

pub fn explorer_url(network_id: u64, tx_hash: &TxHash) -> Option<String> {
    match network_id {
        SEPOLIA_NETWORK_ID => Some(format!("https://sepolia.etherscan.io/tx/{}", tx_hash)),
        1 => Some(format!("https://etherscan.io/tx/{}", tx_hash)),
        _ => None,
    }
}

/// Format wei as ETH with four decimals
pub fn format_eth(wei: U256) -> String {
    let full = format_ether(wei);
    match full.split_once('.') {
        Some((whole, fraction)) => {
            let fraction: String = fraction.chars().chain(std::iter::repeat('0')).take(4).collect();
            format!("{}.{}", whole, fraction)
        }
        None => format!("{}.0000", full),
    }
}

pub fn format_deadline(deadline: DateTime<Utc>) -> String {
    deadline.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Human readable time left until `deadline`, or `None` once it has passed
pub fn time_left(deadline: DateTime<Utc>, now: DateTime<Utc>) -> Option<String> {
    let remaining = deadline - now;
    if remaining.num_seconds() <= 0 {
        return None;
    }

    let hours = remaining.num_hours();
    let minutes = remaining.num_minutes() % 60;
    if hours > 0 {
        Some(format!("{}h {}m", hours, minutes))
    } else if minutes > 0 {
        Some(format!("{}m", minutes))
    } else {
        Some(format!("{}s", remaining.num_seconds()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn test_format_eth() {
        assert_eq!(format_eth(U256::from(1_000_000_000_000_000_000u128)), "1.0000");
        assert_eq!(format_eth(U256::from(123_456_789_000_000_000u128)), "0.1234");
        assert_eq!(format_eth(U256::ZERO), "0.0000");
    }

    #[test]
    fn test_time_left() {
        let now = Utc::now();
        assert_eq!(time_left(now + ChronoDuration::minutes(125), now).unwrap(), "2h 5m");
        assert_eq!(time_left(now + ChronoDuration::minutes(3), now).unwrap(), "3m");
        assert_eq!(time_left(now + ChronoDuration::seconds(30), now).unwrap(), "30s");
        assert!(time_left(now, now).is_none());
        assert!(time_left(now - ChronoDuration::minutes(1), now).is_none());
    }

    #[test]
    fn test_explorer_url_only_for_known_networks() {
        let hash = TxHash::with_last_byte(1);
        assert!(explorer_url(SEPOLIA_NETWORK_ID, &hash)
            .unwrap()
            .starts_with("https://sepolia.etherscan.io/tx/0x"));
        assert!(explorer_url(31337, &hash).is_none());
    }

    #[test]
    fn test_format_deadline() {
        let deadline = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(format_deadline(deadline), "2023-11-14 22:13 UTC");
    }
}
