use anyhow::Result;
use colored::Colorize;

use super::{format_eth, open_session, phase_spinner, report_failure, report_outcome};

/// Withdraw the treasury to the owner
pub async fn execute(skip_checks: bool) -> Result<()> {
    let (config, controller) = open_session(true, skip_checks).await?;
    let before = controller.snapshot().treasury_balance;

    println!("{}", "Withdrawing treasury...".bright_cyan());
    println!("  Amount: {} ETH", format_eth(before));
    println!();

    // Submit and wait for confirmation
    let (controller, spinner) = phase_spinner(controller);
    let result = controller.withdraw().await;
    spinner.finish_and_clear();

    match result {
        Ok(outcome) => {
            println!("{}", "✅ Treasury withdrawn!".bright_green());
            println!();
            report_outcome(config.expected_network_id, &outcome);
            println!(
                "  Treasury:    {} ETH",
                format_eth(controller.snapshot().treasury_balance).dimmed()
            );
        }
        Err(e) => {
            report_failure(
                "Withdrawal failed",
                &e,
                &["Only the DAO owner can withdraw", "The treasury must not be empty"],
            );
            controller.disconnect();
            return Err(e.into());
        }
    }

    controller.disconnect();
    Ok(())
}
