use anyhow::Result;
use colored::Colorize;

use super::{format_eth, open_session, phase_spinner, report_failure, report_outcome};

/// Execute a proposal whose deadline has passed
pub async fn execute(proposal_id: u64, skip_checks: bool) -> Result<()> {
    let (config, controller) = open_session(true, skip_checks).await?;

    println!("{}", "Executing proposal...".bright_cyan());
    println!("  Proposal: #{}", proposal_id);
    // Show tally from the last sync
    if let Some(proposal) = controller.snapshot().proposal(proposal_id) {
        let verdict = if proposal.passing() {
            "passing - the DAO will buy the NFT".bright_green()
        } else {
            "not passing - no purchase will be made".yellow()
        };
        println!("  Tally:    {} yes / {} no ({})", proposal.yes_votes, proposal.no_votes, verdict);
    }
    println!();

    // Submit and wait for confirmation
    let (controller, spinner) = phase_spinner(controller);
    let result = controller.execute(proposal_id).await;
    spinner.finish_and_clear();

    match result {
        Ok(outcome) => {
            println!("{}", "✅ Proposal executed!".bright_green());
            println!();
            report_outcome(config.expected_network_id, &outcome);
            println!(
                "  Treasury:    {} ETH",
                format_eth(controller.snapshot().treasury_balance).bright_green()
            );
        }
        Err(e) => {
            report_failure(
                "Execution failed",
                &e,
                &[
                    "Proposals can only be executed after their deadline",
                    "A proposal can only be executed once",
                    "The treasury must hold enough ETH to buy the NFT",
                ],
            );
            controller.disconnect();
            return Err(e.into());
        }
    }

    controller.disconnect();
    Ok(())
}
