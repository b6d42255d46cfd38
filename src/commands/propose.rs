use alloy::primitives::U256;
use anyhow::Result;
use colored::Colorize;

use super::{open_session, phase_spinner, report_failure, report_outcome};

/// Execute proposal creation
pub async fn execute(nft_token_id: u64, skip_checks: bool) -> Result<()> {
    let (config, controller) = open_session(true, skip_checks).await?;

    println!("{}", "Creating proposal...".bright_cyan());
    println!("  NFT Token ID: {}", nft_token_id);
    println!();

    // Submit and wait for confirmation
    let (controller, spinner) = phase_spinner(controller);
    let result = controller.create_proposal(U256::from(nft_token_id)).await;
    spinner.finish_and_clear();

    match result {
        Ok(outcome) => {
            println!("{}", "✅ Proposal created!".bright_green());
            println!();
            report_outcome(config.expected_network_id, &outcome);

            // New proposal only shows up after the resync
            if outcome.resync_error.is_none() {
                if let Some(proposal) = controller.snapshot().proposals.last() {
                    println!();
                    println!(
                        "{}",
                        format!("Proposal #{} is open for voting", proposal.proposal_id).bright_green()
                    );
                }
            }
        }
        Err(e) => {
            report_failure(
                "Proposal creation failed",
                &e,
                &[
                    "Ensure your wallet holds at least one CryptoDevs NFT",
                    "Ensure you have ETH for transaction fees",
                    "Check that the NFT is still for sale on the marketplace",
                ],
            );
            controller.disconnect();
            return Err(e.into());
        }
    }

    controller.disconnect();
    Ok(())
}
