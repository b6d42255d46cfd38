use anyhow::Result;
use colored::Colorize;
use dao_cli::VoteChoice;

use super::{open_session, phase_spinner, report_failure, report_outcome};

/// Execute vote command
pub async fn execute(proposal_id: u64, choice: VoteChoice, skip_checks: bool) -> Result<()> {
    let (config, controller) = open_session(true, skip_checks).await?;

    println!("{}", "Casting vote...".bright_cyan());
    println!("  Proposal: #{}", proposal_id);
    println!("  Vote:     {}", choice_label(choice));
    println!();

    // Submit and wait for confirmation
    let (controller, spinner) = phase_spinner(controller);
    let result = controller.vote(proposal_id, choice).await;
    spinner.finish_and_clear();

    match result {
        Ok(outcome) => {
            println!("{}", "✅ Vote recorded!".bright_green());
            println!();
            report_outcome(config.expected_network_id, &outcome);

            if let Some(proposal) = controller.snapshot().proposal(proposal_id) {
                println!();
                println!(
                    "  Tally:       {} yes / {} no",
                    proposal.yes_votes.to_string().bright_green(),
                    proposal.no_votes.to_string().bright_red()
                );
            }
        }
        Err(e) => {
            report_failure(
                "Vote failed",
                &e,
                &[
                    "Each NFT can only vote once per proposal",
                    "Voting closes at the proposal deadline",
                    "Ensure you have ETH for transaction fees",
                ],
            );
            controller.disconnect();
            return Err(e.into());
        }
    }

    controller.disconnect();
    Ok(())
}

fn choice_label(choice: VoteChoice) -> String {
    match choice {
        VoteChoice::Yes => choice.to_string().bright_green().to_string(),
        VoteChoice::No => choice.to_string().bright_red().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_label_contains_vote() {
        assert!(choice_label(VoteChoice::Yes).contains("YES"));
        assert!(choice_label(VoteChoice::No).contains("NO"));
    }
}
