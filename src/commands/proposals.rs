use anyhow::Result;
use chrono::Utc;
use colored::{ColoredString, Colorize};
use dao_cli::{GovernanceError, Proposal, ProposalStatus};

use super::{format_deadline, open_session, time_left};

/// List all proposals
pub async fn list(open_only: bool) -> Result<()> {
    let (_config, controller) = open_session(false, false).await?;
    let state = controller.snapshot();
    let now = Utc::now();

    let proposals: Vec<&Proposal> = state
        .proposals
        .iter()
        .filter(|p| !open_only || p.is_votable_at(now))
        .collect();

    println!();
    println!("{}", "═══ Proposals ═══".bright_cyan());

    if proposals.is_empty() {
        println!("  {}", "No proposals found".dimmed());
        println!("  {}", "Use 'dao-cli propose --nft-token-id <id>' to create one".dimmed());
    }

    for proposal in proposals {
        println!();
        print_proposal(proposal);
    }

    println!();
    controller.disconnect();
    Ok(())
}

/// Show a single proposal
pub async fn show(id: u64) -> Result<()> {
    let (_config, controller) = open_session(false, false).await?;
    let state = controller.snapshot();

    let proposal = state
        .proposal(id)
        .ok_or(GovernanceError::UnknownProposal(id))?;

    println!();
    print_proposal(proposal);

    // Next step hint
    match proposal.status() {
        ProposalStatus::Votable => {
            println!();
            println!(
                "  {} {}",
                "→".bright_green(),
                format!("Use 'dao-cli vote --proposal {} --choice yes|no' to vote", id).bright_green()
            );
        }
        ProposalStatus::Executable => {
            println!();
            println!(
                "  {} {}",
                "→".yellow(),
                format!("Use 'dao-cli execute --proposal {}' to execute", id).yellow()
            );
        }
        ProposalStatus::Closed => {}
    }

    println!();
    controller.disconnect();
    Ok(())
}

fn print_proposal(proposal: &Proposal) {
    let now = Utc::now();
    let status = proposal.status_at(now);

    println!(
        "  {} {}  [{}]",
        "Proposal".bright_white().bold(),
        format!("#{}", proposal.proposal_id).bright_white().bold(),
        status_label(status)
    );
    println!("    NFT Token ID: {}", proposal.nft_token_id);
    println!("    Yes Votes:    {}", proposal.yes_votes.to_string().bright_green());
    println!("    No Votes:     {}", proposal.no_votes.to_string().bright_red());
    println!("    Total:        {}", proposal.total_votes());
    println!("    Deadline:     {}", format_deadline(proposal.deadline).dimmed());
    if let Some(left) = time_left(proposal.deadline, now) {
        println!("    Time Left:    {}", left);
    }
    if status != ProposalStatus::Votable {
        let verdict = if proposal.passing() {
            "passed".bright_green()
        } else {
            "rejected".bright_red()
        };
        println!("    Outcome:      {}", verdict);
    }
}

fn status_label(status: ProposalStatus) -> ColoredString {
    match status {
        ProposalStatus::Votable => "Open".bright_green(),
        ProposalStatus::Executable => "Awaiting execution".yellow(),
        ProposalStatus::Closed => "Executed".dimmed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels_are_distinct() {
        let labels = [
            status_label(ProposalStatus::Votable).to_string(),
            status_label(ProposalStatus::Executable).to_string(),
            status_label(ProposalStatus::Closed).to_string(),
        ];
        assert!(labels[0].contains("Open"));
        assert!(labels[1].contains("execution"));
        assert!(labels[2].contains("Executed"));
    }
}
