use anyhow::Result;
use colored::Colorize;
use dao_cli::{ProposalStatus, SessionState};

use super::{format_eth, open_session};

/// Execute status check
pub async fn execute() -> Result<()> {
    let (_config, controller) = open_session(false, false).await?;
    let state = controller.snapshot();

    println!();
    println!("{}", "═══════════════════════════════════════════════════".bright_cyan());
    println!("{}", "        CryptoDevs DAO Status".bright_cyan().bold());
    println!("{}", "═══════════════════════════════════════════════════".bright_cyan());
    println!();

    println!("{}", "═══ Session ═══".bright_cyan());
    println!("  Network:     {}", state.network_id.unwrap_or_default());
    match state.identity {
        Some(identity) => println!("  Wallet:      {}", identity.to_checksum(None).bright_yellow()),
        None => println!("  Wallet:      {}", "read-only (no wallet configured)".dimmed()),
    }

    // Membership
    println!();
    println!("{}", "═══ Membership ═══".bright_cyan());
    if state.identity.is_some() {
        let nfts = state.membership_balance.to_string();
        if state.is_member() {
            println!("  NFTs held:   {}", nfts.bright_green());
        } else {
            println!("  NFTs held:   {}", nfts.yellow());
            println!("  {}", "You need a CryptoDevs NFT to create proposals or vote".dimmed());
        }
        if state.is_owner {
            println!("  Role:        {}", "DAO owner".bright_magenta());
        }
    } else {
        println!("  {}", "Use 'dao-cli wallet create' or set DAO_PRIVATE_KEY".dimmed());
    }

    // Treasury
    println!();
    println!("{}", "═══ Treasury ═══".bright_cyan());
    println!("  Balance:     {} ETH", format_eth(state.treasury_balance).bright_green());

    // Proposals
    println!();
    println!("{}", "═══ Proposals ═══".bright_cyan());
    let (votable, executable, closed) = count_by_status(&state);
    println!("  Total:       {}", state.proposals.len());
    println!("  Open:        {}", votable.to_string().bright_green());
    println!("  Executable:  {}", executable.to_string().yellow());
    println!("  Closed:      {}", closed.to_string().dimmed());

    println!();
    println!("{}", "═══════════════════════════════════════════════════".bright_cyan());
    println!();

    controller.disconnect();
    Ok(())
}

fn count_by_status(state: &SessionState) -> (usize, usize, usize) {
    state
        .proposals
        .iter()
        .fold((0, 0, 0), |(v, e, c), proposal| match proposal.status() {
            ProposalStatus::Votable => (v + 1, e, c),
            ProposalStatus::Executable => (v, e + 1, c),
            ProposalStatus::Closed => (v, e, c + 1),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;
    use chrono::{Duration, Utc};
    use dao_cli::Proposal;

    fn proposal(id: u64, offset_minutes: i64, executed: bool) -> Proposal {
        Proposal {
            proposal_id: id,
            nft_token_id: U256::from(id),
            deadline: Utc::now() + Duration::minutes(offset_minutes),
            yes_votes: 0,
            no_votes: 0,
            executed,
        }
    }

    #[test]
    fn test_count_by_status() {
        let state = SessionState {
            proposals: vec![
                proposal(0, 60, false),
                proposal(1, -60, false),
                proposal(2, -60, true),
                proposal(3, 30, false),
            ],
            ..SessionState::default()
        };

        assert_eq!(count_by_status(&state), (2, 1, 1));
    }
}
