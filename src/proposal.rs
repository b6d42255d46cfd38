use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use std::fmt;

/// One governance decision as last read from the ledger.
///
/// Records are only ever built by the synchronizer from ledger reads; the
/// client never fabricates one locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub proposal_id: u64,
    pub nft_token_id: U256,
    pub deadline: DateTime<Utc>,
    pub yes_votes: u64,
    pub no_votes: u64,
    pub executed: bool,
}

/// Where a proposal sits in its lifecycle at a given instant.
///
/// Exactly one status holds for any `(deadline, executed, now)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalStatus {
    Votable,
    Executable,
    Closed,
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProposalStatus::Votable => "votable",
            ProposalStatus::Executable => "executable",
            ProposalStatus::Closed => "closed",
        };
        f.write_str(label)
    }
}

impl Proposal {
    pub fn status_at(&self, now: DateTime<Utc>) -> ProposalStatus {
        if self.executed {
            ProposalStatus::Closed
        } else if now < self.deadline {
            ProposalStatus::Votable
        } else {
            ProposalStatus::Executable
        }
    }

    pub fn status(&self) -> ProposalStatus {
        self.status_at(Utc::now())
    }

    pub fn is_votable_at(&self, now: DateTime<Utc>) -> bool {
        self.status_at(now) == ProposalStatus::Votable
    }

    pub fn is_executable_at(&self, now: DateTime<Utc>) -> bool {
        self.status_at(now) == ProposalStatus::Executable
    }

    /// Whether the tally favours the proposal. The ledger applies the same
    /// rule on execution; ties do not pass.
    pub fn passing(&self) -> bool {
        self.yes_votes > self.no_votes
    }

    pub fn total_votes(&self) -> u64 {
        self.yes_votes.saturating_add(self.no_votes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn proposal(deadline: DateTime<Utc>, executed: bool) -> Proposal {
        Proposal {
            proposal_id: 0,
            nft_token_id: U256::from(7u64),
            deadline,
            yes_votes: 5,
            no_votes: 2,
            executed,
        }
    }

    #[test]
    fn test_status_before_deadline_is_votable() {
        let now = Utc::now();
        let p = proposal(now + Duration::minutes(5), false);
        assert_eq!(p.status_at(now), ProposalStatus::Votable);
    }

    #[test]
    fn test_status_at_deadline_is_executable() {
        let now = Utc::now();
        let p = proposal(now, false);
        assert_eq!(p.status_at(now), ProposalStatus::Executable);
    }

    #[test]
    fn test_executed_is_closed_regardless_of_deadline() {
        let now = Utc::now();
        assert_eq!(
            proposal(now + Duration::days(1), true).status_at(now),
            ProposalStatus::Closed
        );
        assert_eq!(
            proposal(now - Duration::days(1), true).status_at(now),
            ProposalStatus::Closed
        );
    }

    #[test]
    fn test_exactly_one_status_holds() {
        let now = Utc::now();
        let offsets = [-3600i64, -1, 0, 1, 3600];

        for offset in offsets {
            for executed in [false, true] {
                let p = proposal(now + Duration::seconds(offset), executed);
                let flags = [
                    p.is_votable_at(now),
                    p.is_executable_at(now),
                    p.status_at(now) == ProposalStatus::Closed,
                ];
                assert_eq!(flags.iter().filter(|f| **f).count(), 1);
            }
        }
    }

    #[test]
    fn test_tie_does_not_pass() {
        let mut p = proposal(Utc::now(), false);
        p.yes_votes = 3;
        p.no_votes = 3;
        assert!(!p.passing());
        assert_eq!(p.total_votes(), 6);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(ProposalStatus::Executable.to_string(), "executable");
    }
}
