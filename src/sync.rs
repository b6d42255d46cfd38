use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::errors::GovernanceError;
use crate::gateway::{LedgerGateway, ProposalRaw};
use crate::guard::{AccessMode, SessionGuard};
use crate::proposal::Proposal;
use crate::state::Session;

/// Pulls ledger state into the session.
///
/// Every sync is a full replace: the proposal collection is rebuilt from
/// scratch and swapped in only once every read has succeeded.
#[derive(Clone)]
pub struct ProposalSynchronizer {
    gateway: Arc<dyn LedgerGateway>,
    guard: SessionGuard,
    session: Arc<Session>,
}

impl ProposalSynchronizer {
    pub fn new(gateway: Arc<dyn LedgerGateway>, guard: SessionGuard, session: Arc<Session>) -> Self {
        Self {
            gateway,
            guard,
            session,
        }
    }

    /// Fetch every proposal in id order and store the result in the session
    /// before returning it. On any failure the previous collection stays.
    pub async fn sync_all(&self) -> Result<Vec<Proposal>, GovernanceError> {
        self.guard.require_network(AccessMode::ReadOnly).await?;

        let proposals = self.fetch_all().await.map_err(|e| {
            warn!(error = %e, "Proposal sync aborted, keeping previous collection");
            e
        })?;

        self.session.replace_proposals(proposals.clone());
        info!(count = proposals.len(), "Proposals synchronized");
        Ok(proposals)
    }

    async fn fetch_all(&self) -> Result<Vec<Proposal>, GovernanceError> {
        let count = self
            .gateway
            .get_proposal_count()
            .await
            .map_err(|e| GovernanceError::Sync(format!("reading proposal count: {}", e)))?;

        let mut proposals = Vec::new();
        for id in 0..count {
            let raw = self
                .gateway
                .get_proposal(id)
                .await
                .map_err(|e| GovernanceError::Sync(format!("reading proposal {}: {}", id, e)))?;
            proposals.push(normalize(id, raw)?);
        }

        debug!(count, "Fetched all proposals");
        Ok(proposals)
    }

    pub async fn sync_treasury(&self) -> Result<U256, GovernanceError> {
        self.guard.require_network(AccessMode::ReadOnly).await?;
        let balance = self.gateway.get_treasury_balance().await?;
        self.session.set_treasury_balance(balance);
        Ok(balance)
    }

    pub async fn sync_membership(&self, identity: Address) -> Result<u64, GovernanceError> {
        self.guard.require_network(AccessMode::ReadOnly).await?;
        let balance = self.gateway.get_membership_balance(identity).await?;
        self.session.set_membership_balance(balance);
        Ok(balance)
    }

    pub async fn sync_ownership(&self, identity: Address) -> Result<bool, GovernanceError> {
        self.guard.require_network(AccessMode::ReadOnly).await?;
        let owner = self.gateway.get_owner().await?;
        let is_owner = owner == identity;
        self.session.set_is_owner(is_owner);
        Ok(is_owner)
    }
}

/// Turn raw contract values into a `Proposal`.
pub fn normalize(id: u64, raw: ProposalRaw) -> Result<Proposal, GovernanceError> {
    let deadline = to_timestamp(raw.deadline).ok_or_else(|| {
        GovernanceError::Sync(format!("proposal {} has an out-of-range deadline {}", id, raw.deadline))
    })?;

    Ok(Proposal {
        proposal_id: id,
        nft_token_id: raw.nft_token_id,
        deadline,
        yes_votes: to_count(id, "yes votes", raw.yes_votes)?,
        no_votes: to_count(id, "no votes", raw.no_votes)?,
        executed: raw.executed,
    })
}

fn to_timestamp(seconds: U256) -> Option<DateTime<Utc>> {
    let seconds = u64::try_from(seconds).ok()?;
    DateTime::from_timestamp(i64::try_from(seconds).ok()?, 0)
}

fn to_count(id: u64, field: &str, value: U256) -> Result<u64, GovernanceError> {
    u64::try_from(value).map_err(|_| {
        GovernanceError::Sync(format!("proposal {} {} out of range: {}", id, field, value))
    })
}
