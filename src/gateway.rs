//! Typed seams over the two external collaborators: the ledger contracts and
//! the wallet that signs for them.

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use std::fmt;

#[cfg(test)]
use mockall::automock;

use crate::errors::GovernanceError;

/// A proposal exactly as the governance contract returns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalRaw {
    pub nft_token_id: U256,
    /// Seconds since the unix epoch.
    pub deadline: U256,
    pub yes_votes: U256,
    pub no_votes: U256,
    pub executed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteChoice {
    Yes,
    No,
}

impl VoteChoice {
    /// Position in the contract's `Vote` enum.
    pub fn as_u8(self) -> u8 {
        match self {
            VoteChoice::Yes => 0,
            VoteChoice::No => 1,
        }
    }
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteChoice::Yes => f.write_str("YES"),
            VoteChoice::No => f.write_str("NO"),
        }
    }
}

/// A broadcast transaction that still has to be confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxHandle {
    pub tx_hash: TxHash,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// One method per contract call. Implementations never retry; a rejection
/// comes back as `ContractCall` carrying the ledger's reason.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    async fn get_owner(&self) -> Result<Address, GovernanceError>;

    async fn get_treasury_balance(&self) -> Result<U256, GovernanceError>;

    async fn get_proposal_count(&self) -> Result<u64, GovernanceError>;

    async fn get_proposal(&self, id: u64) -> Result<ProposalRaw, GovernanceError>;

    async fn get_membership_balance(&self, address: Address) -> Result<u64, GovernanceError>;

    async fn create_proposal(&self, nft_token_id: U256) -> Result<TxHandle, GovernanceError>;

    async fn vote_on_proposal(
        &self,
        id: u64,
        vote: VoteChoice,
    ) -> Result<TxHandle, GovernanceError>;

    async fn execute_proposal(&self, id: u64) -> Result<TxHandle, GovernanceError>;

    async fn withdraw_treasury(&self) -> Result<TxHandle, GovernanceError>;
}

/// The wallet/session provider boundary.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Establish the provider session; returns the active network id.
    async fn connect(&self) -> Result<u64, GovernanceError>;

    async fn network_id(&self) -> Result<u64, GovernanceError>;

    /// `None` when the session has no credential and can only read.
    fn signing_identity(&self) -> Option<Address>;

    /// Resolve once the transaction is mined. Unbounded, and lookup errors
    /// do not end the wait; callers apply their own timeout, which turns a
    /// lost provider into `TxTimeout`.
    async fn await_confirmation(&self, tx: TxHandle) -> Result<Receipt, GovernanceError>;
}
