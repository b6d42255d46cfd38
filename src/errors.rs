use alloy::primitives::TxHash;
use thiserror::Error;

use crate::proposal::ProposalStatus;
use crate::state::CommandKind;

/// Failures surfaced by the governance core.
///
/// Every variant is caught at the controller boundary and turned into a
/// user-facing message; none of them tears the session down.
#[derive(Error, Debug)]
pub enum GovernanceError {
    #[error("Wrong network: connected to chain {actual}, expected chain {expected}. Please switch your endpoint to the expected network")]
    WrongNetwork { expected: u64, actual: u64 },

    #[error("{operation} rejected by ledger: {reason}")]
    ContractCall { operation: &'static str, reason: String },

    #[error("Transaction {tx_hash} was not confirmed within {timeout_secs}s")]
    TxTimeout { tx_hash: TxHash, timeout_secs: u64 },

    #[error("Transaction {0} reverted")]
    TxReverted(TxHash),

    #[error("Proposal sync failed: {0}")]
    Sync(String),

    #[error("Cannot start {requested}: {running} is still in progress")]
    CommandInProgress {
        requested: CommandKind,
        running: CommandKind,
    },

    #[error("Wallet provider error: {0}")]
    Provider(String),

    #[error("No signing identity available. Run 'dao-cli wallet create' or set DAO_PRIVATE_KEY")]
    SignerRequired,

    #[error("You need at least one membership NFT to {0}")]
    NotAMember(CommandKind),

    #[error("Only the DAO owner can withdraw the treasury")]
    NotOwner,

    #[error("Proposal {id} is {status}; cannot {command}")]
    ProposalState {
        id: u64,
        status: ProposalStatus,
        command: CommandKind,
    },

    #[error("Proposal {0} not found")]
    UnknownProposal(u64),
}

impl GovernanceError {
    /// Local UX rejections raised before anything reaches the ledger.
    pub fn is_advisory(&self) -> bool {
        matches!(
            self,
            GovernanceError::NotAMember(_)
                | GovernanceError::NotOwner
                | GovernanceError::ProposalState { .. }
        )
    }

    pub(crate) fn contract_call(operation: &'static str, reason: impl ToString) -> Self {
        GovernanceError::ContractCall {
            operation,
            reason: reason.to_string(),
        }
    }
}

/// Configuration and wallet errors of the command-line layer.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Wallet not found. Run 'dao-cli wallet create' first")]
    WalletNotFound,

    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("{0} contract address not set. Run 'dao-cli config set-contracts' first")]
    ContractNotConfigured(&'static str),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
