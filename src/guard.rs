use alloy::primitives::Address;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::errors::GovernanceError;
use crate::gateway::WalletProvider;

/// What the caller is about to do with the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    Signing,
}

/// Proof that the provider sits on the expected network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningContext {
    ReadOnly { network_id: u64 },
    Signing { network_id: u64, identity: Address },
}

impl SigningContext {
    pub fn network_id(&self) -> u64 {
        match self {
            SigningContext::ReadOnly { network_id } => *network_id,
            SigningContext::Signing { network_id, .. } => *network_id,
        }
    }

    pub fn identity(&self) -> Option<Address> {
        match self {
            SigningContext::ReadOnly { .. } => None,
            SigningContext::Signing { identity, .. } => Some(*identity),
        }
    }
}

/// Gate in front of every ledger call.
#[derive(Clone)]
pub struct SessionGuard {
    wallet: Arc<dyn WalletProvider>,
    expected_network_id: u64,
}

impl SessionGuard {
    pub fn new(wallet: Arc<dyn WalletProvider>, expected_network_id: u64) -> Self {
        Self {
            wallet,
            expected_network_id,
        }
    }

    /// Check the active network and hand back an accessor for `mode`.
    ///
    /// Nothing is mutated on failure.
    pub async fn require_network(&self, mode: AccessMode) -> Result<SigningContext, GovernanceError> {
        let network_id = self.wallet.network_id().await?;

        if network_id != self.expected_network_id {
            warn!(
                actual = network_id,
                expected = self.expected_network_id,
                "Provider is on the wrong network"
            );
            return Err(GovernanceError::WrongNetwork {
                expected: self.expected_network_id,
                actual: network_id,
            });
        }

        let context = match mode {
            AccessMode::ReadOnly => SigningContext::ReadOnly { network_id },
            AccessMode::Signing => {
                let identity = self
                    .wallet
                    .signing_identity()
                    .ok_or(GovernanceError::SignerRequired)?;
                SigningContext::Signing {
                    network_id,
                    identity,
                }
            }
        };

        debug!(network_id, ?mode, "Network check passed");
        Ok(context)
    }
}
