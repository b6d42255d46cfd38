//! EVM binding of the ledger and wallet seams.

use alloy::network::{EthereumWallet, ReceiptResponse};
use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use async_trait::async_trait;
use std::fmt::Display;
use std::future::IntoFuture;
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::{CliError, GovernanceError};
use crate::gateway::{LedgerGateway, ProposalRaw, Receipt, TxHandle, VoteChoice, WalletProvider};

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

sol! {
    #[sol(rpc)]
    interface ICryptoDevsDAO {
        function owner() external view returns (address);
        function numProposals() external view returns (uint256);
        function proposals(uint256 index) external view returns (
            uint256 nftTokenId,
            uint256 deadline,
            uint256 yayVotes,
            uint256 nayVotes,
            bool executed
        );
        function createProposal(uint256 nftTokenId) external returns (uint256);
        function voteOnProposal(uint256 proposalIndex, uint8 vote) external;
        function executeProposal(uint256 proposalIndex) external;
        function withdrawEther() external;
    }

    #[sol(rpc)]
    interface IMembershipNFT {
        function balanceOf(address owner) external view returns (uint256);
    }
}

/// JSON-RPC client for the governance and membership contracts.
///
/// Built without a signer the ledger is read-only; write calls would be
/// rejected by the node, and the session guard refuses them earlier.
pub struct EvmLedger {
    provider: DynProvider,
    governance: Address,
    membership: Address,
    identity: Option<Address>,
    call_timeout: Duration,
}

impl EvmLedger {
    pub fn new(
        endpoint_url: &str,
        governance: Address,
        membership: Address,
        signer: Option<PrivateKeySigner>,
        call_timeout: Duration,
    ) -> Result<Self, CliError> {
        let url = endpoint_url
            .parse()
            .map_err(|_| CliError::InvalidEndpoint(endpoint_url.to_string()))?;
        let identity = signer.as_ref().map(|s| s.address());

        let provider = match signer {
            Some(signer) => ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer))
                .connect_http(url)
                .erased(),
            None => ProviderBuilder::new().connect_http(url).erased(),
        };

        Ok(Self {
            provider,
            governance,
            membership,
            identity,
            call_timeout,
        })
    }

    fn dao(&self) -> ICryptoDevsDAO::ICryptoDevsDAOInstance<DynProvider> {
        ICryptoDevsDAO::new(self.governance, self.provider.clone())
    }

    async fn bounded<F, T, E>(&self, call: F) -> Result<T, String>
    where
        F: IntoFuture<Output = Result<T, E>>,
        E: Display,
    {
        match tokio::time::timeout(self.call_timeout, call.into_future()).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("no response within {}s", self.call_timeout.as_secs())),
        }
    }

    async fn read<F, T, E>(&self, operation: &'static str, call: F) -> Result<T, GovernanceError>
    where
        F: IntoFuture<Output = Result<T, E>>,
        E: Display,
    {
        debug!(operation, "Ledger read");
        self.bounded(call)
            .await
            .map_err(|reason| GovernanceError::contract_call(operation, reason))
    }

    async fn write<F, P, E>(&self, operation: &'static str, send: F) -> Result<TxHandle, GovernanceError>
    where
        F: IntoFuture<Output = Result<PendingTransactionBuilder<P>, E>>,
        P: alloy::network::Network,
        E: Display,
    {
        let pending = self
            .bounded(send)
            .await
            .map_err(|reason| GovernanceError::contract_call(operation, reason))?;
        let tx_hash = *pending.tx_hash();
        debug!(operation, %tx_hash, "Transaction broadcast");
        Ok(TxHandle { tx_hash })
    }
}

fn to_u64(operation: &'static str, value: U256) -> Result<u64, GovernanceError> {
    u64::try_from(value)
        .map_err(|_| GovernanceError::contract_call(operation, format!("value {} does not fit in u64", value)))
}

#[async_trait]
impl LedgerGateway for EvmLedger {
    async fn get_owner(&self) -> Result<Address, GovernanceError> {
        self.read("owner", self.dao().owner().call()).await
    }

    async fn get_treasury_balance(&self) -> Result<U256, GovernanceError> {
        self.read("getBalance", self.provider.get_balance(self.governance)).await
    }

    async fn get_proposal_count(&self) -> Result<u64, GovernanceError> {
        let count = self.read("numProposals", self.dao().numProposals().call()).await?;
        to_u64("numProposals", count)
    }

    async fn get_proposal(&self, id: u64) -> Result<ProposalRaw, GovernanceError> {
        let proposal = self
            .read("proposals", self.dao().proposals(U256::from(id)).call())
            .await?;

        Ok(ProposalRaw {
            nft_token_id: proposal.nftTokenId,
            deadline: proposal.deadline,
            yes_votes: proposal.yayVotes,
            no_votes: proposal.nayVotes,
            executed: proposal.executed,
        })
    }

    async fn get_membership_balance(&self, address: Address) -> Result<u64, GovernanceError> {
        let nft = IMembershipNFT::new(self.membership, self.provider.clone());
        let balance = self.read("balanceOf", nft.balanceOf(address).call()).await?;
        to_u64("balanceOf", balance)
    }

    async fn create_proposal(&self, nft_token_id: U256) -> Result<TxHandle, GovernanceError> {
        self.write("createProposal", self.dao().createProposal(nft_token_id).send())
            .await
    }

    async fn vote_on_proposal(&self, id: u64, vote: VoteChoice) -> Result<TxHandle, GovernanceError> {
        self.write(
            "voteOnProposal",
            self.dao().voteOnProposal(U256::from(id), vote.as_u8()).send(),
        )
        .await
    }

    async fn execute_proposal(&self, id: u64) -> Result<TxHandle, GovernanceError> {
        self.write("executeProposal", self.dao().executeProposal(U256::from(id)).send())
            .await
    }

    async fn withdraw_treasury(&self) -> Result<TxHandle, GovernanceError> {
        self.write("withdrawEther", self.dao().withdrawEther().send()).await
    }
}

#[async_trait]
impl WalletProvider for EvmLedger {
    async fn connect(&self) -> Result<u64, GovernanceError> {
        let network_id = self.network_id().await?;
        debug!(network_id, identity = ?self.identity, "Provider reachable");
        Ok(network_id)
    }

    async fn network_id(&self) -> Result<u64, GovernanceError> {
        self.bounded(self.provider.get_chain_id())
            .await
            .map_err(GovernanceError::Provider)
    }

    fn signing_identity(&self) -> Option<Address> {
        self.identity
    }

    async fn await_confirmation(&self, tx: TxHandle) -> Result<Receipt, GovernanceError> {
        let mut poll = tokio::time::interval(RECEIPT_POLL_INTERVAL);
        loop {
            poll.tick().await;

            let receipt = match self.provider.get_transaction_receipt(tx.tx_hash).await {
                Ok(Some(receipt)) => receipt,
                Ok(None) => {
                    debug!(tx = %tx.tx_hash, "Transaction not mined yet");
                    continue;
                }
                // Outcome unknown; keep polling until the caller's timeout
                Err(e) => {
                    warn!(tx = %tx.tx_hash, error = %e, "Receipt lookup failed, retrying");
                    continue;
                }
            };

            if !receipt.status() {
                return Err(GovernanceError::TxReverted(tx.tx_hash));
            }

            return Ok(Receipt {
                tx_hash: receipt.transaction_hash,
                block_number: receipt.block_number,
                gas_used: receipt.gas_used,
            });
        }
    }
}
