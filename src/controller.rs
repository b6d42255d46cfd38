//! Orchestrates user commands against the ledger.
//!
//! Each command walks `Guarding -> Submitting -> Confirming -> Resyncing`
//! while holding the session's single command slot, and lands in `Failed`
//! on the first error. The slot is released on every exit path.

use alloy::primitives::U256;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::errors::GovernanceError;
use crate::gateway::{LedgerGateway, Receipt, TxHandle, VoteChoice, WalletProvider};
use crate::guard::{AccessMode, SessionGuard};
use crate::proposal::ProposalStatus;
use crate::state::{CommandKind, CommandPhase, CommandTicket, Session, SessionState};
use crate::sync::ProposalSynchronizer;

pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(180);

pub type PhaseListener = Arc<dyn Fn(CommandKind, CommandPhase) + Send + Sync>;

#[derive(Debug, Clone, Copy)]
pub struct ControllerOptions {
    pub confirmation_timeout: Duration,
    /// Local membership/ownership/status checks before submitting. The ledger
    /// remains authoritative either way.
    pub enforce_advisory_checks: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            enforce_advisory_checks: true,
        }
    }
}

/// Result of a confirmed command.
#[derive(Debug)]
pub struct CommandOutcome {
    pub kind: CommandKind,
    pub receipt: Receipt,
    /// The transaction is final even when the follow-up sync failed.
    pub resync_error: Option<GovernanceError>,
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Create { nft_token_id: U256 },
    Vote { proposal_id: u64, choice: VoteChoice },
    Execute { proposal_id: u64 },
    Withdraw,
}

impl Action {
    fn kind(&self) -> CommandKind {
        match self {
            Action::Create { .. } => CommandKind::Create,
            Action::Vote { .. } => CommandKind::Vote,
            Action::Execute { .. } => CommandKind::Execute,
            Action::Withdraw => CommandKind::Withdraw,
        }
    }
}

pub struct GovernanceController {
    session: Arc<Session>,
    guard: SessionGuard,
    gateway: Arc<dyn LedgerGateway>,
    wallet: Arc<dyn WalletProvider>,
    synchronizer: ProposalSynchronizer,
    options: ControllerOptions,
    phase_listener: Option<PhaseListener>,
}

impl GovernanceController {
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        wallet: Arc<dyn WalletProvider>,
        expected_network_id: u64,
        options: ControllerOptions,
    ) -> Self {
        let session = Arc::new(Session::new());
        let guard = SessionGuard::new(wallet.clone(), expected_network_id);
        let synchronizer = ProposalSynchronizer::new(gateway.clone(), guard.clone(), session.clone());

        Self {
            session,
            guard,
            gateway,
            wallet,
            synchronizer,
            options,
            phase_listener: None,
        }
    }

    pub fn with_phase_listener(mut self, listener: PhaseListener) -> Self {
        self.phase_listener = Some(listener);
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn snapshot(&self) -> SessionState {
        self.session.snapshot()
    }

    /// Open the session and run the initial synchronization.
    pub async fn connect(&self) -> Result<(), GovernanceError> {
        self.wallet.connect().await?;
        let context = self.guard.require_network(AccessMode::ReadOnly).await?;
        let identity = self.wallet.signing_identity();
        self.session.mark_connected(context.network_id(), identity);

        info!(network_id = context.network_id(), identity = ?identity, "Session connected");
        self.refresh().await
    }

    /// Re-read treasury, membership, ownership and proposals concurrently.
    ///
    /// Each read writes its own field; a failed read leaves that field alone
    /// and the first error is returned after all of them finish.
    pub async fn refresh(&self) -> Result<(), GovernanceError> {
        let identity = self.session.snapshot().identity;

        let membership = async {
            match identity {
                Some(address) => self.synchronizer.sync_membership(address).await.map(drop),
                None => Ok(()),
            }
        };
        let ownership = async {
            match identity {
                Some(address) => self.synchronizer.sync_ownership(address).await.map(drop),
                None => Ok(()),
            }
        };

        let (treasury, proposals, membership, ownership) = tokio::join!(
            self.synchronizer.sync_treasury(),
            self.synchronizer.sync_all(),
            membership,
            ownership,
        );

        let results = [
            treasury.map(drop),
            proposals.map(drop),
            membership,
            ownership,
        ];

        let mut first_error = None;
        for result in results {
            if let Err(e) = result {
                warn!(error = %e, "Refresh read failed");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn disconnect(&self) {
        self.session.teardown();
    }

    pub async fn create_proposal(&self, nft_token_id: U256) -> Result<CommandOutcome, GovernanceError> {
        self.run(Action::Create { nft_token_id }).await
    }

    pub async fn vote(&self, proposal_id: u64, choice: VoteChoice) -> Result<CommandOutcome, GovernanceError> {
        self.run(Action::Vote { proposal_id, choice }).await
    }

    pub async fn execute(&self, proposal_id: u64) -> Result<CommandOutcome, GovernanceError> {
        self.run(Action::Execute { proposal_id }).await
    }

    pub async fn withdraw(&self) -> Result<CommandOutcome, GovernanceError> {
        self.run(Action::Withdraw).await
    }

    async fn run(&self, action: Action) -> Result<CommandOutcome, GovernanceError> {
        let kind = action.kind();
        let ticket = self.session.begin_command(kind)?;

        let result = self.drive(&ticket, action).await;
        match &result {
            Ok(outcome) => info!(command = ?kind, tx = %outcome.receipt.tx_hash, "Command confirmed"),
            Err(e) => {
                self.enter(&ticket, CommandPhase::Failed);
                warn!(command = ?kind, error = %e, "Command failed");
            }
        }

        drop(ticket);
        result
    }

    async fn drive(&self, ticket: &CommandTicket<'_>, action: Action) -> Result<CommandOutcome, GovernanceError> {
        self.enter(ticket, CommandPhase::Guarding);
        self.guard.require_network(AccessMode::Signing).await?;
        if self.options.enforce_advisory_checks {
            self.check_advisory(action)?;
        }

        self.enter(ticket, CommandPhase::Submitting);
        let tx = self.submit(action).await?;

        self.enter(ticket, CommandPhase::Confirming);
        let receipt = self.confirm(tx).await?;

        self.enter(ticket, CommandPhase::Resyncing);
        let resync_error = self.resync(action.kind()).await.err();
        if let Some(e) = &resync_error {
            warn!(error = %e, "Resync after confirmed transaction failed");
        }

        Ok(CommandOutcome {
            kind: action.kind(),
            receipt,
            resync_error,
        })
    }

    fn enter(&self, ticket: &CommandTicket<'_>, phase: CommandPhase) {
        ticket.advance(phase);
        debug!(command = ?ticket.kind(), ?phase, "Command phase");
        if let Some(listener) = &self.phase_listener {
            listener(ticket.kind(), phase);
        }
    }

    fn check_advisory(&self, action: Action) -> Result<(), GovernanceError> {
        let state = self.session.snapshot();

        match action {
            Action::Create { .. } => require_member(&state, CommandKind::Create),
            Action::Vote { proposal_id, .. } => {
                require_member(&state, CommandKind::Vote)?;
                require_status(&state, proposal_id, ProposalStatus::Votable, CommandKind::Vote)
            }
            Action::Execute { proposal_id } => {
                require_status(&state, proposal_id, ProposalStatus::Executable, CommandKind::Execute)
            }
            Action::Withdraw => {
                if state.is_owner {
                    Ok(())
                } else {
                    Err(GovernanceError::NotOwner)
                }
            }
        }
    }

    async fn submit(&self, action: Action) -> Result<TxHandle, GovernanceError> {
        let tx = match action {
            Action::Create { nft_token_id } => self.gateway.create_proposal(nft_token_id).await?,
            Action::Vote { proposal_id, choice } => {
                self.gateway.vote_on_proposal(proposal_id, choice).await?
            }
            Action::Execute { proposal_id } => self.gateway.execute_proposal(proposal_id).await?,
            Action::Withdraw => self.gateway.withdraw_treasury().await?,
        };
        info!(command = ?action.kind(), tx = %tx.tx_hash, "Transaction submitted");
        Ok(tx)
    }

    async fn confirm(&self, tx: TxHandle) -> Result<Receipt, GovernanceError> {
        let timeout = self.options.confirmation_timeout;
        match tokio::time::timeout(timeout, self.wallet.await_confirmation(tx)).await {
            Ok(result) => result,
            Err(_) => Err(GovernanceError::TxTimeout {
                tx_hash: tx.tx_hash,
                timeout_secs: timeout.as_secs(),
            }),
        }
    }

    async fn resync(&self, kind: CommandKind) -> Result<(), GovernanceError> {
        match kind {
            CommandKind::Execute | CommandKind::Withdraw => {
                let (proposals, treasury) = tokio::join!(
                    self.synchronizer.sync_all(),
                    self.synchronizer.sync_treasury(),
                );
                proposals.map(drop).and(treasury.map(drop))
            }
            CommandKind::Create | CommandKind::Vote => self.synchronizer.sync_all().await.map(drop),
        }
    }
}

fn require_member(state: &SessionState, command: CommandKind) -> Result<(), GovernanceError> {
    if state.is_member() {
        Ok(())
    } else {
        Err(GovernanceError::NotAMember(command))
    }
}

/// Unknown proposals pass; the ledger decides.
fn require_status(
    state: &SessionState,
    id: u64,
    expected: ProposalStatus,
    command: CommandKind,
) -> Result<(), GovernanceError> {
    match state.proposal(id) {
        Some(proposal) => {
            let status = proposal.status_at(Utc::now());
            if status == expected {
                Ok(())
            } else {
                Err(GovernanceError::ProposalState { id, status, command })
            }
        }
        None => Ok(()),
    }
}
