//! Process-local state of one wallet session.
//!
//! `Session` owns the only mutable copy of `SessionState`. The controller and
//! the synchronizer write to it; everything else reads snapshots.

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error};

use crate::errors::GovernanceError;
use crate::proposal::Proposal;

/// User-initiated, state-changing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Create,
    Vote,
    Execute,
    Withdraw,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CommandKind::Create => "create a proposal",
            CommandKind::Vote => "vote",
            CommandKind::Execute => "execute",
            CommandKind::Withdraw => "withdraw",
        };
        f.write_str(label)
    }
}

/// Step of an in-flight command. `Idle` is represented by the absence of a
/// pending command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandPhase {
    Guarding,
    Submitting,
    Confirming,
    Resyncing,
    Failed,
}

impl fmt::Display for CommandPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CommandPhase::Guarding => "checking network",
            CommandPhase::Submitting => "submitting transaction",
            CommandPhase::Confirming => "waiting for confirmation",
            CommandPhase::Resyncing => "refreshing proposals",
            CommandPhase::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCommand {
    pub kind: CommandKind,
    pub phase: CommandPhase,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub connected: bool,
    pub network_id: Option<u64>,
    pub identity: Option<Address>,
    pub membership_balance: u64,
    pub is_owner: bool,
    pub treasury_balance: U256,
    /// Ordered by `proposal_id` ascending, replaced wholesale on every sync.
    pub proposals: Vec<Proposal>,
    pub pending_command: Option<PendingCommand>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn proposal(&self, id: u64) -> Option<&Proposal> {
        self.proposals.iter().find(|p| p.proposal_id == id)
    }

    pub fn is_member(&self) -> bool {
        self.membership_balance > 0
    }
}

/// Owned handle to the session state, shared by reference with the
/// components that need it.
#[derive(Debug, Default)]
pub struct Session {
    state: RwLock<SessionState>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SessionState {
        self.read().clone()
    }

    pub fn mark_connected(&self, network_id: u64, identity: Option<Address>) {
        let mut state = self.write();
        state.connected = true;
        state.network_id = Some(network_id);
        state.identity = identity;
    }

    /// Discard everything derived from the session. A command still in
    /// flight keeps its slot until its ticket is dropped.
    pub fn teardown(&self) {
        let mut state = self.write();
        let pending_command = state.pending_command;
        *state = SessionState {
            pending_command,
            ..SessionState::default()
        };
        debug!(in_flight = pending_command.is_some(), "Session torn down");
    }

    pub fn replace_proposals(&self, proposals: Vec<Proposal>) {
        let mut state = self.write();
        state.proposals = proposals;
        state.last_synced_at = Some(Utc::now());
    }

    pub fn set_treasury_balance(&self, balance: U256) {
        self.write().treasury_balance = balance;
    }

    pub fn set_membership_balance(&self, balance: u64) {
        self.write().membership_balance = balance;
    }

    pub fn set_is_owner(&self, is_owner: bool) {
        self.write().is_owner = is_owner;
    }

    pub fn pending_command(&self) -> Option<PendingCommand> {
        self.read().pending_command
    }

    /// Claim the single command slot.
    ///
    /// Fails with `CommandInProgress` without touching anything else when
    /// another command holds it. The slot is released when the returned
    /// ticket is dropped.
    pub fn begin_command(&self, kind: CommandKind) -> Result<CommandTicket<'_>, GovernanceError> {
        let mut state = self.write();
        if let Some(running) = state.pending_command {
            return Err(GovernanceError::CommandInProgress {
                requested: kind,
                running: running.kind,
            });
        }
        state.pending_command = Some(PendingCommand {
            kind,
            phase: CommandPhase::Guarding,
        });
        Ok(CommandTicket { session: self, kind })
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("Session state lock (read) poisoned - recovering with last written state");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("Session state lock (write) poisoned - recovering with last written state");
                poisoned.into_inner()
            }
        }
    }
}

/// Proof of holding the command slot.
#[derive(Debug)]
pub struct CommandTicket<'a> {
    session: &'a Session,
    kind: CommandKind,
}

impl CommandTicket<'_> {
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn advance(&self, phase: CommandPhase) {
        let mut state = self.session.write();
        if let Some(pending) = state.pending_command.as_mut() {
            pending.phase = phase;
        }
    }
}

impl Drop for CommandTicket<'_> {
    fn drop(&mut self) {
        self.session.write().pending_command = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn proposal(id: u64) -> Proposal {
        Proposal {
            proposal_id: id,
            nft_token_id: U256::from(id),
            deadline: Utc::now() + Duration::minutes(5),
            yes_votes: 0,
            no_votes: 0,
            executed: false,
        }
    }

    #[test]
    fn test_begin_command_sets_guarding_phase() {
        let session = Session::new();
        let ticket = session.begin_command(CommandKind::Vote).unwrap();

        let pending = session.pending_command().unwrap();
        assert_eq!(pending.kind, CommandKind::Vote);
        assert_eq!(pending.phase, CommandPhase::Guarding);
        assert!(session.snapshot().pending_command.is_some());

        ticket.advance(CommandPhase::Confirming);
        assert_eq!(
            session.pending_command().unwrap().phase,
            CommandPhase::Confirming
        );
    }

    #[test]
    fn test_second_command_rejected_without_state_change() {
        let session = Session::new();
        session.replace_proposals(vec![proposal(0)]);
        let _ticket = session.begin_command(CommandKind::Execute).unwrap();
        let before = session.snapshot();

        let err = session.begin_command(CommandKind::Vote).unwrap_err();
        assert!(matches!(
            err,
            GovernanceError::CommandInProgress {
                requested: CommandKind::Vote,
                running: CommandKind::Execute,
            }
        ));
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn test_dropping_ticket_returns_to_idle() {
        let session = Session::new();
        {
            let _ticket = session.begin_command(CommandKind::Withdraw).unwrap();
        }
        assert!(session.pending_command().is_none());
        assert!(session.begin_command(CommandKind::Create).is_ok());
    }

    #[test]
    fn test_teardown_resets_state() {
        let session = Session::new();
        session.mark_connected(11155111, Some(Address::repeat_byte(1)));
        session.set_membership_balance(2);
        session.replace_proposals(vec![proposal(0), proposal(1)]);

        session.teardown();
        assert_eq!(session.snapshot(), SessionState::default());
    }

    #[test]
    fn test_teardown_keeps_in_flight_command_slot() {
        let session = Session::new();
        session.mark_connected(11155111, None);
        let ticket = session.begin_command(CommandKind::Vote).unwrap();
        ticket.advance(CommandPhase::Confirming);

        session.teardown();
        let state = session.snapshot();
        assert!(!state.connected);
        assert_eq!(state.pending_command.map(|p| p.phase), Some(CommandPhase::Confirming));
        assert!(matches!(
            session.begin_command(CommandKind::Create),
            Err(GovernanceError::CommandInProgress { .. })
        ));

        drop(ticket);
        assert!(session.begin_command(CommandKind::Create).is_ok());
    }

    #[test]
    fn test_replace_proposals_records_sync_time() {
        let session = Session::new();
        assert!(session.snapshot().last_synced_at.is_none());

        session.replace_proposals(vec![proposal(0)]);
        let state = session.snapshot();
        assert!(state.last_synced_at.is_some());
        assert!(state.proposal(0).is_some());
        assert!(state.proposal(1).is_none());
    }
}
