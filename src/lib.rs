// Library interface for the DAO governance client
// The binary in main.rs is a thin command-line layer over these modules

pub mod config;
pub mod contracts;
pub mod controller;
pub mod errors;
pub mod gateway;
pub mod guard;
pub mod proposal;
pub mod state;
pub mod sync;
pub mod wallet;

pub use controller::{CommandOutcome, ControllerOptions, GovernanceController};
pub use errors::{CliError, GovernanceError};
pub use gateway::{LedgerGateway, VoteChoice, WalletProvider};
pub use proposal::{Proposal, ProposalStatus};
pub use state::{CommandKind, CommandPhase, Session, SessionState};
