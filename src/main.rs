mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use dao_cli::{config, wallet, VoteChoice};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dao-cli")]
#[command(author = "CryptoDevs DAO Team")]
#[command(version = "0.1.0")]
#[command(about = "CLI tool for CryptoDevs DAO members", long_about = None)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show treasury, membership and ownership for the connected wallet
    Status,

    /// List or inspect proposals
    Proposals {
        #[command(subcommand)]
        action: ProposalCommands,
    },

    /// Create a proposal to buy an NFT from the marketplace
    Propose {
        /// Token id of the NFT the DAO should buy
        #[arg(long)]
        nft_token_id: u64,

        /// Submit even if local checks say the ledger will reject it
        #[arg(long)]
        skip_checks: bool,
    },

    /// Vote on an open proposal
    Vote {
        /// Proposal id
        #[arg(long)]
        proposal: u64,

        /// Your vote
        #[arg(long, value_enum)]
        choice: Choice,

        /// Submit even if local checks say the ledger will reject it
        #[arg(long)]
        skip_checks: bool,
    },

    /// Execute a proposal whose deadline has passed
    Execute {
        /// Proposal id
        #[arg(long)]
        proposal: u64,

        /// Submit even if local checks say the ledger will reject it
        #[arg(long)]
        skip_checks: bool,
    },

    /// Withdraw the treasury (DAO owner only)
    Withdraw {
        /// Submit even if local checks say the ledger will reject it
        #[arg(long)]
        skip_checks: bool,
    },

    /// Wallet management commands
    Wallet {
        #[command(subcommand)]
        action: WalletCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ProposalCommands {
    /// List all proposals
    List {
        /// Only show proposals that are still open for voting
        #[arg(long)]
        open: bool,
    },

    /// Show a single proposal
    Show {
        /// Proposal id
        id: u64,
    },
}

#[derive(Subcommand)]
enum WalletCommands {
    /// Create a new wallet
    Create,

    /// Import wallet from key file
    Import {
        /// Path to key file JSON
        #[arg(long)]
        key_file: String,
    },

    /// Show wallet address
    Address,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set the ledger JSON-RPC endpoint
    SetEndpoint {
        /// HTTP(S) URL of the node
        url: String,
    },

    /// Set the network id every command is checked against
    SetNetworkId {
        /// Chain id, e.g. 11155111 for Sepolia
        id: u64,
    },

    /// Set the governance and membership contract addresses
    SetContracts {
        /// DAO governance contract
        #[arg(long)]
        governance: String,

        /// Membership NFT contract
        #[arg(long)]
        membership: String,
    },

    /// Show current configuration
    Show,
}

#[derive(Clone, Copy, ValueEnum)]
enum Choice {
    Yes,
    No,
}

impl From<Choice> for VoteChoice {
    fn from(choice: Choice) -> Self {
        match choice {
            Choice::Yes => VoteChoice::Yes,
            Choice::No => VoteChoice::No,
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("dao_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    println!("{}", "╔════════════════════════════════════════════╗".bright_cyan());
    println!("{}", "║      CryptoDevs DAO - Governance CLI       ║".bright_cyan());
    println!("{}", "╚════════════════════════════════════════════╝".bright_cyan());
    println!();

    match cli.command {
        Commands::Status => {
            commands::status::execute().await?;
        }
        Commands::Proposals { action } => match action {
            ProposalCommands::List { open } => commands::proposals::list(open).await?,
            ProposalCommands::Show { id } => commands::proposals::show(id).await?,
        },
        Commands::Propose { nft_token_id, skip_checks } => {
            commands::propose::execute(nft_token_id, skip_checks).await?;
        }
        Commands::Vote { proposal, choice, skip_checks } => {
            commands::vote::execute(proposal, choice.into(), skip_checks).await?;
        }
        Commands::Execute { proposal, skip_checks } => {
            commands::execute::execute(proposal, skip_checks).await?;
        }
        Commands::Withdraw { skip_checks } => {
            commands::withdraw::execute(skip_checks).await?;
        }
        Commands::Wallet { action } => match action {
            WalletCommands::Create => wallet::create().await?,
            WalletCommands::Import { key_file } => wallet::import(&key_file).await?,
            WalletCommands::Address => wallet::show_address().await?,
        },
        Commands::Config { action } => match action {
            ConfigCommands::SetEndpoint { url } => config::set_endpoint(&url)?,
            ConfigCommands::SetNetworkId { id } => config::set_network_id(id)?,
            ConfigCommands::SetContracts { governance, membership } => {
                config::set_contracts(&governance, &membership)?
            }
            ConfigCommands::Show => config::show()?,
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_verification() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_has_version() {
        let cmd = Cli::command();
        assert_eq!(cmd.get_version().unwrap(), "0.1.0");
    }

    #[test]
    fn test_vote_choice_parsing() {
        let cli = Cli::try_parse_from(["dao-cli", "vote", "--proposal", "2", "--choice", "no"]).unwrap();
        match cli.command {
            Commands::Vote { proposal, choice, skip_checks } => {
                assert_eq!(proposal, 2);
                assert_eq!(VoteChoice::from(choice), VoteChoice::No);
                assert!(!skip_checks);
            }
            _ => panic!("expected vote command"),
        }
    }

    #[test]
    fn test_vote_rejects_unknown_choice() {
        assert!(Cli::try_parse_from(["dao-cli", "vote", "--proposal", "2", "--choice", "maybe"]).is_err());
    }
}
