use alloy::primitives::Address;
use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::CliError;

pub const SEPOLIA_NETWORK_ID: u64 = 11155111;
pub const DEFAULT_ENDPOINT_URL: &str = "https://ethereum-sepolia-rpc.publicnode.com";

pub const ENV_ENDPOINT_URL: &str = "DAO_RPC_URL";
pub const ENV_NETWORK_ID: &str = "DAO_NETWORK_ID";
pub const ENV_GOVERNANCE_ADDRESS: &str = "DAO_GOVERNANCE_ADDRESS";
pub const ENV_MEMBERSHIP_ADDRESS: &str = "DAO_MEMBERSHIP_ADDRESS";
pub const ENV_PRIVATE_KEY: &str = "DAO_PRIVATE_KEY";

fn default_confirmation_timeout() -> u64 {
    180
}

fn default_call_timeout() -> u64 {
    30
}

/// Configuration for the DAO CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub endpoint_url: String,
    pub expected_network_id: u64,
    #[serde(default)]
    pub governance_contract_address: Option<String>,
    #[serde(default)]
    pub membership_contract_address: Option<String>,
    #[serde(default)]
    pub wallet_path: Option<PathBuf>,
    #[serde(default = "default_confirmation_timeout")]
    pub confirmation_timeout_secs: u64,
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,
    /// Only ever read from the environment, never written to disk.
    #[serde(skip)]
    pub private_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            expected_network_id: SEPOLIA_NETWORK_ID,
            governance_contract_address: None,
            membership_contract_address: None,
            wallet_path: None,
            confirmation_timeout_secs: default_confirmation_timeout(),
            call_timeout_secs: default_call_timeout(),
            private_key: None,
        }
    }
}

impl Config {
    /// Get config directory
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find config directory"))?;
        Ok(config_dir.join("dao-cli"))
    }

    /// Get config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from file
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            // Create default config
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(&path)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load config from file, then apply `DAO_*` environment overrides
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        Ok(())
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), CliError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = lookup(ENV_ENDPOINT_URL) {
            self.set_endpoint(&url)?;
        }
        if let Some(id) = lookup(ENV_NETWORK_ID) {
            let id = id
                .trim()
                .parse::<u64>()
                .map_err(|_| CliError::ConfigError(format!("{} must be an integer, got '{}'", ENV_NETWORK_ID, id)))?;
            self.set_network_id(id)?;
        }
        if let Some(address) = lookup(ENV_GOVERNANCE_ADDRESS) {
            parse_address(&address)?;
            self.governance_contract_address = Some(address);
        }
        if let Some(address) = lookup(ENV_MEMBERSHIP_ADDRESS) {
            parse_address(&address)?;
            self.membership_contract_address = Some(address);
        }
        if let Some(key) = lookup(ENV_PRIVATE_KEY) {
            self.private_key = Some(key);
        }

        Ok(())
    }

    pub fn set_endpoint(&mut self, url: &str) -> Result<(), CliError> {
        let url = url.trim();
        let host = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .ok_or_else(|| CliError::InvalidEndpoint(url.to_string()))?;

        if host.is_empty() || host.starts_with('/') {
            return Err(CliError::InvalidEndpoint(url.to_string()));
        }

        self.endpoint_url = url.to_string();
        Ok(())
    }

    pub fn set_network_id(&mut self, id: u64) -> Result<(), CliError> {
        if id == 0 {
            return Err(CliError::ConfigError("network id must be greater than 0".to_string()));
        }
        self.expected_network_id = id;
        Ok(())
    }

    pub fn set_contracts(&mut self, governance: &str, membership: &str) -> Result<(), CliError> {
        // Stored checksummed so the file diffs cleanly
        let governance = parse_address(governance)?;
        let membership = parse_address(membership)?;
        self.governance_contract_address = Some(governance.to_checksum(None));
        self.membership_contract_address = Some(membership.to_checksum(None));
        Ok(())
    }

    pub fn governance_address(&self) -> Result<Address, CliError> {
        match &self.governance_contract_address {
            Some(address) => parse_address(address),
            None => Err(CliError::ContractNotConfigured("Governance")),
        }
    }

    pub fn membership_address(&self) -> Result<Address, CliError> {
        match &self.membership_contract_address {
            Some(address) => parse_address(address),
            None => Err(CliError::ContractNotConfigured("Membership")),
        }
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

pub fn parse_address(value: &str) -> Result<Address, CliError> {
    Address::from_str(value.trim()).map_err(|_| CliError::InvalidAddress(value.to_string()))
}

/// Set ledger endpoint
pub fn set_endpoint(url: &str) -> Result<()> {
    let mut config = Config::load()?;
    config.set_endpoint(url)?;
    config.save()?;

    println!("{}", format!("✓ Endpoint set to: {}", config.endpoint_url).green());

    Ok(())
}

/// Set expected network id
pub fn set_network_id(id: u64) -> Result<()> {
    let mut config = Config::load()?;
    config.set_network_id(id)?;
    config.save()?;

    println!("{}", format!("✓ Expected network id set to: {}", id).green());

    Ok(())
}

/// Set governance and membership contract addresses
pub fn set_contracts(governance: &str, membership: &str) -> Result<()> {
    let mut config = Config::load()?;
    config.set_contracts(governance, membership)?;
    config.save()?;

    println!("{}", "✓ Contract addresses updated".green());
    println!("  Governance:  {}", config.governance_contract_address.unwrap_or_default());
    println!("  Membership:  {}", config.membership_contract_address.unwrap_or_default());

    Ok(())
}

/// Show current configuration
pub fn show() -> Result<()> {
    let config = Config::load_with_env()?;
    let not_set = || "Not set".to_string();

    println!("{}", "DAO CLI Configuration".bright_cyan().bold());
    println!("  Endpoint:       {}", config.endpoint_url.bright_yellow());
    println!("  Network ID:     {}", config.expected_network_id);
    println!(
        "  Governance:     {}",
        config.governance_contract_address.clone().unwrap_or_else(not_set)
    );
    println!(
        "  Membership:     {}",
        config.membership_contract_address.clone().unwrap_or_else(not_set)
    );
    println!(
        "  Wallet Path:    {}",
        config
            .wallet_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(not_set)
    );
    if config.private_key.is_some() {
        println!("  Credential:     {}", format!("from {}", ENV_PRIVATE_KEY).dimmed());
    }
    println!("  Confirm Timeout: {}s", config.confirmation_timeout_secs);
    println!("  Call Timeout:    {}s", config.call_timeout_secs);

    Ok(())
}
