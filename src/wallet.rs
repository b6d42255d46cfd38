use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::{Config, ENV_PRIVATE_KEY};
use crate::errors::CliError;

/// On-disk key file.
#[derive(Debug, Serialize, Deserialize)]
struct KeyFile {
    address: String,
    private_key: String,
}

impl KeyFile {
    fn from_signer(signer: &PrivateKeySigner) -> Self {
        Self {
            address: signer.address().to_checksum(None),
            private_key: alloy::hex::encode_prefixed(signer.to_bytes()),
        }
    }

    fn into_signer(self) -> Result<PrivateKeySigner> {
        let signer = PrivateKeySigner::from_str(&self.private_key)
            .context("Failed to parse private key")?;
        Ok(signer)
    }
}

/// Create a new wallet
pub async fn create() -> Result<()> {
    let signer = PrivateKeySigner::random();
    let wallet_path = get_default_wallet_path()?;

    // Save wallet
    write_key_file(&wallet_path, &signer)?;

    println!("{}", "✓ New wallet created successfully!".green());
    println!("  Address: {}", signer.address().to_checksum(None).bright_yellow());
    println!("  Saved to: {}", wallet_path.display());
    println!();
    println!("{}", "⚠ IMPORTANT: Back up your wallet file!".yellow().bold());

    // Update config
    let mut config = Config::load()?;
    config.wallet_path = Some(wallet_path);
    config.save()?;

    Ok(())
}

/// Import wallet from key file
pub async fn import(key_file: &str) -> Result<()> {
    let path = Path::new(key_file);

    if !path.exists() {
        return Err(anyhow::anyhow!("Key file not found: {}", key_file));
    }

    // Validate before recording the path
    let signer = read_key_file(path)?;

    println!("{}", "✓ Wallet imported successfully!".green());
    println!("  Address: {}", signer.address().to_checksum(None).bright_yellow());

    // Update config
    let mut config = Config::load()?;
    config.wallet_path = Some(path.to_path_buf());
    config.save()?;

    Ok(())
}

/// Show wallet address
pub async fn show_address() -> Result<()> {
    let config = Config::load_with_env()?;
    let signer = load_signer(&config)?.ok_or(CliError::WalletNotFound)?;

    println!("{}", "Wallet Address:".bright_cyan());
    println!("  {}", signer.address().to_checksum(None).bright_yellow());

    Ok(())
}

/// Resolve the signing credential: `DAO_PRIVATE_KEY` first, then the
/// configured key file. `None` means the session is read-only.
pub fn load_signer(config: &Config) -> Result<Option<PrivateKeySigner>> {
    if let Some(key) = &config.private_key {
        let signer = PrivateKeySigner::from_str(key.trim())
            .with_context(|| format!("{} is not a valid private key", ENV_PRIVATE_KEY))?;
        return Ok(Some(signer));
    }

    match &config.wallet_path {
        Some(path) if path.exists() => Ok(Some(read_key_file(path)?)),
        Some(_) => Err(CliError::WalletNotFound.into()),
        None => Ok(None),
    }
}

/// Like `load_signer`, but a credential is mandatory.
pub fn require_signer(config: &Config) -> Result<PrivateKeySigner> {
    load_signer(config)?.ok_or_else(|| CliError::WalletNotFound.into())
}

fn read_key_file(path: &Path) -> Result<PrivateKeySigner> {
    let contents = std::fs::read_to_string(path)?;
    let key_file: KeyFile = serde_json::from_str(&contents)
        .context("Invalid key file format")?;
    key_file.into_signer()
}

fn write_key_file(path: &Path, signer: &PrivateKeySigner) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(&KeyFile::from_signer(signer))?;
    std::fs::write(path, json)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

/// Get default wallet path
fn get_default_wallet_path() -> Result<PathBuf> {
    Ok(Config::config_dir()?.join("wallet.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const ANVIL_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[test]
    fn test_get_default_wallet_path() {
        let path = get_default_wallet_path().unwrap();
        assert!(path.to_string_lossy().contains("dao-cli"));
        assert!(path.to_string_lossy().contains("wallet.json"));
    }

    #[test]
    fn test_key_file_written_and_read_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("wallet.json");
        let signer = PrivateKeySigner::random();

        write_key_file(&path, &signer).unwrap();
        let restored = read_key_file(&path).unwrap();

        assert_eq!(signer.address(), restored.address());
    }

    #[cfg(unix)]
    #[test]
    fn test_key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wallet.json");
        write_key_file(&path, &PrivateKeySigner::random()).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_env_key_wins_over_wallet_file() {
        let config = Config {
            private_key: Some(ANVIL_KEY.to_string()),
            wallet_path: Some(PathBuf::from("/nonexistent/wallet.json")),
            ..Config::default()
        };

        let signer = load_signer(&config).unwrap().unwrap();
        assert_eq!(signer.address().to_checksum(None), ANVIL_ADDRESS);
    }

    #[test]
    fn test_no_credential_is_read_only() {
        let config = Config::default();
        assert!(load_signer(&config).unwrap().is_none());

        let err = require_signer(&config).unwrap_err();
        assert!(err.to_string().contains("Wallet not found"));
    }

    #[test]
    fn test_missing_wallet_file() {
        let config = Config {
            wallet_path: Some(PathBuf::from("/nonexistent/wallet.json")),
            ..Config::default()
        };
        let err = load_signer(&config).unwrap_err();
        assert!(err.to_string().contains("Wallet not found"));
    }

    #[test]
    fn test_invalid_env_key() {
        let config = Config {
            private_key: Some("not-a-key".to_string()),
            ..Config::default()
        };
        let err = load_signer(&config).unwrap_err();
        assert!(err.to_string().contains(ENV_PRIVATE_KEY));
    }

    #[test]
    fn test_create_wallet_generates_unique_keys() {
        let a = PrivateKeySigner::random();
        let b = PrivateKeySigner::random();
        assert_ne!(a.address(), b.address());
    }
}
