use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

const GOVERNANCE: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
const MEMBERSHIP: &str = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512";

/// Helper to create test command with isolated config
fn dao_cmd() -> Command {
    let mut cmd = Command::cargo_bin("dao-cli").unwrap();

    // Use unique temporary directory for each test
    let test_id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let temp_dir = env::temp_dir().join(format!("dao-cli-test-{}-{}", std::process::id(), test_id));
    cmd.env("HOME", temp_dir.to_str().unwrap());
    cmd.env("USERPROFILE", temp_dir.to_str().unwrap());
    cmd.env_remove("XDG_CONFIG_HOME");
    for var in [
        "DAO_RPC_URL",
        "DAO_NETWORK_ID",
        "DAO_GOVERNANCE_ADDRESS",
        "DAO_MEMBERSHIP_ADDRESS",
        "DAO_PRIVATE_KEY",
    ] {
        cmd.env_remove(var);
    }

    cmd
}

#[test]
fn test_cli_runs() {
    dao_cmd().arg("--version").assert().success();
}

#[test]
fn test_cli_shows_help() {
    dao_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("DAO"));
}

#[test]
fn test_config_show() {
    dao_cmd()
        .arg("config")
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration"));
}

#[test]
fn test_config_set_endpoint_invalid() {
    dao_cmd()
        .arg("config")
        .arg("set-endpoint")
        .arg("ftp://node.example")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid endpoint"));
}

#[test]
fn test_config_set_contracts_invalid_address() {
    dao_cmd()
        .args(["config", "set-contracts", "--governance", "0x1234", "--membership", MEMBERSHIP])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid address"));
}

#[test]
fn test_vote_requires_arguments() {
    dao_cmd().arg("vote").assert().failure();
}

#[test]
fn test_vote_rejects_unknown_choice() {
    dao_cmd()
        .args(["vote", "--proposal", "0", "--choice", "abstain"])
        .assert()
        .failure();
}

#[test]
fn test_vote_without_contracts_configured() {
    dao_cmd()
        .args(["vote", "--proposal", "0", "--choice", "yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not set"));
}

#[test]
fn test_vote_without_wallet() {
    dao_cmd()
        .args(["vote", "--proposal", "0", "--choice", "yes"])
        .env("DAO_GOVERNANCE_ADDRESS", GOVERNANCE)
        .env("DAO_MEMBERSHIP_ADDRESS", MEMBERSHIP)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Wallet not found"));
}

#[test]
fn test_withdraw_without_wallet() {
    dao_cmd()
        .arg("withdraw")
        .env("DAO_GOVERNANCE_ADDRESS", GOVERNANCE)
        .env("DAO_MEMBERSHIP_ADDRESS", MEMBERSHIP)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Wallet not found"));
}

#[test]
fn test_wallet_address_without_wallet() {
    dao_cmd()
        .args(["wallet", "address"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Wallet not found"));
}

#[test]
#[serial]
fn test_wallet_create_then_address() {
    let home = tempfile::tempdir().unwrap();

    Command::cargo_bin("dao-cli")
        .unwrap()
        .env("HOME", home.path())
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("DAO_PRIVATE_KEY")
        .args(["wallet", "create"])
        .assert()
        .success()
        .stdout(predicate::str::contains("New wallet created"));

    Command::cargo_bin("dao-cli")
        .unwrap()
        .env("HOME", home.path())
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("DAO_PRIVATE_KEY")
        .args(["wallet", "address"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0x"));
}

#[test]
#[serial]
fn test_config_set_network_id_persists() {
    let home = tempfile::tempdir().unwrap();

    Command::cargo_bin("dao-cli")
        .unwrap()
        .env("HOME", home.path())
        .env_remove("XDG_CONFIG_HOME")
        .args(["config", "set-network-id", "31337"])
        .assert()
        .success();

    Command::cargo_bin("dao-cli")
        .unwrap()
        .env("HOME", home.path())
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("DAO_NETWORK_ID")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("31337"));
}

#[test]
fn test_config_set_network_id_zero_rejected() {
    dao_cmd()
        .args(["config", "set-network-id", "0"])
        .assert()
        .failure();
}
