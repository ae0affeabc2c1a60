//! Binary-level tests for `costwallet`.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn costwallet() -> Command {
    let mut cmd = Command::cargo_bin("costwallet").expect("binary built");
    cmd.env_remove("COSTWALLET_BACKEND")
        .env_remove("COSTWALLET_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("costwallet.toml");
    let secrets = dir.path().join("secrets.json");
    let content = format!(
        "[storage]\nkind = \"encrypted-file\"\npath = \"{}\"\n\n[ledger]\nholder_name = \"Ada Obi\"\n",
        secrets.display()
    );
    std::fs::write(&path, content).expect("write config");
    path
}

#[test]
fn help_lists_commands() {
    costwallet()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("balance"))
        .stdout(predicate::str::contains("swap"));
}

#[test]
fn local_balance_json() {
    costwallet()
        .args(["--local", "--format", "json", "balance"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"cost_balance\": \"10\""))
        .stdout(predicate::str::contains("\"tier\": \"basic\""));
}

#[test]
fn local_deposit_prints_receipt() {
    costwallet()
        .args(["--local", "deposit", "1000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1000 FIAT"))
        .stdout(predicate::str::contains("completed"));
}

#[test]
fn local_quote_applies_fee() {
    costwallet()
        .args(["--local", "quote", "FIAT", "COST", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("You receive:  1980 COST"));
}

#[test]
fn local_swap_without_funds_fails() {
    costwallet()
        .args(["--local", "swap", "FIAT", "COST", "100"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("insufficient balance"));
}

#[test]
fn swap_same_currency_fails() {
    costwallet()
        .args(["--local", "swap", "SOL", "SOL", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid currency pair"));
}

#[test]
fn withdraw_without_bank_name_fails() {
    costwallet()
        .args([
            "--local",
            "withdraw",
            "10",
            "--account-number",
            "0123456789",
            "--account-name",
            "Wallet Holder",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bank_name"));
}

#[test]
fn tiers_table() {
    costwallet()
        .args(["--local", "tiers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Silver"))
        .stdout(predicate::str::contains("30000"));
}

#[test]
fn local_conflicts_with_backend() {
    costwallet()
        .args(["--local", "--backend", "http://localhost:8001", "balance"])
        .assert()
        .failure();
}

#[test]
fn token_set_and_clear_use_config_storage() {
    let dir = TempDir::new().expect("tempdir");
    let config = write_config(&dir);

    costwallet()
        .arg("--config")
        .arg(&config)
        .args(["token", "set", "bearer-123"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Token stored"));

    let secrets = std::fs::read_to_string(dir.path().join("secrets.json")).expect("secrets file");
    assert!(secrets.contains("auth_token"));
    assert!(!secrets.contains("bearer-123"));
    assert!(dir.path().join("secrets.key").exists());

    costwallet()
        .arg("--config")
        .arg(&config)
        .args(["token", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Token cleared"));
}

#[test]
fn unreachable_backend_reports_connection_error() {
    let dir = TempDir::new().expect("tempdir");
    let config = write_config(&dir);

    costwallet()
        .arg("--config")
        .arg(&config)
        .args(["--backend", "http://127.0.0.1:9", "balance"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("connection error"));
}
