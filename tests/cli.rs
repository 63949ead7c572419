use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("garcon").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: garcon <COMMAND>"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("Options:"))
        .stdout(predicate::str::contains("--help"))
        .stdout(predicate::str::contains("--version"));
}

#[test]
fn test_cli_serve_help() {
    let mut cmd = Command::cargo_bin("garcon").unwrap();
    cmd.arg("serve")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: garcon serve"))
        .stdout(predicate::str::contains("--port <PORT>"))
        .stdout(predicate::str::contains("--help"));
}

#[test]
fn test_cli_chat_help() {
    let mut cmd = Command::cargo_bin("garcon").unwrap();
    cmd.arg("chat")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: garcon chat")); // Chat has no specific options
}

#[test]
fn test_cli_no_command() {
    // Running without a command should show help/usage
    let mut cmd = Command::cargo_bin("garcon").unwrap();
    cmd.assert()
        .failure() // clap exits with non-zero status when no command is given
        .stderr(predicate::str::contains("Usage: garcon <COMMAND>"));
}

#[test]
fn test_serve_without_credential_fails_fast() {
    let mut cmd = Command::cargo_bin("garcon").unwrap();
    cmd.arg("serve")
        .env_remove("GEMINI_API_KEY")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GEMINI_API_KEY"));
}

#[test]
fn test_chat_without_credential_fails_fast() {
    let mut cmd = Command::cargo_bin("garcon").unwrap();
    cmd.arg("chat")
        .env_remove("GEMINI_API_KEY")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GEMINI_API_KEY"));
}
