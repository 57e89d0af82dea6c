use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

const HEADER: &str = "type, order, gateway, transaction, amount, currency, reason, event";

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!());
    cmd.arg("tests/fixtures/operations.csv");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "order,status,payment_status,payment_method,gateway_transaction_id",
        ))
        .stdout(predicate::str::contains("1,confirmed,paid,simulated,simulated_1-1"))
        .stdout(predicate::str::contains(
            "2,confirmed,refunded,simulated,simulated_2-1",
        ));

    Ok(())
}

#[test]
fn test_cli_with_gateway_config() {
    let mut ops = NamedTempFile::new().unwrap();
    writeln!(ops, "{}", HEADER).unwrap();
    writeln!(ops, "pay, 42, , , 28.00, ILS").unwrap(); // woo, manual capture
    writeln!(ops, "capture, , , woo_42-1").unwrap();
    writeln!(ops, "webhook, , woo, woo_42-1, , , , payment.captured").unwrap();
    writeln!(ops, "pay, 7, , , 5.00, USD").unwrap(); // stripe declines

    let mut cmd = Command::new(cargo_bin!());
    cmd.arg(ops.path())
        .arg("--config")
        .arg("tests/fixtures/gateways.json");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error processing operation"))
        .stdout(predicate::str::contains("42,confirmed,paid,woo,woo_42-1"))
        .stdout(predicate::str::contains("7,cancelled,failed,stripe,"));
}

#[test]
fn test_authorized_payment_stays_pending_until_webhook() {
    let mut ops = NamedTempFile::new().unwrap();
    writeln!(ops, "{}", HEADER).unwrap();
    writeln!(ops, "pay, 3, woo, , 12.00, ILS").unwrap();

    let mut cmd = Command::new(cargo_bin!());
    cmd.arg(ops.path())
        .arg("--config")
        .arg("tests/fixtures/gateways.json");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("3,pending,authorized,woo,woo_3-1"));
}

#[test]
fn test_bad_rows_are_reported_and_skipped() {
    let mut ops = NamedTempFile::new().unwrap();
    writeln!(ops, "{}", HEADER).unwrap();
    writeln!(ops, "pay, 1, , , 10.00, USD").unwrap();
    writeln!(ops, "teleport, 1").unwrap();
    writeln!(ops, "refund, , , simulated_1-1, 50.00").unwrap(); // more than captured
    writeln!(ops, "refund, , , simulated_1-1, 0").unwrap();
    writeln!(ops, "void, , , simulated_1-1").unwrap(); // already captured

    let mut cmd = Command::new(cargo_bin!());
    cmd.arg(ops.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error reading operation"))
        .stderr(predicate::str::contains("refund_amount_exceeds"))
        .stderr(predicate::str::contains("invalid_amount"))
        .stderr(predicate::str::contains("already_captured"))
        .stdout(predicate::str::contains("1,confirmed,paid,simulated,simulated_1-1"));
}

#[test]
fn test_missing_config_file_fails() {
    let mut cmd = Command::new(cargo_bin!());
    cmd.arg("tests/fixtures/operations.csv")
        .arg("--config")
        .arg("tests/fixtures/does_not_exist.json");

    cmd.assert().failure();
}
