//! Command-line driver end-to-end tests.

use assert_cmd::Command;
use predicates::prelude::*;

fn letin_bin() -> Command {
    Command::cargo_bin("letin-run").expect("binary should build")
}

#[test]
fn help_output_mentions_usage() {
    letin_bin().arg("--help").assert().success().stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_output_mentions_the_crate_version() {
    letin_bin().arg("--version").assert().success().stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn missing_program_file_is_a_usage_error() {
    letin_bin().assert().failure();
}

#[test]
fn nonexistent_program_file_reports_an_error() {
    letin_bin().arg("does-not-exist.letin").assert().failure();
}
