use assert_cmd::Command;
use predicates::str::contains;

/// Points the binary at a port nothing listens on so every connection
/// profile fails fast with a refused TCP connect.
fn unreachable_ingest_cmd() -> Command {
    let mut cmd = Command::cargo_bin("csv-ingest").expect("binary exists");
    cmd.env("AZURE_SQL_SERVER", "127.0.0.1")
        .env("AZURE_SQL_PORT", "1")
        .env("AZURE_SQL_CONNECT_TIMEOUT_SECS", "2");
    cmd
}

#[test]
fn unreachable_server_tries_every_profile_then_fails() {
    unreachable_ingest_cmd()
        .assert()
        .failure()
        .stdout(contains("Trying connection profile: encrypt-verify"))
        .stdout(contains("Trying connection profile: encrypt-trust"))
        .stdout(contains("Connection profile failed: encrypt-verify"))
        .stderr(contains("No connection profile succeeded"))
        .stderr(contains("Last error"));
}

#[test]
fn invalid_port_override_is_a_configuration_error() {
    Command::cargo_bin("csv-ingest")
        .expect("binary exists")
        .env("AZURE_SQL_PORT", "not-a-port")
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn version_flag_reports_package_version() {
    Command::cargo_bin("csv-ingest")
        .expect("binary exists")
        .arg("--version")
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}
