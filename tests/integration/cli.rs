use assert_cmd::Command;
use predicates::prelude::*;

fn hostship() -> Command {
    let mut cmd = Command::cargo_bin("hostship").unwrap();
    cmd.env("HOSTSHIP_NO_PROGRESS", "1").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_version_query_prints_channel_and_version() {
    let expected = format!("{}\n", hostship::config::version_line());
    hostship().arg("-v").assert().success().stdout(expected.clone());
    hostship().arg("--version").assert().success().stdout(expected);
}

#[test]
fn test_version_line_ends_with_version() {
    let output = hostship().arg("-v").output().unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    let last = stdout.split_whitespace().last().unwrap();
    assert_eq!(last, hostship::config::current_version());
}

#[test]
fn test_no_command_prints_help() {
    hostship()
        .assert()
        .success()
        .stdout(predicate::str::contains("setup"))
        .stdout(predicate::str::contains("update"))
        .stdout(predicate::str::contains("hotreload").not());
}

#[test]
fn test_setup_rejects_two_urls() {
    hostship().args(["setup", "https://a.example", "https://b.example"]).assert().failure();
}

#[test]
fn test_logs_without_definition_fails() {
    let temp = tempfile::TempDir::new().unwrap();
    hostship()
        .current_dir(temp.path())
        .args(["logs", "web"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("compose.json"));
}

#[test]
fn test_logs_unknown_service() {
    let temp = tempfile::TempDir::new().unwrap();
    hostship::test_utils::StackFixture::new()
        .service("web", "nginx")
        .write_to(&temp.path().join("compose.json"));

    hostship()
        .current_dir(temp.path())
        .args(["logs", "db"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("service db not found"));
}
