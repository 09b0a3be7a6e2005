#![forbid(unsafe_code)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const POLL: &str = "\
,11/03/2024,12/03/2024,13/03/2024,14/03/2024,15/03/2024,16/03/2024,17/03/2024
,matin,matin,matin,matin,matin,journée,journée
alice@example.com,Oui,Oui,Oui,Oui,Oui,Oui,Oui
bob@example.com,Oui,Oui,Oui,Oui,Oui,Oui,Oui
carol@example.com,Oui,Oui,Oui,Oui,Oui,Oui,Oui
";

fn cli(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("garde-cli").unwrap();
    cmd.current_dir(dir);
    cmd
}

#[test]
fn plan_then_check() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("poll.csv"), POLL).unwrap();

    cli(dir.path())
        .args(["plan", "--csv", "poll.csv", "--no-shuffle", "--out-csv", "plan.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("- Monday     2024-03-11: alice | bob"))
        .stdout(predicate::str::contains("* carol@example.com: 2 | 2"));

    for file in ["roster.json", "primary.json", "secondary.json", "plan.csv"] {
        assert!(dir.path().join(file).exists(), "{file} missing");
    }

    cli(dir.path())
        .args(["check", "--csv", "poll.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("OK: no conflicts"));

    // bob devient nouveau : ses gardes secondaires sont signalées
    cli(dir.path())
        .args([
            "check",
            "--csv",
            "poll.csv",
            "--newcomers",
            "bob@example.com",
            "--report",
            "conflicts.csv",
        ])
        .assert()
        .code(2);
    let report = fs::read_to_string(dir.path().join("conflicts.csv")).unwrap();
    assert!(report.starts_with("date,role,member,kind\n"));
    assert!(report.contains("secondary,bob@example.com,newcomer"));
}

#[test]
fn plan_failure_writes_nothing() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("poll.csv"),
        ",11/03/2024,12/03/2024\nalice@example.com,Oui,Oui\nbob@example.com,Non,Non\n",
    )
    .unwrap();

    cli(dir.path())
        .args(["plan", "--csv", "poll.csv", "--no-shuffle"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no eligible candidate for secondary on 2024-03-11"));
    assert!(!dir.path().join("roster.json").exists());
    assert!(!dir.path().join("primary.json").exists());
}

#[test]
fn stats_and_default_config() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("poll.csv"),
        ",15/03/2024,16/03/2024,17/03/2024\nalice@example.com,Non,Non,Oui\n",
    )
    .unwrap();

    cli(dir.path())
        .args(["stats", "--csv", "poll.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "* alice@example.com: 1 weekday(s) | 1 week-end day(s)",
        ));

    cli(dir.path())
        .args(["default-config", "--out", "options.json"])
        .assert()
        .success();
    let options = garde::load_options_from_file(dir.path().join("options.json")).unwrap();
    assert_eq!(options, garde::EngineOptions::default());
}

#[test]
fn seeded_shuffle_is_reproducible() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("poll.csv"), POLL).unwrap();

    let run = |out: &str| {
        cli(dir.path())
            .args(["--roster", out, "plan", "--csv", "poll.csv", "--seed", "7"])
            .assert()
            .success();
        fs::read_to_string(dir.path().join(out)).unwrap()
    };
    assert_eq!(run("first.json"), run("second.json"));
}
