use assert_cmd::Command;
use std::path::Path;
use tempfile::tempdir;

// Drives the non-interactive subcommands of the binary against a scratch database.

fn wordgame(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("wordgame").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "command failed: {output:?}");
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn add_then_list() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("words.db");

    let added = stdout_of(
        wordgame(dir.path())
            .arg("--db")
            .arg(&db)
            .args(["add", "pear", "apple", " "]),
    );
    assert!(added.contains("added pear"));
    assert!(added.contains("added apple"));
    assert!(added.contains("skipped"));

    let listed = stdout_of(wordgame(dir.path()).arg("--db").arg(&db).arg("list"));
    let lines: Vec<&str> = listed.lines().collect();
    assert_eq!(lines[0], "Total words: 2   Seen: 0   Left: 2");
    assert_eq!(lines[1], "[ ] pear");
    assert_eq!(lines[2], "[ ] apple");

    let alpha = stdout_of(
        wordgame(dir.path())
            .arg("--db")
            .arg(&db)
            .args(["list", "--sort", "alpha"]),
    );
    assert_eq!(alpha.lines().nth(1), Some("[ ] apple"));
}

#[test]
fn add_requires_a_word() {
    let dir = tempdir().unwrap();
    wordgame(dir.path()).arg("add").assert().failure();
}

#[test]
fn rejects_round_longer_than_a_minute() {
    let dir = tempdir().unwrap();
    wordgame(dir.path())
        .args(["--secs", "90", "list"])
        .assert()
        .failure();
}

#[test]
fn default_database_lives_under_home() {
    let dir = tempdir().unwrap();
    stdout_of(wordgame(dir.path()).args(["add", "cat"]));
    assert!(dir
        .path()
        .join(".local")
        .join("state")
        .join("wordgame")
        .join("words.db")
        .exists());
}
