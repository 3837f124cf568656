use assert_cmd::Command;
use predicates::prelude::*;

fn write_config(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let db_path = dir.path().join("roundlord.db");
    let toml = format!(
        concat!(
            "database = \"{}\"\n",
            "\n",
            "[feed]\n",
            "status_url = \"https://market.example.com/status\"\n",
            "\n",
            "[[tenants]]\n",
            "id = \"league-1\"\n",
            "name = \"Premier\"\n",
        ),
        db_path.display()
    );
    let path = dir.path().join("config.toml");
    std::fs::write(&path, toml).expect("write temp config");
    path
}

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("roundlord")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("consolidate"));
}

#[test]
fn missing_config_is_a_nonzero_exit() {
    Command::cargo_bin("roundlord")
        .unwrap()
        .args(["status", "--config", "/nonexistent/config.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn invalid_feed_url_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[feed]\nstatus_url = \"not a url\"\n").unwrap();

    Command::cargo_bin("roundlord")
        .unwrap()
        .arg("status")
        .arg("--config")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("status_url"));
}

#[test]
fn status_creates_the_database_and_reports_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir);

    Command::cargo_bin("roundlord")
        .unwrap()
        .arg("status")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("roundlord v"))
        .stdout(predicate::str::contains("awaiting"))
        .stdout(predicate::str::contains("No manager activity"));
}
