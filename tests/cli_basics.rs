use assert_cmd::cargo; // handy crate for testing CLIs
use predicates::prelude::*;
use std::path::Path;

fn prbot(config: &Path) -> assert_cmd::Command {
    let mut cmd = cargo::cargo_bin_cmd!();
    cmd.env("PRBOT_CONFIG", config)
        .env_remove("PRBOT_PROVIDER")
        .env_remove("PRBOT_MODEL")
        .env_remove("PRBOT_API_KEY");
    cmd
}

#[test]
fn prints_help() {
    let mut cmd = cargo::cargo_bin_cmd!();

    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains("Usage"));
}

#[test]
fn prints_version() {
    let mut cmd = cargo::cargo_bin_cmd!();

    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicates::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn lists_providers() {
    let dir = tempfile::tempdir().unwrap();

    prbot(&dir.path().join("prbot.toml"))
        .arg("providers")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("openai")
                .and(predicate::str::contains("deepseek"))
                .and(predicate::str::contains("groq"))
                .and(predicate::str::contains("openrouter"))
                .and(predicate::str::contains("gemini"))
                .and(predicate::str::contains("GEMINI_API_KEY")),
        );
}

#[test]
fn rejects_unknown_provider_before_doing_any_work() {
    let dir = tempfile::tempdir().unwrap();

    prbot(&dir.path().join("prbot.toml"))
        .args(["--provider", "nonexistent", "--api-key", "k", "--dry-run"])
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown provider 'nonexistent'"));
}

#[test]
fn config_set_then_show_masks_key() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("prbot.toml");

    prbot(&config)
        .args(["config", "set", "--provider", "gemini", "--api-key", "abcdefghijklmnop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved configuration"));

    prbot(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("provider = \"gemini\"")
                .and(predicate::str::contains("abcd****"))
                .and(predicate::str::contains("abcdefghijklmnop").not()),
        );
}

#[test]
fn config_set_rejects_unknown_provider() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("prbot.toml");

    prbot(&config)
        .args(["config", "set", "--provider", "bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown provider 'bogus'"));

    assert!(!config.exists());
}

#[test]
fn config_path_honours_override() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("custom.toml");

    prbot(&config)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn config_set_stores_key_under_env_provider() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("prbot.toml");

    prbot(&config)
        .env("PRBOT_PROVIDER", "gemini")
        .args(["config", "set", "--api-key", "abcdefghijklmnop"])
        .assert()
        .success();

    prbot(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("gemini = \"abcd****\"")
                .and(predicate::str::contains("openai").not()),
        );
}
