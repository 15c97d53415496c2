use std::error::Error;
use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn cli() -> Result<Command, Box<dyn Error>> {
    Ok(Command::cargo_bin("letterpage-cli")?)
}

#[test]
fn config_export_import_roundtrip() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;
    let export_path = workspace.path().join("exported").join("settings.json");

    cli()?
        .args([
            "--workspace",
            workspace.path().to_str().unwrap(),
            "config",
            "export",
            "--output",
            export_path.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported settings"));

    let exported = fs::read_to_string(&export_path)?;
    assert!(exported.contains("\"zoom_percent\": 125"));

    let edited = exported.replace("\"store_name\": \"\"", "\"store_name\": \"Corner Shop\"");
    fs::write(&export_path, edited)?;

    cli()?
        .args([
            "--workspace",
            workspace.path().to_str().unwrap(),
            "config",
            "import",
            export_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    let stored = workspace.path().join(".letterpage").join("settings.json");
    let contents = fs::read_to_string(stored)?;
    assert!(contents.contains("Corner Shop"));
    Ok(())
}

#[test]
fn config_import_missing_file_fails() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;
    cli()?
        .args([
            "--workspace",
            workspace.path().to_str().unwrap(),
            "config",
            "import",
            "does-not-exist.json",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
    Ok(())
}

fn enabled_config(dir: &std::path::Path) -> Result<String, Box<dyn Error>> {
    let config = dir.join("settings.json");
    fs::write(&config, r#"{ "login": { "app_id": "1234" } }"#)?;
    Ok(config.to_str().unwrap().to_string())
}

#[test]
fn login_with_token_posts_exchange_form() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;
    let config = enabled_config(workspace.path())?;

    cli()?
        .args(["--config", &config, "login", "--token", "EAAB"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/customer/login/facebook/"))
        .stdout(predicate::str::contains("\"access_token\":\"EAAB\""))
        .stdout(predicate::str::contains("Login state: success"));
    Ok(())
}

#[test]
fn declined_login_is_reported() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;
    let config = enabled_config(workspace.path())?;

    cli()?
        .args(["--config", &config, "login", "--decline"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("login canceled by the user"));
    Ok(())
}

#[test]
fn login_without_app_id_is_refused() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;
    cli()?
        .args([
            "--workspace",
            workspace.path().to_str().unwrap(),
            "login",
            "--token",
            "EAAB",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not configured"));
    Ok(())
}

#[test]
fn sdk_load_failure_is_reported() -> Result<(), Box<dyn Error>> {
    let workspace = tempdir()?;
    let config = enabled_config(workspace.path())?;

    cli()?
        .args(["--config", &config, "login", "--sdk-error", "script blocked"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "provider reported an error: script blocked",
        ));
    Ok(())
}
