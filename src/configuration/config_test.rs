use anyhow::Result;

use super::Config;
use super::ConfigKey;
use crate::application::cli;

#[test]
fn it_serializes_to_valid_toml() -> Result<()> {
    let res = Config::serialize_default(cli::build());
    let doc = res.parse::<toml_edit::Document>()?;

    assert_eq!(doc.get("backend").and_then(|e| return e.as_str()), Some("helpdesk"));
    assert_eq!(doc.get("poll-interval").and_then(|e| return e.as_integer()), Some(3000));
    assert_eq!(doc.get("request-timeout").and_then(|e| return e.as_integer()), Some(0));
    assert!(doc.get("config-file").is_none());
    assert!(doc.get("state-file").is_none());
    assert!(res.contains("[possible values: helpdesk, simulated]"));
    assert!(res.contains("# recorder-file = \"\""));

    return Ok(());
}

#[test]
fn it_uses_kebab_case_keys() {
    assert_eq!(ConfigKey::BaseURL.to_string(), "base-url");
    assert_eq!(
        ConfigKey::BackendHealthCheckTimeout.to_string(),
        "backend-health-check-timeout"
    );
    assert_eq!(Config::default(ConfigKey::UploadsPath), "/static/uploads/");
}

#[tokio::test]
async fn it_loads_config_from_file() -> Result<()> {
    let matches =
        cli::build().try_get_matches_from(vec!["chatdesk", "-c", "./config.example.toml"])?;
    Config::load(cli::build(), vec![&matches]).await?;
    return Ok(());
}

#[tokio::test]
async fn it_fails_to_loads_config_from_file() -> Result<()> {
    let matches =
        cli::build().try_get_matches_from(vec!["chatdesk", "-c", "./test/bad-config.toml"])?;
    let res = Config::load(cli::build(), vec![&matches]).await;
    assert!(res.is_err());
    return Ok(());
}
