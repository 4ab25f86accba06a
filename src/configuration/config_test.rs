use anyhow::Result;

use super::parse_bool;
use super::parse_u64;
use super::Config;
use super::ConfigKey;
use crate::application::cli;

#[test]
fn it_names_keys_in_kebab_case() {
    assert_eq!(ConfigKey::OpenAiURL.to_string(), "openai-url");
    assert_eq!(ConfigKey::MaxDuration.to_string(), "max-duration");
    assert_eq!(ConfigKey::ValidateModel.to_string(), "validate-model");
    assert_eq!(ConfigKey::ServerURL.to_string(), "server-url");
}

#[test]
fn it_has_relay_defaults() {
    assert_eq!(Config::default(ConfigKey::MaxDuration), "30");
    assert_eq!(Config::default(ConfigKey::Model), "google/gemini-3-flash");
    assert_eq!(Config::default(ConfigKey::ChatModel), "google/gemini-1.5-flash");
    assert_eq!(Config::default(ConfigKey::Provider), "openai");
    assert_eq!(Config::default(ConfigKey::ValidateModel), "false");
    assert!(Config::default(ConfigKey::ConfigFile).ends_with("config.toml"));
}

#[test]
fn it_serializes_to_valid_toml() {
    let res = Config::serialize_default(cli::build());
    let toml_res = res.parse::<toml_edit::Document>();
    assert!(toml_res.is_ok());

    assert!(res.contains("max-duration = 30"));
    assert!(res.contains("validate-model = false"));
    assert!(res.contains("provider = \"openai\""));
    assert!(res.contains("# openai-token = \"\""));
    assert!(!res.contains("config-file"));
}

#[tokio::test]
async fn it_loads_config_from_file() -> Result<()> {
    let matches =
        cli::build().try_get_matches_from(vec!["streamchat", "-c", "./config.example.toml"])?;
    Config::load(cli::build(), vec![&matches]).await?;
    return Ok(());
}

#[tokio::test]
async fn it_fails_to_loads_config_from_file() -> Result<()> {
    let matches =
        cli::build().try_get_matches_from(vec!["streamchat", "-c", "./test/bad-config.toml"])?;
    let res = Config::load(cli::build(), vec![&matches]).await;
    assert!(res.is_err());
    return Ok(());
}

#[test]
fn it_parses_numbers_and_flags() {
    assert_eq!(parse_u64(ConfigKey::HealthCheckTimeout, "1500").unwrap(), 1500);
    assert!(parse_u64(ConfigKey::HealthCheckTimeout, "soon").is_err());
    assert!(parse_u64(ConfigKey::MaxDuration, "-1").is_err());

    assert!(parse_bool("TRUE"));
    assert!(parse_bool("1"));
    assert!(!parse_bool("false"));
    assert!(!parse_bool(""));
}
