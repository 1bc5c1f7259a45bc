use std::env;

use anyhow::Result;
use tokio::fs;

use super::Config;
use super::ConfigKey;
use crate::application::cli;

#[test]
fn it_serializes_to_valid_toml() -> Result<()> {
    let res = Config::serialize_default();
    let doc = res.parse::<toml_edit::Document>()?;

    assert_eq!(doc["server-host"].as_str(), Some("localhost:8000"));
    assert_eq!(doc["model"].as_str(), Some("qwen3"));
    assert!(doc.get("config-file").is_none());

    return Ok(());
}

// Config is process wide, so file loading and flag precedence share one test.
#[tokio::test]
async fn it_layers_file_then_flags() -> Result<()> {
    let config_path = env::temp_dir().join(format!("gemstone-config-{}.toml", std::process::id()));
    fs::write(
        &config_path,
        "server-host = \"10.0.0.2:9000\"\nmodel = \"llama3\"\n",
    )
    .await?;
    let config_file = config_path.to_string_lossy().to_string();

    let matches = cli::build().try_get_matches_from(vec!["gemstone-chat", "-c", config_file.as_str()])?;
    Config::load(vec![&matches]).await?;
    assert_eq!(Config::get(ConfigKey::ServerHost), "10.0.0.2:9000");
    assert_eq!(Config::get(ConfigKey::Model), "llama3");

    let matches = cli::build().try_get_matches_from(vec![
        "gemstone-chat",
        "-c",
        config_file.as_str(),
        "--model",
        "qwen3",
    ])?;
    Config::load(vec![&matches]).await?;
    assert_eq!(Config::get(ConfigKey::ServerHost), "10.0.0.2:9000");
    assert_eq!(Config::get(ConfigKey::Model), "qwen3");

    fs::write(&config_path, "server-host = 8000\n").await?;
    let matches = cli::build().try_get_matches_from(vec!["gemstone-chat", "-c", config_file.as_str()])?;
    assert!(Config::load(vec![&matches]).await.is_err());

    fs::remove_file(&config_path).await?;

    return Ok(());
}
