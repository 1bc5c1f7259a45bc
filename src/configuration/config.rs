#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::env;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::IntoEnumIterator;
use tokio::fs;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumIter, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    ConfigFile,
    LogDir,
    Model,
    ServerHost,
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    fn base_dir(dir: Option<path::PathBuf>) -> path::PathBuf {
        return dir
            .unwrap_or_else(|| return env::temp_dir())
            .join("gemstone");
    }

    pub fn default(key: ConfigKey) -> String {
        let res = match key {
            ConfigKey::ConfigFile => Config::base_dir(dirs::config_dir())
                .join("config.toml")
                .to_string_lossy()
                .to_string(),
            ConfigKey::LogDir => Config::base_dir(dirs::cache_dir())
                .to_string_lossy()
                .to_string(),
            ConfigKey::Model => "qwen3".to_string(),
            ConfigKey::ServerHost => "localhost:8000".to_string(),
        };

        return res;
    }

    /// Layers defaults, then `config.toml`, then CLI flags and environment.
    pub async fn load(clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key))
        }

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }

        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            let doc = toml_str.parse::<toml_edit::Document>()?;

            for key in ConfigKey::iter() {
                if key == ConfigKey::ConfigFile {
                    continue;
                }

                if let Some(val) = doc.get(&key.to_string()) {
                    if let Some(val_str) = val.as_str() {
                        if val_str.trim().is_empty() {
                            continue;
                        }
                        Config::set(key, val_str.trim());
                    } else {
                        bail!(format!(
                            "config.toml has an invalid value for key '{key}', expected a string"
                        ));
                    }
                }
            }
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    Config::set(key, val)
                }
            }
        }

        tracing::debug!(
            server_host = %Config::get(ConfigKey::ServerHost),
            model = %Config::get(ConfigKey::Model),
            "config"
        );

        return Ok(());
    }

    pub fn serialize_default() -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                let description = match key {
                    ConfigKey::ConfigFile => return None,
                    ConfigKey::LogDir => "Directory debug logs are written to when RUST_LOG includes gemstone.",
                    ConfigKey::Model => "Model a session is created for at startup.",
                    ConfigKey::ServerHost => "Gemstone server address as host:port.",
                };

                return Some(format!(
                    "# {description}\n{key} = '{}'",
                    Config::default(key)
                ));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
