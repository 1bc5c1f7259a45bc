use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::Arg;
use clap::Command;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use crate::application::console::help_text;
use crate::configuration::Config;
use crate::configuration::ConfigKey;

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default().as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn arg_model() -> Arg {
    return Arg::new(ConfigKey::Model.to_string())
        .short('m')
        .long(ConfigKey::Model.to_string())
        .env("GEMSTONE_MODEL")
        .num_args(1)
        .help(format!(
            "The model to open a session for. [default: {}]",
            Config::default(ConfigKey::Model)
        ));
}

fn arg_server_host() -> Arg {
    return Arg::new(ConfigKey::ServerHost.to_string())
        .short('s')
        .long(ConfigKey::ServerHost.to_string())
        .env("GEMSTONE_SERVER_HOST")
        .num_args(1)
        .help(format!(
            "Gemstone server address as host:port. [default: {}]",
            Config::default(ConfigKey::ServerHost)
        ));
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") {
                return Paint::new(format!("CHAT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("gemstone-chat")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(
            Command::new("chat")
                .about("Start a new chat session.")
                .arg(arg_model())
                .arg(arg_server_host()),
        )
        .subcommand(subcommand_config())
        .subcommand(
            Command::new("log-path")
                .about("Output path to the debug log file written when running with RUST_LOG=gemstone")
                .hide(true),
        )
        .arg(arg_model())
        .arg(arg_server_host())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("GEMSTONE_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(
            Arg::new(ConfigKey::LogDir.to_string())
                .long(ConfigKey::LogDir.to_string())
                .env("GEMSTONE_LOG_DIR")
                .num_args(1)
                .help(format!("Directory for debug logs. [default: {}]", Config::default(ConfigKey::LogDir)))
                .global(true),
        );
}

/// Parses arguments and loads configuration. Returns `false` when a
/// subcommand has already done all the work and the chat should not start.
pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("chat", subcmd_matches)) => {
            Config::load(vec![&matches, subcmd_matches]).await?;
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default());
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        Some(("log-path", _)) => {
            Config::load(vec![&matches]).await?;
            let log_path = path::PathBuf::from(Config::get(ConfigKey::LogDir)).join("debug.log");
            println!("{}", log_path.to_string_lossy());
            return Ok(false);
        }
        _ => {
            Config::load(vec![&matches]).await?;
        }
    }

    return Ok(true);
}
