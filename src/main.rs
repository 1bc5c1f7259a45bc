#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::process;
use std::sync::Arc;

use anyhow::Error;
use yansi::Paint;

use crate::application::cli;
use crate::application::console;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::services::ChatClient;
use crate::infrastructure::transports::HttpTransportFactory;

fn handle_error(err: Error) {
    eprintln!(
        "{}",
        Paint::red(format!(
            "Oh no! Gemstone Chat has failed with the following app version and error.\n\nVersion: {}\nError: {}",
            env!("CARGO_PKG_VERSION"),
            err
        ))
    );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

#[tokio::main]
async fn main() {
    match cli::parse().await {
        Ok(true) => {}
        Ok(false) => process::exit(0),
        Err(err) => {
            handle_error(err);
            return;
        }
    }

    let file_appender =
        tracing_appender::rolling::never(Config::get(ConfigKey::LogDir), "debug.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("gemstone")
    {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
    }

    let client = ChatClient::new(
        &Config::get(ConfigKey::ServerHost),
        Arc::new(HttpTransportFactory::default()),
    );

    if let Err(err) = console::start(client, &Config::get(ConfigKey::Model)).await {
        handle_error(err);
    }

    process::exit(0);
}
