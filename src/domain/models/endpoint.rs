#[cfg(test)]
#[path = "endpoint_test.rs"]
mod tests;

use super::ChatError;

/// A `host:port` pair split out of the single configured server string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn parse(raw: &str) -> Result<Endpoint, ChatError> {
        let (host, port) = match raw.trim().split_once(':') {
            Some(parts) => parts,
            None => return Err(ChatError::Configuration(raw.to_string())),
        };

        if host.is_empty() {
            return Err(ChatError::Configuration(raw.to_string()));
        }

        let port = port
            .parse::<u16>()
            .map_err(|_| return ChatError::Configuration(raw.to_string()))?;

        return Ok(Endpoint {
            host: host.to_string(),
            port,
        });
    }
}
