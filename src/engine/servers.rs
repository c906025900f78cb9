use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use super::error::SpeedTestError;

const BUILTIN_SERVERS: &str = include_str!("../../assets/servers.json");

/// A speed test endpoint pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub name: String,
    pub download_url: String,
    pub upload_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_url: Option<String>,
}

impl Server {
    /// URL probed for latency; falls back to the download URL.
    pub fn latency_target(&self) -> &str {
        self.latency_url.as_deref().unwrap_or(&self.download_url)
    }

    fn validate(&self) -> Result<(), SpeedTestError> {
        let urls = [Some(&self.download_url), Some(&self.upload_url), self.latency_url.as_ref()];
        for url in urls.into_iter().flatten() {
            let parsed = Url::parse(url).map_err(|e| SpeedTestError::InvalidServer {
                name: self.name.clone(),
                reason: format!("{url}: {e}"),
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(SpeedTestError::InvalidServer {
                    name: self.name.clone(),
                    reason: format!("{url}: unsupported scheme '{}'", parsed.scheme()),
                });
            }
        }
        Ok(())
    }
}

/// Ordered list of servers to test.
#[derive(Debug, Clone)]
pub struct ServerList {
    servers: Vec<Server>,
}

impl ServerList {
    pub fn new(servers: Vec<Server>) -> Result<Self, SpeedTestError> {
        if servers.is_empty() {
            return Err(SpeedTestError::NoServers("server list is empty".to_string()));
        }
        for server in &servers {
            server.validate()?;
        }
        Ok(Self { servers })
    }

    pub fn from_json(text: &str) -> Result<Self, SpeedTestError> {
        let servers: Vec<Server> = serde_json::from_str(text)?;
        Self::new(servers)
    }

    pub fn from_file(path: &Path) -> Result<Self, SpeedTestError> {
        debug!("Loading server list from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn builtin() -> Result<Self, SpeedTestError> {
        Self::from_json(BUILTIN_SERVERS)
    }

    /// Keep only servers whose name contains `name` (case-insensitive).
    pub fn filter(self, name: &str) -> Result<Self, SpeedTestError> {
        let needle = name.to_lowercase();
        let servers: Vec<Server> = self
            .servers
            .into_iter()
            .filter(|s| s.name.to_lowercase().contains(&needle))
            .collect();
        if servers.is_empty() {
            return Err(SpeedTestError::NoServers(format!(
                "no server matches '{name}'"
            )));
        }
        Ok(Self { servers })
    }

    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}
