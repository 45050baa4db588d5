use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::ENS_GRAPH_URL;
use crate::resolver::{GraphClient, ResolverStrategy, RpcClient};

/// Default config file path.
pub const CONFIG_PATH: &str = "config.toml";

/// Top-level application config deserialized from `config.toml`. Every field
/// is optional; a missing file yields the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Twitter API v2 bearer token. Without it requests rely on the search
    /// proxy's shared application credential.
    pub bearer: Option<String>,
    /// Base URL of the recent-search endpoint.
    pub search_base: Option<String>,
    /// Name-resolution endpoint. Absent means name candidates are rejected.
    pub resolver: Option<ResolverConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    pub mode: ResolverMode,
    /// Endpoint URL. Defaults to the public ENS subgraph in `graph` mode;
    /// required in `rpc` mode.
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverMode {
    Graph,
    Rpc,
}

impl AppConfig {
    /// Load config from the given TOML file path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Load config, falling back to defaults when the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Pick the resolution strategy once, from the configured endpoint.
    pub fn resolver_strategy(&self) -> Result<ResolverStrategy> {
        match &self.resolver {
            None => Ok(ResolverStrategy::Disabled),
            Some(cfg) => match cfg.mode {
                ResolverMode::Graph => {
                    let endpoint = cfg.endpoint.clone().unwrap_or_else(|| ENS_GRAPH_URL.to_string());
                    Ok(ResolverStrategy::BatchIndexer(GraphClient::new(endpoint)))
                }
                ResolverMode::Rpc => {
                    let endpoint = cfg
                        .endpoint
                        .clone()
                        .context("resolver.endpoint is required when resolver.mode = \"rpc\"")?;
                    Ok(ResolverStrategy::DirectRpc(RpcClient::new(endpoint)))
                }
            },
        }
    }
}

/// Extract the conversation id from a full status URL or a bare id: the
/// trailing run of digits of the last path segment.
pub fn conversation_id_from(input: &str) -> Result<String> {
    let trimmed = input.trim();
    let segment = if trimmed.contains("://") {
        let url = Url::parse(trimmed).with_context(|| format!("invalid thread url {trimmed:?}"))?;
        url.path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string))
            .unwrap_or_default()
    } else {
        trimmed.to_string()
    };

    let digits: String = segment
        .chars()
        .rev()
        .take_while(char::is_ascii_digit)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    anyhow::ensure!(
        !digits.is_empty(),
        "no conversation id found in {trimmed:?} (expected trailing digits)"
    );
    Ok(digits)
}
