use std::collections::HashMap;
use std::path::Path;

use anyhow::Context as _;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::app::domain::{DEFAULT_DOMAIN, normalize_domain};
use crate::config::RawSourceConfig;
use crate::gallery::SOURCE_MODE;

/// Per-domain settings as stored by the admin side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainConfig {
    #[serde(default)]
    pub gallery_data_mode: String,
    #[serde(default)]
    pub imgbed: RawSourceConfig,
}

impl DomainConfig {
    pub fn imgbed_enabled(&self) -> bool {
        self.gallery_data_mode == SOURCE_MODE
    }
}

#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Config for `domain`, else the `default` entry, else an empty config.
    async fn get(&self, domain: &str) -> anyhow::Result<DomainConfig>;
}

/// Read-only domain map loaded once at startup.
#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    domains: HashMap<String, DomainConfig>,
}

impl InMemoryConfigStore {
    pub fn new(domains: HashMap<String, DomainConfig>) -> Self {
        let domains = domains
            .into_iter()
            .map(|(domain, config)| (normalize_domain(&domain), config))
            .collect();
        Self { domains }
    }

    /// Loads a `domain -> DomainConfig` map from JSON, or YAML when the
    /// extension is `.yaml`/`.yml`.
    pub async fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .await
            .with_context(|| format!("read config store: {}", path.display()))?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        let domains: HashMap<String, DomainConfig> = if is_yaml {
            serde_yaml::from_str(&text)
                .with_context(|| format!("parse yaml config store: {}", path.display()))?
        } else {
            serde_json::from_str(&text)
                .with_context(|| format!("parse json config store: {}", path.display()))?
        };
        tracing::info!(path = %path.display(), domains = domains.len(), "loaded domain config");
        Ok(Self::new(domains))
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn get(&self, domain: &str) -> anyhow::Result<DomainConfig> {
        let config = self
            .domains
            .get(domain)
            .or_else(|| self.domains.get(DEFAULT_DOMAIN))
            .cloned()
            .unwrap_or_default();
        Ok(config)
    }
}
