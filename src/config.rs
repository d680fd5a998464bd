//! Provider/pipeline configuration.
//!
//! Resolution order: `$EVENTS_CONFIG_PATH`, then `config/providers.toml`,
//! then built-in defaults. API keys can always be supplied (or overridden)
//! through the environment, which is how deployments are expected to inject
//! them.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::providers::{
    predicthq::PredicthqProvider, rapidapi::RapidapiProvider, ticketmaster::TicketmasterProvider,
    EventProvider,
};

pub const ENV_CONFIG_PATH: &str = "EVENTS_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/providers.toml";

const ENV_TICKETMASTER_KEY: &str = "TICKETMASTER_API_KEY";
const ENV_PREDICTHQ_TOKEN: &str = "PREDICTHQ_TOKEN";
const ENV_RAPIDAPI_KEY: &str = "RAPIDAPI_KEY";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// One retry with short backoff per failed provider call.
    pub retry: bool,
    pub cache_ttl_secs: u64,
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub ticketmaster: ProviderConfig,
    pub predicthq: ProviderConfig,
    pub rapidapi: ProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub enabled: bool,
    pub base_url: String,
    pub api_key: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry: true,
            cache_ttl_secs: 300,
            rate_limit_max: 60,
            rate_limit_window_secs: 60,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: String::new(),
            api_key: String::new(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            ticketmaster: ProviderConfig {
                base_url: "https://app.ticketmaster.com/discovery/v2".into(),
                ..Default::default()
            },
            predicthq: ProviderConfig {
                base_url: "https://api.predicthq.com/v1".into(),
                ..Default::default()
            },
            rapidapi: ProviderConfig {
                base_url: "https://real-time-events-search.p.rapidapi.com".into(),
                ..Default::default()
            },
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            providers: ProvidersConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: AppConfig = toml::from_str(s).context("parsing providers config")?;
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Env path → default path → built-in defaults (with env key overrides).
    pub fn load_default() -> Self {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        match Self::from_path(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(error = ?e, path = %path.display(), "using built-in config defaults");
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        for (env, slot) in [
            (ENV_TICKETMASTER_KEY, &mut self.providers.ticketmaster),
            (ENV_PREDICTHQ_TOKEN, &mut self.providers.predicthq),
            (ENV_RAPIDAPI_KEY, &mut self.providers.rapidapi),
        ] {
            if let Ok(v) = std::env::var(env) {
                if !v.trim().is_empty() {
                    slot.api_key = v.trim().to_string();
                }
            }
        }
    }

    /// Instantiate every enabled provider that has credentials.
    pub fn build_providers(&self) -> Vec<Arc<dyn EventProvider>> {
        let mut out: Vec<Arc<dyn EventProvider>> = Vec::new();
        let p = &self.providers;
        if p.ticketmaster.enabled && !p.ticketmaster.api_key.is_empty() {
            out.push(Arc::new(TicketmasterProvider::from_config(
                p.ticketmaster.base_url.clone(),
                p.ticketmaster.api_key.clone(),
            )));
        }
        if p.predicthq.enabled && !p.predicthq.api_key.is_empty() {
            out.push(Arc::new(PredicthqProvider::from_config(
                p.predicthq.base_url.clone(),
                &p.predicthq.api_key,
            )));
        }
        if p.rapidapi.enabled && !p.rapidapi.api_key.is_empty() {
            out.push(Arc::new(RapidapiProvider::from_config(
                p.rapidapi.base_url.clone(),
                &p.rapidapi.api_key,
            )));
        }
        out
    }
}
