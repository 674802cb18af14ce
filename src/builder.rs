//! # Builder Module
//!
//! Provides [`EngineConfig`] and [`EngineBuilder`], a fluent API for
//! constructing and configuring [`Engine`] instances.
//!
//! ## Overview
//!
//! The configuration is a typed structure with documented defaults:
//!
//! | Field          | Default | Meaning                                   |
//! |----------------|---------|-------------------------------------------|
//! | `max_requests` | `4`     | upper bound on concurrent fetches, `>= 1` |
//! | `log`          | `false` | report failed fetches through `tracing`   |
//! | `start_urls`   | `[]`    | seeds issued by [`Engine::run`]           |
//!
//! It can be deserialized from JSON (`maxRequests`, `log`, `startUrls`; the
//! legacy `startURLs` spelling is accepted too) and is validated when the
//! engine is built.
//!
//! ## Example
//!
//! ```rust,ignore
//! use spider_engine::EngineBuilder;
//!
//! let engine = EngineBuilder::new()
//!     .max_requests(8)
//!     .log(true)
//!     .start_url("https://example.com/")
//!     .build()?;
//! ```

use crate::crawler::Engine;
use crate::downloader::{Downloader, ReqwestDownloader};
use crate::error::SpiderError;
use crate::request::Seed;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::debug;

/// Default bound on concurrent fetches.
pub const DEFAULT_MAX_REQUESTS: usize = 4;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// The maximum number of concurrent fetches.
    pub max_requests: usize,
    /// Whether failed fetches are reported.
    pub log: bool,
    /// Seeds issued when the engine runs.
    #[serde(alias = "startURLs")]
    pub start_urls: Vec<Seed>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_requests: DEFAULT_MAX_REQUESTS,
            log: false,
            start_urls: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, SpiderError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn validate(&self) -> Result<(), SpiderError> {
        if self.max_requests == 0 {
            return Err(SpiderError::ConfigurationError(
                "max_requests must be greater than 0.".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fluent constructor for [`Engine`].
pub struct EngineBuilder {
    config: EngineConfig,
    downloader: Option<Arc<dyn Downloader>>,
    runtime: Option<Handle>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::from_config(EngineConfig::default())
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration.
    pub fn from_config(config: EngineConfig) -> Self {
        Self {
            config,
            downloader: None,
            runtime: None,
        }
    }

    /// Sets the maximum number of concurrent fetches.
    pub fn max_requests(mut self, limit: usize) -> Self {
        self.config.max_requests = limit;
        self
    }

    /// Enables or disables reporting of failed fetches.
    pub fn log(mut self, enabled: bool) -> Self {
        self.config.log = enabled;
        self
    }

    /// Adds a seed to the start list.
    pub fn start_url(mut self, seed: impl Into<Seed>) -> Self {
        self.config.start_urls.push(seed.into());
        self
    }

    /// Adds several seeds to the start list.
    pub fn start_urls<I, S>(mut self, seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Seed>,
    {
        self.config
            .start_urls
            .extend(seeds.into_iter().map(Into::into));
        self
    }

    /// Sets a custom downloader for the engine.
    pub fn downloader<D: Downloader>(mut self, downloader: D) -> Self {
        self.downloader = Some(Arc::new(downloader));
        self
    }

    /// Sets a downloader that the caller keeps a reference to.
    pub fn shared_downloader(mut self, downloader: Arc<dyn Downloader>) -> Self {
        self.downloader = Some(downloader);
        self
    }

    /// Sets the Tokio runtime request tasks are spawned on.
    ///
    /// Defaults to the runtime `build` is called from.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Validates the configuration and builds the engine.
    pub fn build(self) -> Result<Engine, SpiderError> {
        self.config.validate()?;

        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|e| {
                SpiderError::ConfigurationError(format!(
                    "Engine must be built inside a Tokio runtime or given one: {}",
                    e
                ))
            })?,
        };
        let downloader = self.downloader.unwrap_or_else(|| {
            debug!("No downloader configured, using ReqwestDownloader");
            Arc::new(ReqwestDownloader::default())
        });

        Ok(Engine::from_parts(self.config, downloader, runtime))
    }
}
