//! Catalog sources for bookable movies and their show slots.
//!
//! The validator only talks to a catalog when a turn has no movie selected yet;
//! every query goes through [`fetch_with_policy`], which bounds it with a timeout
//! and a small retry budget.

pub mod http;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{CatalogConfig, CatalogSource};
use crate::domain::catalog::{CatalogEntry, CatalogOption};

pub use http::HttpCatalogProvider;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog source unavailable: {0}")]
    Unavailable(String),
    #[error("catalog query timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("catalog payload is invalid: {0}")]
    InvalidPayload(String),
}

#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, CatalogError>;
}

#[async_trait]
impl<P> CatalogProvider for Arc<P>
where
    P: CatalogProvider + ?Sized,
{
    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        (**self).fetch_catalog().await
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticCatalogProvider {
    entries: Vec<CatalogEntry>,
}

impl StaticCatalogProvider {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }
}

impl Default for StaticCatalogProvider {
    fn default() -> Self {
        Self::new(vec![
            CatalogEntry::new(
                "Mangal Mission",
                vec![CatalogOption::new("9am", "500"), CatalogOption::new("1pm", "700")],
            ),
            CatalogEntry::new(
                "WAR",
                vec![CatalogOption::new("10pm", "400"), CatalogOption::new("12pm", "600")],
            ),
        ])
    }
}

#[async_trait]
impl CatalogProvider for StaticCatalogProvider {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        Ok(self.entries.clone())
    }
}

/// Reads a JSON array of catalog entries from disk on every query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileCatalogProvider {
    path: PathBuf,
}

impl FileCatalogProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogProvider for FileCatalogProvider {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|error| {
            CatalogError::Unavailable(format!("could not read `{}`: {error}", self.path.display()))
        })?;
        serde_json::from_str(&raw).map_err(|error| CatalogError::InvalidPayload(error.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(5), max_retries: 1, base_delay_ms: 100, max_delay_ms: 1_000 }
    }
}

impl FetchPolicy {
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
            ..Self::default()
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

pub async fn fetch_with_policy<P>(
    provider: &P,
    policy: &FetchPolicy,
) -> Result<Vec<CatalogEntry>, CatalogError>
where
    P: CatalogProvider + ?Sized,
{
    let timeout_ms = u64::try_from(policy.timeout.as_millis()).unwrap_or(u64::MAX);
    let mut last_error = CatalogError::Unavailable("catalog was not queried".to_string());

    for attempt in 0..=policy.max_retries {
        let result = match tokio::time::timeout(policy.timeout, provider.fetch_catalog()).await {
            Ok(result) => result,
            Err(_) => Err(CatalogError::Timeout { timeout_ms }),
        };

        match result {
            Ok(entries) => {
                debug!(
                    event_name = "catalog.fetch.succeeded",
                    attempt,
                    entry_count = entries.len(),
                    "catalog fetched"
                );
                return Ok(entries);
            }
            Err(error) => {
                warn!(
                    event_name = "catalog.fetch.failed",
                    attempt,
                    max_retries = policy.max_retries,
                    error = %error,
                    "catalog query failed"
                );
                last_error = error;

                if attempt < policy.max_retries {
                    let delay = policy.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }

    Err(last_error)
}

pub fn build_provider(config: &CatalogConfig) -> Result<Arc<dyn CatalogProvider>, CatalogError> {
    match config.source {
        CatalogSource::Static => Ok(Arc::new(StaticCatalogProvider::default())),
        CatalogSource::File => {
            let path = config.path.clone().ok_or_else(|| {
                CatalogError::Unavailable("catalog.path is required for the file source".to_string())
            })?;
            Ok(Arc::new(FileCatalogProvider::new(path)))
        }
        CatalogSource::Http => {
            let url = config.url.clone().ok_or_else(|| {
                CatalogError::Unavailable("catalog.url is required for the http source".to_string())
            })?;
            let provider = HttpCatalogProvider::new(
                url,
                config.api_token.clone(),
                Duration::from_secs(config.timeout_secs),
            )?;
            Ok(Arc::new(provider))
        }
    }
}
