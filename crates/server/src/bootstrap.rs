use std::sync::Arc;

use boxoffice_core::audit::TracingAuditSink;
use boxoffice_core::booking::TurnDispatcher;
use boxoffice_core::catalog::{build_provider, CatalogError, CatalogProvider};
use boxoffice_core::config::{AppConfig, ConfigError};
use thiserror::Error;
use tracing::info;

pub type ServerDispatcher = TurnDispatcher<Arc<dyn CatalogProvider>, TracingAuditSink>;

pub struct Application {
    pub config: AppConfig,
    pub catalog: Arc<dyn CatalogProvider>,
    pub dispatcher: Arc<ServerDispatcher>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("catalog provider setup failed: {0}")]
    Catalog(#[from] CatalogError),
}

pub fn bootstrap(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        catalog_source = ?config.catalog.source,
        intent_name = %config.booking.intent_name,
        "starting application bootstrap"
    );

    config.validate()?;
    let catalog = build_provider(&config.catalog)?;
    let dispatcher = TurnDispatcher::from_config(&config, catalog.clone(), TracingAuditSink);

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        fulfillment = ?config.booking.fulfillment,
        timezone = ?config.booking.timezone,
        utc_offset_minutes = config.booking.utc_offset_minutes,
        "turn dispatcher ready"
    );

    Ok(Application { config, catalog, dispatcher: Arc::new(dispatcher) })
}
