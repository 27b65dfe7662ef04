use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use boxoffice_core::catalog::{fetch_with_policy, CatalogProvider, FetchPolicy};
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

#[derive(Clone)]
pub struct HealthState {
    catalog: Arc<dyn CatalogProvider>,
    fetch_policy: FetchPolicy,
}

impl HealthState {
    /// The probe queries the catalog exactly once.
    pub fn new(catalog: Arc<dyn CatalogProvider>, fetch_policy: FetchPolicy) -> Self {
        Self { catalog, fetch_policy: FetchPolicy { max_retries: 0, ..fetch_policy } }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub catalog: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let catalog = catalog_check(&state).await;
    let ready = catalog.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "boxoffice-server runtime initialized".to_string(),
        },
        catalog,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn catalog_check(state: &HealthState) -> HealthCheck {
    match fetch_with_policy(&*state.catalog, &state.fetch_policy).await {
        Ok(entries) => HealthCheck {
            status: "ready",
            detail: format!("catalog returned {} movies", entries.len()),
        },
        Err(error) => {
            warn!(
                event_name = "system.health.catalog_degraded",
                correlation_id = "health",
                error = %error,
                "catalog check failed"
            );
            HealthCheck { status: "degraded", detail: format!("catalog query failed: {error}") }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{extract::State, http::StatusCode, Json};
    use boxoffice_core::catalog::{
        CatalogError, CatalogProvider, FetchPolicy, StaticCatalogProvider,
    };
    use boxoffice_core::domain::catalog::CatalogEntry;

    use crate::health::{health, HealthState};

    struct OfflineCatalog;

    #[async_trait]
    impl CatalogProvider for OfflineCatalog {
        async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
            Err(CatalogError::Unavailable("connection refused".to_string()))
        }
    }

    fn quick_policy() -> FetchPolicy {
        FetchPolicy { timeout: Duration::from_millis(100), ..FetchPolicy::default() }
    }

    #[tokio::test]
    async fn health_returns_ready_when_catalog_answers() {
        let state = HealthState::new(Arc::new(StaticCatalogProvider::default()), quick_policy());

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.catalog.status, "ready");
        assert_eq!(payload.catalog.detail, "catalog returned 2 movies");
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_catalog_is_down() {
        let state = HealthState::new(Arc::new(OfflineCatalog), quick_policy());

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.catalog.status, "degraded");
        assert!(payload.catalog.detail.contains("connection refused"));
        assert_eq!(payload.service.status, "ready");
    }
}
