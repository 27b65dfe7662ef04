use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use boxoffice_core::audit::{
    new_correlation_id, AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink,
    TracingAuditSink,
};
use boxoffice_core::booking::parse_turn_payload;
use boxoffice_core::domain::response::TurnResponse;
use boxoffice_core::errors::{InterfaceError, TurnError};
use serde::Serialize;
use tracing::{error, warn};

use crate::bootstrap::ServerDispatcher;

#[derive(Clone)]
pub struct TurnState {
    dispatcher: Arc<ServerDispatcher>,
}

impl TurnState {
    pub fn new(dispatcher: Arc<ServerDispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: &'static str,
    pub correlation_id: String,
}

/// Failure answer for a turn; never carries a dialog action.
#[derive(Debug)]
pub struct TurnFailure(pub InterfaceError);

impl TurnFailure {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::UnsupportedIntent { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.0.error_class(),
            message: self.0.user_message(),
            correlation_id: self.0.correlation_id().to_string(),
        }
    }
}

impl IntoResponse for TurnFailure {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

pub fn router(state: TurnState) -> Router {
    Router::new().route("/turn", post(handle_turn)).with_state(state)
}

pub async fn handle_turn(
    State(state): State<TurnState>,
    body: Bytes,
) -> Result<Json<TurnResponse>, TurnFailure> {
    let correlation_id = new_correlation_id();

    let request = match parse_turn_payload(&body) {
        Ok(request) => request,
        Err(turn_error) => {
            warn!(
                event_name = "turn.malformed",
                correlation_id = %correlation_id,
                error = %turn_error,
                "turn payload rejected"
            );
            let context = AuditContext::new(None, correlation_id.as_str(), "turn-endpoint");
            TracingAuditSink.emit(
                AuditEvent::new(
                    &context,
                    "turn.malformed",
                    AuditCategory::Ingress,
                    AuditOutcome::Rejected,
                )
                .with_metadata("body_bytes", body.len().to_string()),
            );
            return Err(TurnFailure(turn_error.into_interface(correlation_id)));
        }
    };

    match state.dispatcher.dispatch(request, &correlation_id).await {
        Ok(response) => Ok(Json(response)),
        Err(turn_error) => {
            if let TurnError::FlowTransition(_) = &turn_error {
                error!(
                    event_name = "turn.internal_error",
                    correlation_id = %correlation_id,
                    error = %turn_error,
                    "turn dispatch failed"
                );
            }
            Err(TurnFailure(turn_error.into_interface(correlation_id)))
        }
    }
}
