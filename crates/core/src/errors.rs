use thiserror::Error;

use crate::flows::FlowTransitionError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TurnError {
    #[error("intent with name `{intent_name}` is not supported")]
    UnsupportedIntent { intent_name: String },
    #[error("malformed turn payload: {0}")]
    MalformedTurn(String),
    #[error(transparent)]
    FlowTransition(#[from] FlowTransitionError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("unsupported intent: {message}")]
    UnsupportedIntent { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "The turn payload could not be read. Check the request shape.",
            Self::UnsupportedIntent { .. } => "This bot cannot handle the requested intent.",
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "malformed_turn",
            Self::UnsupportedIntent { .. } => "unsupported_intent",
            Self::Internal { .. } => "internal",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::UnsupportedIntent { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl TurnError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::UnsupportedIntent { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<TurnError> for InterfaceError {
    fn from(value: TurnError) -> Self {
        let message = value.to_string();
        let correlation_id = "unassigned".to_owned();
        match value {
            TurnError::MalformedTurn(_) => Self::BadRequest { message, correlation_id },
            TurnError::UnsupportedIntent { .. } => Self::UnsupportedIntent { message, correlation_id },
            TurnError::FlowTransition(_) => Self::Internal { message, correlation_id },
        }
    }
}
