use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowType {
    MovieBooking,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowState {
    Collecting,
    Fulfilled,
    UnsupportedIntent,
}

impl FlowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Fulfilled | Self::UnsupportedIntent)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowEvent {
    SlotViolated { slot: String },
    SlotsValidated,
    FulfillmentDeferred,
    IntentRejected { intent_name: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowAction {
    ElicitSlot { slot: String },
    Delegate,
    CloseFulfilled,
    FailTurn,
}

impl FlowAction {
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::ElicitSlot { .. } => "turn.elicit_slot",
            Self::Delegate => "turn.delegated",
            Self::CloseFulfilled => "turn.fulfilled",
            Self::FailTurn => "turn.intent_rejected",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: FlowState,
    pub to: FlowState,
    pub event: FlowEvent,
    pub actions: Vec<FlowAction>,
}
