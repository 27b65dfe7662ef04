use thiserror::Error;

use crate::flows::states::{FlowAction, FlowEvent, FlowState, FlowType, TransitionOutcome};

pub trait FlowDefinition {
    fn flow_type(&self) -> FlowType;
    fn initial_state(&self) -> FlowState;
    fn transition(
        &self,
        current: &FlowState,
        event: &FlowEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
}

/// Each turn starts in `Collecting`; the host carries everything else between turns.
#[derive(Clone, Debug, Default)]
pub struct MovieBookingFlow;

impl FlowDefinition for MovieBookingFlow {
    fn flow_type(&self) -> FlowType {
        FlowType::MovieBooking
    }

    fn initial_state(&self) -> FlowState {
        FlowState::Collecting
    }

    fn transition(
        &self,
        current: &FlowState,
        event: &FlowEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_movie_booking(current, event)
    }
}

pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn flow_type(&self) -> FlowType {
        self.flow.flow_type()
    }

    pub fn initial_state(&self) -> FlowState {
        self.flow.initial_state()
    }

    pub fn apply(
        &self,
        current: &FlowState,
        event: &FlowEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        self.flow.transition(current, event)
    }
}

impl Default for FlowEngine<MovieBookingFlow> {
    fn default() -> Self {
        Self::new(MovieBookingFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: FlowState, event: FlowEvent },
}

fn transition_movie_booking(
    current: &FlowState,
    event: &FlowEvent,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use FlowAction::{CloseFulfilled, Delegate, ElicitSlot, FailTurn};
    use FlowEvent::{FulfillmentDeferred, IntentRejected, SlotViolated, SlotsValidated};
    use FlowState::{Collecting, Fulfilled, UnsupportedIntent};

    let (to, actions) = match (current, event) {
        (Collecting, SlotViolated { slot }) => (Collecting, vec![ElicitSlot { slot: slot.clone() }]),
        (Collecting, FulfillmentDeferred) => (Collecting, vec![Delegate]),
        (Collecting, SlotsValidated) => (Fulfilled, vec![CloseFulfilled]),
        (Collecting, IntentRejected { .. }) => (UnsupportedIntent, vec![FailTurn]),
        _ => {
            return Err(FlowTransitionError::InvalidTransition {
                state: *current,
                event: event.clone(),
            });
        }
    };

    Ok(TransitionOutcome { from: *current, to, event: event.clone(), actions })
}
