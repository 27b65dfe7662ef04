use std::sync::Arc;

use tracing::{info, warn};

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::booking::context::TurnContext;
use crate::booking::policy::BookingPolicy;
use crate::booking::response::{defers_fulfillment, respond_to_valid, respond_to_violation};
use crate::booking::validator::{SlotValidator, ValidationOutcome};
use crate::catalog::{CatalogProvider, FetchPolicy};
use crate::clock::{BookingZone, SystemClock};
use crate::config::AppConfig;
use crate::domain::response::TurnResponse;
use crate::domain::turn::TurnRequest;
use crate::errors::TurnError;
use crate::flows::{FlowAction, FlowEngine, FlowEvent, MovieBookingFlow, TransitionOutcome};

const DISPATCHER_ACTOR: &str = "turn-dispatcher";

/// Routes one turn to the booking dialog and records what it decided.
pub struct TurnDispatcher<P, S> {
    intent_name: String,
    validator: SlotValidator<P>,
    flow: FlowEngine<MovieBookingFlow>,
    sink: S,
}

impl<P, S> TurnDispatcher<P, S>
where
    P: CatalogProvider,
    S: AuditSink,
{
    pub fn new(intent_name: impl Into<String>, validator: SlotValidator<P>, sink: S) -> Self {
        Self { intent_name: intent_name.into(), validator, flow: FlowEngine::default(), sink }
    }

    pub fn from_config(config: &AppConfig, catalog: P, sink: S) -> Self {
        let zone = config.booking.zone().unwrap_or_else(|error| {
            warn!(event_name = "turn.clock.fallback", error = %error, "using UTC for booking dates");
            BookingZone::default()
        });
        let validator = SlotValidator::new(
            catalog,
            FetchPolicy::from_config(&config.catalog),
            BookingPolicy::from(&config.booking),
            Arc::new(SystemClock::new(zone)),
        );
        Self::new(config.booking.intent_name.clone(), validator, sink)
    }

    pub fn intent_name(&self) -> &str {
        &self.intent_name
    }

    pub fn catalog(&self) -> &P {
        self.validator.catalog()
    }

    pub async fn dispatch(
        &self,
        request: TurnRequest,
        correlation_id: &str,
    ) -> Result<TurnResponse, TurnError> {
        let context = TurnContext::from_request(request);
        let audit = AuditContext::new(Some(context.user_id.clone()), correlation_id, DISPATCHER_ACTOR);
        let state = self.flow.initial_state();

        info!(
            event_name = "turn.received",
            correlation_id,
            user_id = %context.user_id,
            intent_name = %context.intent_name,
            stage = ?context.stage,
            "turn received"
        );

        if context.intent_name != self.intent_name {
            let event = FlowEvent::IntentRejected { intent_name: context.intent_name.clone() };
            let outcome = self.flow.apply(&state, &event)?;
            self.record(&audit, &outcome, AuditOutcome::Rejected);
            warn!(
                event_name = "turn.intent_rejected",
                correlation_id,
                user_id = %context.user_id,
                intent_name = %context.intent_name,
                "intent is not handled by this bot"
            );
            return Err(TurnError::UnsupportedIntent { intent_name: context.intent_name });
        }

        let (event, response) =
            match self.validator.validate(&context.booking, &context.session_attributes).await {
                ValidationOutcome::Violation(violation) => (
                    FlowEvent::SlotViolated { slot: violation.slot.as_str().to_string() },
                    respond_to_violation(&context, violation),
                ),
                ValidationOutcome::Valid => {
                    let mode = self.validator.policy().fulfillment;
                    let event = if defers_fulfillment(mode, context.stage) {
                        FlowEvent::FulfillmentDeferred
                    } else {
                        FlowEvent::SlotsValidated
                    };
                    (event, respond_to_valid(&context, mode))
                }
            };

        let outcome = self.flow.apply(&state, &event)?;
        self.record(&audit, &outcome, AuditOutcome::Success);

        info!(
            event_name = "turn.responded",
            correlation_id,
            user_id = %context.user_id,
            intent_name = %context.intent_name,
            dialog_action = response.dialog_action.kind(),
            state = ?outcome.to,
            "turn answered"
        );

        Ok(response)
    }

    fn record(&self, audit: &AuditContext, outcome: &TransitionOutcome, result: AuditOutcome) {
        for action in &outcome.actions {
            let mut event = AuditEvent::new(
                audit,
                action.event_name(),
                AuditCategory::Dialog,
                result.clone(),
            )
            .with_metadata("from", format!("{:?}", outcome.from))
            .with_metadata("to", format!("{:?}", outcome.to));
            match action {
                FlowAction::ElicitSlot { slot } => {
                    event = event.with_metadata("slot", slot.clone());
                }
                FlowAction::FailTurn => {
                    if let FlowEvent::IntentRejected { intent_name } = &outcome.event {
                        event = event.with_metadata("intent_name", intent_name.clone());
                    }
                }
                FlowAction::Delegate | FlowAction::CloseFulfilled => {}
            }
            self.sink.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::NaiveDate;
    use serde_json::json;

    use super::TurnDispatcher;
    use crate::audit::{AuditOutcome, InMemoryAuditSink};
    use crate::booking::carrier::{self, LOOKUP_SESSION_KEY};
    use crate::booking::policy::{BookingPolicy, FulfillmentMode, DEFAULT_INTENT_NAME};
    use crate::booking::validator::{SlotValidator, MSG_DATE_MISSING};
    use crate::catalog::testing::ScriptedCatalogProvider;
    use crate::catalog::{FetchPolicy, StaticCatalogProvider};
    use crate::clock::FixedClock;
    use crate::config::AppConfig;
    use crate::domain::response::{DialogAction, FulfillmentState};
    use crate::domain::turn::TurnRequest;
    use crate::errors::TurnError;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).expect("valid date")
    }

    fn dispatcher_with<P>(
        catalog: P,
        policy: BookingPolicy,
    ) -> (TurnDispatcher<P, InMemoryAuditSink>, InMemoryAuditSink)
    where
        P: crate::catalog::CatalogProvider,
    {
        let fetch = FetchPolicy {
            timeout: Duration::from_millis(50),
            max_retries: 0,
            base_delay_ms: 0,
            max_delay_ms: 0,
        };
        let validator = SlotValidator::new(catalog, fetch, policy, Arc::new(FixedClock(today())));
        let sink = InMemoryAuditSink::default();
        (TurnDispatcher::new(DEFAULT_INTENT_NAME, validator, sink.clone()), sink)
    }

    fn dispatcher() -> (TurnDispatcher<StaticCatalogProvider, InMemoryAuditSink>, InMemoryAuditSink) {
        dispatcher_with(StaticCatalogProvider::default(), BookingPolicy::default())
    }

    fn request(intent: &str, stage: &str, slots: serde_json::Value) -> TurnRequest {
        serde_json::from_value(json!({
            "userId": "user-42",
            "invocationSource": stage,
            "sessionAttributes": {},
            "currentIntent": { "name": intent, "slots": slots },
            "bot": { "name": "MovieBot" }
        }))
        .expect("valid request")
    }

    fn empty_slots() -> serde_json::Value {
        json!({
            "bookingDate": null,
            "movieName": null,
            "bookingSlot": null,
            "customerName": null,
            "numberOfTickets": null
        })
    }

    fn complete_slots() -> serde_json::Value {
        json!({
            "bookingDate": "2026-10-20",
            "movieName": "WAR",
            "bookingSlot": "22:00",
            "customerName": "Asha",
            "numberOfTickets": "2"
        })
    }

    #[tokio::test]
    async fn empty_turn_elicits_booking_date() {
        let (dispatcher, sink) = dispatcher();

        let response = dispatcher
            .dispatch(request(DEFAULT_INTENT_NAME, "DialogCodeHook", empty_slots()), "req-1")
            .await
            .expect("response");

        match response.dialog_action {
            DialogAction::ElicitSlot { slot_to_elicit, message, intent_name, .. } => {
                assert_eq!(slot_to_elicit, "bookingDate");
                assert_eq!(message.content, MSG_DATE_MISSING);
                assert_eq!(intent_name, DEFAULT_INTENT_NAME);
            }
            other => panic!("expected elicitation, got {other:?}"),
        }

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "turn.elicit_slot");
        assert_eq!(events[0].correlation_id, "req-1");
        assert_eq!(events[0].metadata.get("slot").map(String::as_str), Some("bookingDate"));
    }

    #[tokio::test]
    async fn valid_date_without_movie_carries_the_catalog_lookup() {
        let (dispatcher, _sink) = dispatcher();
        let mut slots = empty_slots();
        slots["bookingDate"] = json!("2026-10-20");

        let response = dispatcher
            .dispatch(request(DEFAULT_INTENT_NAME, "DialogCodeHook", slots), "req-2")
            .await
            .expect("response");

        let carried = response
            .session_attributes
            .get(LOOKUP_SESSION_KEY)
            .expect("lookup should be carried");
        let lookup = carrier::decode(carried).expect("carried lookup decodes");
        assert!(lookup.contains("WAR"));
        assert!(lookup.contains("Mangal Mission"));

        match response.dialog_action {
            DialogAction::ElicitSlot { slot_to_elicit, message, slots, .. } => {
                assert_eq!(slot_to_elicit, "movieName");
                assert_eq!(message.content, "Please choose from the given movies Mangal Mission,WAR");
                assert_eq!(slots.get("bookingDate"), Some(&Some("2026-10-20".to_string())));
                assert_eq!(slots.get("movieName"), Some(&None));
            }
            other => panic!("expected elicitation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn complete_booking_closes_with_confirmation() {
        let (dispatcher, sink) = dispatcher();

        let response = dispatcher
            .dispatch(request(DEFAULT_INTENT_NAME, "DialogCodeHook", complete_slots()), "req-3")
            .await
            .expect("response");

        match response.dialog_action {
            DialogAction::Close { fulfillment_state, message } => {
                assert_eq!(fulfillment_state, FulfillmentState::Fulfilled);
                assert_eq!(
                    message.content,
                    "Thanks, your 2 ticket for WAR has been booked for date 2026-10-20 and slot 22:00 against name Asha"
                );
            }
            other => panic!("expected close, got {other:?}"),
        }
        assert_eq!(sink.events()[0].event_type, "turn.fulfilled");
    }

    #[tokio::test]
    async fn deferred_fulfillment_delegates_until_fulfillment_stage() {
        let policy = BookingPolicy {
            fulfillment: FulfillmentMode::AwaitFulfillmentStage,
            ..BookingPolicy::default()
        };
        let (dispatcher, sink) = dispatcher_with(StaticCatalogProvider::default(), policy);

        let collecting = dispatcher
            .dispatch(request(DEFAULT_INTENT_NAME, "DialogCodeHook", complete_slots()), "req-4")
            .await
            .expect("response");
        assert_eq!(collecting.dialog_action.kind(), "Delegate");

        let fulfilled = dispatcher
            .dispatch(request(DEFAULT_INTENT_NAME, "FulfillmentCodeHook", complete_slots()), "req-5")
            .await
            .expect("response");
        assert_eq!(fulfilled.dialog_action.kind(), "Close");

        let kinds = sink.events().into_iter().map(|event| event.event_type).collect::<Vec<_>>();
        assert_eq!(kinds, vec!["turn.delegated".to_string(), "turn.fulfilled".to_string()]);
    }

    #[tokio::test]
    async fn unsupported_intent_is_rejected_without_a_response() {
        let catalog = ScriptedCatalogProvider::new(Vec::new());
        let (dispatcher, sink) = dispatcher_with(catalog, BookingPolicy::default());

        let error = dispatcher
            .dispatch(request("OrderPizza", "DialogCodeHook", empty_slots()), "req-6")
            .await
            .expect_err("unsupported intent");

        assert_eq!(error, TurnError::UnsupportedIntent { intent_name: "OrderPizza".to_string() });
        assert_eq!(dispatcher.catalog().calls(), 0);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "turn.intent_rejected");
        assert_eq!(events[0].outcome, AuditOutcome::Rejected);
        assert_eq!(events[0].metadata.get("intent_name").map(String::as_str), Some("OrderPizza"));
    }

    #[tokio::test]
    async fn dispatch_is_idempotent_for_identical_turns() {
        let (dispatcher, _sink) = dispatcher();
        let mut slots = empty_slots();
        slots["bookingDate"] = json!("2026-10-20");

        let first = dispatcher
            .dispatch(request(DEFAULT_INTENT_NAME, "DialogCodeHook", slots.clone()), "req-7")
            .await
            .expect("response");
        let second = dispatcher
            .dispatch(request(DEFAULT_INTENT_NAME, "DialogCodeHook", slots), "req-8")
            .await
            .expect("response");

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn from_config_uses_configured_intent_name() {
        let mut config = AppConfig::default();
        config.booking.intent_name = "ReserveSeats".to_string();

        let dispatcher =
            TurnDispatcher::from_config(&config, StaticCatalogProvider::default(), InMemoryAuditSink::default());
        assert_eq!(dispatcher.intent_name(), "ReserveSeats");

        let error = dispatcher
            .dispatch(request(DEFAULT_INTENT_NAME, "DialogCodeHook", empty_slots()), "req-9")
            .await
            .expect_err("default intent is not configured");
        assert!(matches!(error, TurnError::UnsupportedIntent { .. }));
    }
}
