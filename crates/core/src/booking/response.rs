//! Builders for the three dialog actions the host understands.

use crate::booking::context::{BookingSlots, TurnContext};
use crate::booking::policy::FulfillmentMode;
use crate::booking::validator::SlotViolation;
use crate::domain::response::{DialogAction, FulfillmentState, Message, TurnResponse};
use crate::domain::turn::{InvocationStage, SessionAttributes, SlotValues};

pub fn elicit_slot(
    session_attributes: SessionAttributes,
    intent_name: impl Into<String>,
    slots: SlotValues,
    slot_to_elicit: impl Into<String>,
    message: Message,
) -> TurnResponse {
    TurnResponse {
        session_attributes,
        dialog_action: DialogAction::ElicitSlot {
            intent_name: intent_name.into(),
            slots,
            slot_to_elicit: slot_to_elicit.into(),
            message,
        },
    }
}

pub fn close(
    session_attributes: SessionAttributes,
    fulfillment_state: FulfillmentState,
    message: Message,
) -> TurnResponse {
    TurnResponse { session_attributes, dialog_action: DialogAction::Close { fulfillment_state, message } }
}

pub fn delegate(session_attributes: SessionAttributes, slots: SlotValues) -> TurnResponse {
    TurnResponse { session_attributes, dialog_action: DialogAction::Delegate { slots } }
}

/// Values are interpolated as given; nothing is escaped or localized.
pub fn fulfillment_message(booking: &BookingSlots) -> Message {
    let value = |slot: &Option<String>| slot.clone().unwrap_or_default();
    Message::plain_text(format!(
        "Thanks, your {} ticket for {} has been booked for date {} and slot {} against name {}",
        value(&booking.number_of_tickets),
        value(&booking.movie_name),
        value(&booking.booking_date),
        value(&booking.booking_slot),
        value(&booking.customer_name),
    ))
}

/// Re-asks the violated slot, clearing its value and merging any carried attributes.
pub fn respond_to_violation(context: &TurnContext, violation: SlotViolation) -> TurnResponse {
    let mut slots = context.slots.clone();
    slots.insert(violation.slot.as_str().to_string(), None);

    let mut session_attributes = context.session_attributes.clone();
    if let Some(carried) = violation.carry_session_attributes {
        session_attributes.extend(carried);
    }

    elicit_slot(session_attributes, context.intent_name.clone(), slots, violation.slot.as_str(), violation.message)
}

pub fn respond_to_valid(context: &TurnContext, mode: FulfillmentMode) -> TurnResponse {
    if defers_fulfillment(mode, context.stage) {
        return delegate(context.session_attributes.clone(), context.slots.clone());
    }

    close(
        context.session_attributes.clone(),
        FulfillmentState::Fulfilled,
        fulfillment_message(&context.booking),
    )
}

pub fn defers_fulfillment(mode: FulfillmentMode, stage: InvocationStage) -> bool {
    matches!(
        (mode, stage),
        (FulfillmentMode::AwaitFulfillmentStage, InvocationStage::DialogCollection)
    )
}

#[cfg(test)]
mod tests {
    use super::{defers_fulfillment, fulfillment_message, respond_to_valid, respond_to_violation};
    use crate::booking::carrier::LOOKUP_SESSION_KEY;
    use crate::booking::context::{BookingSlots, TurnContext};
    use crate::booking::policy::FulfillmentMode;
    use crate::booking::validator::SlotViolation;
    use crate::domain::response::{DialogAction, FulfillmentState, Message};
    use crate::domain::turn::{InvocationStage, SessionAttributes, SlotName, SlotValues};

    fn context(stage: InvocationStage) -> TurnContext {
        let mut slots = SlotValues::new();
        slots.insert("bookingDate".to_string(), Some("2026-10-20".to_string()));
        slots.insert("movieName".to_string(), Some("WAR".to_string()));
        slots.insert("bookingSlot".to_string(), Some("9am".to_string()));
        slots.insert("customerName".to_string(), Some("Asha <b>".to_string()));
        slots.insert("numberOfTickets".to_string(), Some("2".to_string()));
        let mut session_attributes = SessionAttributes::new();
        session_attributes.insert("channel".to_string(), "web".to_string());

        TurnContext {
            user_id: "user-1".to_string(),
            bot_name: None,
            intent_name: "BookMovieTickets".to_string(),
            stage,
            booking: BookingSlots::from_slots(&slots),
            slots,
            session_attributes,
        }
    }

    #[test]
    fn violation_clears_slot_and_merges_carried_attributes() {
        let mut carried = SessionAttributes::new();
        carried.insert(LOOKUP_SESSION_KEY.to_string(), "{}".to_string());
        let violation = SlotViolation {
            slot: SlotName::MovieName,
            message: Message::plain_text("Please choose from the given movies WAR"),
            carry_session_attributes: Some(carried),
        };

        let response = respond_to_violation(&context(InvocationStage::DialogCollection), violation);

        assert_eq!(response.session_attributes.get("channel").map(String::as_str), Some("web"));
        assert_eq!(response.session_attributes.get(LOOKUP_SESSION_KEY).map(String::as_str), Some("{}"));
        let DialogAction::ElicitSlot { intent_name, slots, slot_to_elicit, message } =
            response.dialog_action
        else {
            panic!("expected ElicitSlot");
        };
        assert_eq!(intent_name, "BookMovieTickets");
        assert_eq!(slot_to_elicit, "movieName");
        assert_eq!(slots.get("movieName"), Some(&None));
        assert_eq!(slots.get("bookingDate"), Some(&Some("2026-10-20".to_string())));
        assert_eq!(message.content, "Please choose from the given movies WAR");
    }

    #[test]
    fn violation_without_carry_keeps_session_unchanged() {
        let ctx = context(InvocationStage::DialogCollection);
        let violation = SlotViolation {
            slot: SlotName::CustomerName,
            message: Message::plain_text("who?"),
            carry_session_attributes: None,
        };

        let response = respond_to_violation(&ctx, violation);

        assert_eq!(response.session_attributes, ctx.session_attributes);
    }

    #[test]
    fn fulfillment_message_interpolates_values_verbatim() {
        let message = fulfillment_message(&context(InvocationStage::Fulfillment).booking);
        assert_eq!(
            message.content,
            "Thanks, your 2 ticket for WAR has been booked for date 2026-10-20 and slot 9am against name Asha <b>"
        );
    }

    #[test]
    fn immediate_mode_closes_during_collection() {
        let response =
            respond_to_valid(&context(InvocationStage::DialogCollection), FulfillmentMode::Immediate);
        assert!(matches!(
            response.dialog_action,
            DialogAction::Close { fulfillment_state: FulfillmentState::Fulfilled, .. }
        ));
    }

    #[test]
    fn awaiting_mode_delegates_until_fulfillment_stage() {
        let collecting = respond_to_valid(
            &context(InvocationStage::DialogCollection),
            FulfillmentMode::AwaitFulfillmentStage,
        );
        assert!(matches!(collecting.dialog_action, DialogAction::Delegate { .. }));

        let fulfilling = respond_to_valid(
            &context(InvocationStage::Fulfillment),
            FulfillmentMode::AwaitFulfillmentStage,
        );
        assert!(matches!(fulfilling.dialog_action, DialogAction::Close { .. }));

        assert!(!defers_fulfillment(FulfillmentMode::Immediate, InvocationStage::DialogCollection));
    }
}
