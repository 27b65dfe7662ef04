use crate::domain::turn::{InvocationStage, SessionAttributes, SlotName, SlotValues, TurnRequest};
use crate::errors::TurnError;

/// Slot values the booking dialog needs, with blanks folded into "not collected".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BookingSlots {
    pub booking_date: Option<String>,
    pub movie_name: Option<String>,
    pub booking_slot: Option<String>,
    pub customer_name: Option<String>,
    pub number_of_tickets: Option<String>,
}

impl BookingSlots {
    pub fn from_slots(slots: &SlotValues) -> Self {
        Self {
            booking_date: collected(slots, SlotName::BookingDate),
            movie_name: collected(slots, SlotName::MovieName),
            booking_slot: collected(slots, SlotName::BookingSlot),
            customer_name: collected(slots, SlotName::CustomerName),
            number_of_tickets: collected(slots, SlotName::NumberOfTickets),
        }
    }

    pub fn get(&self, slot: SlotName) -> Option<&str> {
        match slot {
            SlotName::BookingDate => self.booking_date.as_deref(),
            SlotName::MovieName => self.movie_name.as_deref(),
            SlotName::BookingSlot => self.booking_slot.as_deref(),
            SlotName::CustomerName => self.customer_name.as_deref(),
            SlotName::NumberOfTickets => self.number_of_tickets.as_deref(),
        }
    }
}

/// Fields of one turn the dispatcher works with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnContext {
    pub user_id: String,
    pub bot_name: Option<String>,
    pub intent_name: String,
    pub stage: InvocationStage,
    /// Raw slot map, echoed back to the host in elicitations.
    pub slots: SlotValues,
    pub session_attributes: SessionAttributes,
    pub booking: BookingSlots,
}

impl TurnContext {
    pub fn from_request(request: TurnRequest) -> Self {
        let booking = BookingSlots::from_slots(&request.current_intent.slots);
        Self {
            user_id: request.user_id,
            bot_name: request.bot.map(|bot| bot.name),
            intent_name: request.current_intent.name,
            stage: request.invocation_source,
            slots: request.current_intent.slots,
            session_attributes: request.session_attributes.unwrap_or_default(),
            booking,
        }
    }
}

pub fn parse_turn_payload(raw: &[u8]) -> Result<TurnRequest, TurnError> {
    serde_json::from_slice(raw).map_err(|error| TurnError::MalformedTurn(error.to_string()))
}

fn collected(slots: &SlotValues, slot: SlotName) -> Option<String> {
    slots
        .get(slot.as_str())
        .and_then(|value| value.as_deref())
        .filter(|value| !value.trim().is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::{parse_turn_payload, BookingSlots, TurnContext};
    use crate::domain::turn::{InvocationStage, SlotName, SlotValues};
    use crate::errors::TurnError;

    #[test]
    fn missing_null_and_blank_slots_are_not_collected() {
        let mut slots = SlotValues::new();
        slots.insert("bookingDate".to_string(), None);
        slots.insert("movieName".to_string(), Some("   ".to_string()));
        slots.insert("customerName".to_string(), Some("Asha".to_string()));

        let booking = BookingSlots::from_slots(&slots);

        assert_eq!(booking.get(SlotName::BookingDate), None);
        assert_eq!(booking.get(SlotName::MovieName), None);
        assert_eq!(booking.get(SlotName::BookingSlot), None);
        assert_eq!(booking.get(SlotName::CustomerName), Some("Asha"));
    }

    #[test]
    fn context_defaults_absent_session_attributes_to_empty() {
        let request = parse_turn_payload(
            br#"{
                "userId": "u-9",
                "invocationSource": "FulfillmentCodeHook",
                "currentIntent": { "name": "BookMovieTickets", "slots": {} },
                "bot": { "name": "MovieBooking" }
            }"#,
        )
        .expect("payload parses");

        let context = TurnContext::from_request(request);

        assert!(context.session_attributes.is_empty());
        assert_eq!(context.stage, InvocationStage::Fulfillment);
        assert_eq!(context.intent_name, "BookMovieTickets");
        assert_eq!(context.bot_name.as_deref(), Some("MovieBooking"));
        assert_eq!(context.booking, BookingSlots::default());
    }

    #[test]
    fn payload_without_current_intent_is_malformed() {
        let result = parse_turn_payload(br#"{"userId":"u","invocationSource":"DialogCodeHook"}"#);
        assert!(matches!(result, Err(TurnError::MalformedTurn(_))));
    }
}
