//! Ordered slot validation for the movie booking dialog.
//!
//! Slots are checked date, movie, show slot, customer name, ticket count, and the
//! first violation wins so the dialog asks one question at a time in a stable order.
//! The catalog is queried only when no movie has been chosen yet (or when the
//! lookup carried from that turn can no longer be read); later turns resolve show
//! slots from the carried lookup.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::booking::carrier::{self, CarrierError};
use crate::booking::context::BookingSlots;
use crate::booking::policy::{BookingPolicy, OptionLabelStyle};
use crate::catalog::{fetch_with_policy, CatalogProvider, FetchPolicy};
use crate::clock::Clock;
use crate::domain::catalog::{CatalogLookup, CatalogOption};
use crate::domain::response::Message;
use crate::domain::turn::{SessionAttributes, SlotName};

pub const MSG_DATE_MISSING: &str = "Please specify the date of booking";
pub const MSG_DATE_UNPARSEABLE: &str =
    "I did not understand that, what date would you like to book the tickets for?";
pub const MSG_DATE_IN_PAST: &str = "Booking date cannot be of the past";
pub const MSG_MOVIE_PROMPT_PREFIX: &str = "Please choose from the given movies ";
pub const MSG_MOVIE_NOT_LISTED: &str = "Please enter movie name from the list only";
pub const MSG_CATALOG_UNAVAILABLE: &str =
    "I could not load the list of movies right now, please try again";
pub const MSG_SLOT_PROMPT_PREFIX: &str = "Please select from the available slots for the movie ";
pub const MSG_SLOT_INVALID: &str = "Not a valid time";
pub const MSG_CUSTOMER_MISSING: &str =
    "Please specify the name against which the booking needs to be done";
pub const MSG_TICKETS_MISSING: &str = "Please specify the number of tickets required";

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotViolation {
    pub slot: SlotName,
    pub message: Message,
    /// Attributes to merge into the session; only set when a fresh lookup was computed.
    pub carry_session_attributes: Option<SessionAttributes>,
}

impl SlotViolation {
    fn new(slot: SlotName, content: impl Into<String>) -> Self {
        Self { slot, message: Message::plain_text(content), carry_session_attributes: None }
    }

    fn carrying(mut self, attributes: SessionAttributes) -> Self {
        self.carry_session_attributes = Some(attributes);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Violation(SlotViolation),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn violated_slot(&self) -> Option<SlotName> {
        match self {
            Self::Valid => None,
            Self::Violation(violation) => Some(violation.slot),
        }
    }

    pub fn user_message(&self) -> Option<&Message> {
        match self {
            Self::Valid => None,
            Self::Violation(violation) => Some(&violation.message),
        }
    }

    pub fn carry_session_attributes(&self) -> Option<&SessionAttributes> {
        match self {
            Self::Valid => None,
            Self::Violation(violation) => violation.carry_session_attributes.as_ref(),
        }
    }
}

impl From<Result<(), SlotViolation>> for ValidationOutcome {
    fn from(result: Result<(), SlotViolation>) -> Self {
        match result {
            Ok(()) => Self::Valid,
            Err(violation) => Self::Violation(violation),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BookingTime {
    pub hour: u32,
    pub minute: u32,
}

/// Parses the `HH:MM` wire shape: five characters, colon third, numeric halves.
pub fn parse_booking_time(value: &str) -> Option<BookingTime> {
    if value.len() != 5 || value.as_bytes().get(2) != Some(&b':') {
        return None;
    }
    let (hour, minute) = value.split_once(':')?;
    Some(BookingTime { hour: hour.parse().ok()?, minute: minute.parse().ok()? })
}

pub struct SlotValidator<P> {
    catalog: P,
    fetch_policy: FetchPolicy,
    policy: BookingPolicy,
    clock: Arc<dyn Clock>,
}

impl<P> SlotValidator<P>
where
    P: CatalogProvider,
{
    pub fn new(
        catalog: P,
        fetch_policy: FetchPolicy,
        policy: BookingPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { catalog, fetch_policy, policy, clock }
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    pub fn catalog(&self) -> &P {
        &self.catalog
    }

    pub async fn validate(
        &self,
        booking: &BookingSlots,
        session: &SessionAttributes,
    ) -> ValidationOutcome {
        self.check_all(booking, session).await.into()
    }

    async fn check_all(
        &self,
        booking: &BookingSlots,
        session: &SessionAttributes,
    ) -> Result<(), SlotViolation> {
        self.check_booking_date(booking.booking_date.as_deref())?;

        let Some(movie_name) = booking.movie_name.as_deref() else {
            return Err(self.elicit_movie().await);
        };

        self.check_booking_slot(movie_name, booking.booking_slot.as_deref(), session).await?;

        if booking.customer_name.is_none() {
            return Err(SlotViolation::new(SlotName::CustomerName, MSG_CUSTOMER_MISSING));
        }
        if booking.number_of_tickets.is_none() {
            return Err(SlotViolation::new(SlotName::NumberOfTickets, MSG_TICKETS_MISSING));
        }

        Ok(())
    }

    fn check_booking_date(&self, value: Option<&str>) -> Result<(), SlotViolation> {
        let Some(value) = value else {
            return Err(SlotViolation::new(SlotName::BookingDate, MSG_DATE_MISSING));
        };
        let Ok(date) = NaiveDate::parse_from_str(value, DATE_FORMAT) else {
            return Err(SlotViolation::new(SlotName::BookingDate, MSG_DATE_UNPARSEABLE));
        };

        let today = self.clock.today();
        let too_early =
            if self.policy.allow_same_day_booking { date < today } else { date <= today };
        if too_early {
            return Err(SlotViolation::new(SlotName::BookingDate, MSG_DATE_IN_PAST));
        }

        Ok(())
    }

    async fn check_booking_slot(
        &self,
        movie_name: &str,
        value: Option<&str>,
        session: &SessionAttributes,
    ) -> Result<(), SlotViolation> {
        let Some(value) = value else {
            return Err(self.elicit_booking_slot(movie_name, session).await);
        };

        let Some(time) = parse_booking_time(value) else {
            return Err(SlotViolation::new(SlotName::BookingSlot, MSG_SLOT_INVALID));
        };

        if let Some(range) = self.policy.enforce_hour_range {
            if !range.contains(time.hour) {
                return Err(SlotViolation::new(
                    SlotName::BookingSlot,
                    format!(
                        "Bookings are only available between {:02}:00 and {:02}:00",
                        range.min, range.max
                    ),
                ));
            }
        }

        Ok(())
    }

    async fn elicit_booking_slot(&self, movie_name: &str, session: &SessionAttributes) -> SlotViolation {
        let lookup = match carrier::read_carried(session) {
            Ok(Some(lookup)) => lookup,
            Ok(None) => return SlotViolation::new(SlotName::MovieName, MSG_MOVIE_NOT_LISTED),
            Err(CarrierError::CorruptSessionState(reason)) => {
                warn!(
                    event_name = "session.lookup.corrupt",
                    reason = %reason,
                    "carried catalog lookup is unreadable; re-eliciting movie"
                );
                return self.elicit_movie().await;
            }
            Err(error) => {
                warn!(event_name = "session.lookup.unreadable", error = %error, "re-eliciting movie");
                return self.elicit_movie().await;
            }
        };

        let Some(options) = lookup.options_for(movie_name) else {
            debug!(event_name = "session.lookup.movie_not_listed", movie_name, "movie not in lookup");
            return SlotViolation::new(SlotName::MovieName, MSG_MOVIE_NOT_LISTED);
        };

        SlotViolation::new(
            SlotName::BookingSlot,
            format!("{MSG_SLOT_PROMPT_PREFIX}{}", self.option_labels(options)),
        )
    }

    /// The only path that queries the catalog provider.
    async fn elicit_movie(&self) -> SlotViolation {
        let entries = match fetch_with_policy(&self.catalog, &self.fetch_policy).await {
            Ok(entries) => entries,
            Err(error) => {
                warn!(
                    event_name = "catalog.unavailable",
                    error = %error,
                    "catalog unavailable; asking the user to retry"
                );
                return SlotViolation::new(SlotName::MovieName, MSG_CATALOG_UNAVAILABLE);
            }
        };

        let lookup = CatalogLookup::from_entries(&entries);
        let names = entries.iter().map(|entry| entry.name.as_str()).collect::<Vec<_>>().join(",");
        let violation = SlotViolation::new(SlotName::MovieName, format!("{MSG_MOVIE_PROMPT_PREFIX}{names}"));

        match carrier::carry(&lookup) {
            Ok(attributes) => violation.carrying(attributes),
            Err(error) => {
                warn!(event_name = "session.lookup.encode_failed", error = %error, "lookup not carried");
                violation
            }
        }
    }

    fn option_labels(&self, options: &[CatalogOption]) -> String {
        options
            .iter()
            .map(|option| match self.policy.option_labels {
                OptionLabelStyle::Label => option.label.clone(),
                OptionLabelStyle::LabelWithPrice => format!("{} ({})", option.label, option.price),
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}
