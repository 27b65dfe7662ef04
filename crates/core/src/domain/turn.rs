use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type SessionAttributes = BTreeMap<String, String>;
pub type SlotValues = BTreeMap<String, Option<String>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvocationStage {
    #[serde(rename = "DialogCodeHook")]
    DialogCollection,
    #[serde(rename = "FulfillmentCodeHook")]
    Fulfillment,
}

/// One dialog exchange as delivered by the conversational host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    #[serde(default)]
    pub user_id: String,
    pub invocation_source: InvocationStage,
    #[serde(default)]
    pub session_attributes: Option<SessionAttributes>,
    pub current_intent: CurrentIntent,
    #[serde(default)]
    pub bot: Option<BotInfo>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentIntent {
    pub name: String,
    #[serde(default)]
    pub slots: SlotValues,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotInfo {
    pub name: String,
}

/// Slots collected by the booking dialog, in the order they are validated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotName {
    BookingDate,
    MovieName,
    BookingSlot,
    CustomerName,
    NumberOfTickets,
}

impl SlotName {
    pub const PRECEDENCE: [SlotName; 5] = [
        Self::BookingDate,
        Self::MovieName,
        Self::BookingSlot,
        Self::CustomerName,
        Self::NumberOfTickets,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BookingDate => "bookingDate",
            Self::MovieName => "movieName",
            Self::BookingSlot => "bookingSlot",
            Self::CustomerName => "customerName",
            Self::NumberOfTickets => "numberOfTickets",
        }
    }
}

impl std::fmt::Display for SlotName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
