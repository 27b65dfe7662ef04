pub mod carrier;
pub mod context;
pub mod dispatcher;
pub mod policy;
pub mod response;
pub mod validator;

pub use carrier::{CarrierError, LOOKUP_SESSION_KEY};
pub use context::{parse_turn_payload, BookingSlots, TurnContext};
pub use dispatcher::TurnDispatcher;
pub use policy::{BookingPolicy, FulfillmentMode, HourRange, OptionLabelStyle, DEFAULT_INTENT_NAME};
pub use validator::{SlotValidator, SlotViolation, ValidationOutcome};
