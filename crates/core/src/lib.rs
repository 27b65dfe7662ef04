pub mod audit;
pub mod booking;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;

pub use audit::{AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use booking::{parse_turn_payload, BookingPolicy, TurnDispatcher};
pub use catalog::{build_provider, CatalogError, CatalogProvider};
pub use clock::{BookingZone, Clock, FixedClock, SystemClock};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
pub use domain::catalog::{CatalogEntry, CatalogLookup, CatalogOption};
pub use domain::response::{DialogAction, TurnResponse};
pub use domain::turn::{SlotName, TurnRequest};
pub use errors::{InterfaceError, TurnError};
