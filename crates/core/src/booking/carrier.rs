//! Carries a [`CatalogLookup`] between turns inside the host's session attributes.
//!
//! The lookup is stored as a JSON document under [`LOOKUP_SESSION_KEY`] and read back
//! with a strict data parser. Anything that does not decode to the lookup shape is
//! reported as [`CarrierError::CorruptSessionState`].

use thiserror::Error;

use crate::domain::catalog::CatalogLookup;
use crate::domain::turn::SessionAttributes;

pub const LOOKUP_SESSION_KEY: &str = "moviedetails_lookup";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CarrierError {
    #[error("carried catalog lookup is corrupt: {0}")]
    CorruptSessionState(String),
    #[error("catalog lookup could not be encoded: {0}")]
    Encode(String),
}

pub fn encode(lookup: &CatalogLookup) -> Result<String, CarrierError> {
    serde_json::to_string(lookup).map_err(|error| CarrierError::Encode(error.to_string()))
}

pub fn decode(raw: &str) -> Result<CatalogLookup, CarrierError> {
    serde_json::from_str(raw).map_err(|error| CarrierError::CorruptSessionState(error.to_string()))
}

/// Returns `Ok(None)` when no lookup has been carried yet.
pub fn read_carried(session: &SessionAttributes) -> Result<Option<CatalogLookup>, CarrierError> {
    session.get(LOOKUP_SESSION_KEY).map(|raw| decode(raw)).transpose()
}

/// Session attributes to merge into the response so later turns can resolve options.
pub fn carry(lookup: &CatalogLookup) -> Result<SessionAttributes, CarrierError> {
    let mut attributes = SessionAttributes::new();
    attributes.insert(LOOKUP_SESSION_KEY.to_string(), encode(lookup)?);
    Ok(attributes)
}

#[cfg(test)]
mod tests {
    use super::{carry, decode, encode, read_carried, CarrierError, LOOKUP_SESSION_KEY};
    use crate::domain::catalog::{CatalogEntry, CatalogLookup, CatalogOption};
    use crate::domain::turn::SessionAttributes;

    fn lookup_of(entries: Vec<CatalogEntry>) -> CatalogLookup {
        CatalogLookup::from_entries(&entries)
    }

    #[test]
    fn round_trip_preserves_zero_one_and_many_option_entries() {
        let shapes = vec![
            lookup_of(Vec::new()),
            lookup_of(vec![CatalogEntry::new("Silent Film", Vec::new())]),
            lookup_of(vec![CatalogEntry::new("WAR", vec![CatalogOption::new("10pm", "400")])]),
            lookup_of(vec![
                CatalogEntry::new(
                    "Mangal Mission",
                    vec![CatalogOption::new("9am", "500"), CatalogOption::new("1pm", "700")],
                ),
                CatalogEntry::new(
                    "Quote \"Heavy\" Title, Part 2",
                    vec![
                        CatalogOption::new("10:00", "450"),
                        CatalogOption::new("13:30", "450"),
                        CatalogOption::new("21:15", "650"),
                    ],
                ),
            ]),
        ];

        for lookup in shapes {
            let encoded = encode(&lookup).expect("encodes");
            assert_eq!(decode(&encoded), Ok(lookup));
        }
    }

    #[test]
    fn expression_syntax_is_rejected_as_corrupt_state() {
        for raw in [
            "{'WAR': [{'slots': '10pm', 'price': '400'}]}",
            "__import__('os').system('true')",
            "",
            "[1, 2, 3]",
        ] {
            assert!(
                matches!(decode(raw), Err(CarrierError::CorruptSessionState(_))),
                "`{raw}` must not decode"
            );
        }
    }

    #[test]
    fn absent_key_reads_as_nothing_carried() {
        assert_eq!(read_carried(&SessionAttributes::new()), Ok(None));
    }

    #[test]
    fn carried_attributes_are_readable_on_a_later_turn() {
        let lookup =
            lookup_of(vec![CatalogEntry::new("WAR", vec![CatalogOption::new("12pm", "600")])]);

        let session = carry(&lookup).expect("carries");

        assert!(session.contains_key(LOOKUP_SESSION_KEY));
        assert_eq!(read_carried(&session), Ok(Some(lookup)));
    }
}
