use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A time slot offered for a movie. Legacy catalog feeds name the label `slots`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogOption {
    #[serde(alias = "slots")]
    pub label: String,
    pub price: String,
}

impl CatalogOption {
    pub fn new(label: impl Into<String>, price: impl Into<String>) -> Self {
        Self { label: label.into(), price: price.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    #[serde(default, alias = "slotDetails")]
    pub options: Vec<CatalogOption>,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, options: Vec<CatalogOption>) -> Self {
        Self { name: name.into(), options }
    }
}

/// Movie name to offered options, derived from one catalog fetch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogLookup(BTreeMap<String, Vec<CatalogOption>>);

impl CatalogLookup {
    /// Later entries win when the catalog repeats a name.
    pub fn from_entries(entries: &[CatalogEntry]) -> Self {
        Self(entries.iter().map(|entry| (entry.name.clone(), entry.options.clone())).collect())
    }

    pub fn options_for(&self, name: &str) -> Option<&[CatalogOption]> {
        self.0.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
