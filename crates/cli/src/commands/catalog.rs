use boxoffice_core::booking::carrier;
use boxoffice_core::catalog::{build_provider, fetch_with_policy, FetchPolicy};
use boxoffice_core::config::{AppConfig, CatalogSource, LoadOptions};
use boxoffice_core::domain::catalog::{CatalogEntry, CatalogLookup};
use serde::Serialize;

use crate::commands::{
    current_thread_runtime, CommandResult, EXIT_CATALOG_UNAVAILABLE, EXIT_CONFIG, EXIT_OK,
    EXIT_RUNTIME,
};

const COMMAND: &str = "catalog";

#[derive(Debug, Serialize)]
struct CatalogReport {
    command: &'static str,
    status: &'static str,
    source: CatalogSource,
    entries: Vec<CatalogEntry>,
    /// The value a first elicitation would carry in the session.
    lookup: String,
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "config_validation",
                error.to_string(),
                EXIT_CONFIG,
            );
        }
    };

    let provider = match build_provider(&config.catalog) {
        Ok(provider) => provider,
        Err(error) => {
            return CommandResult::failure(COMMAND, "catalog_config", error.to_string(), EXIT_CONFIG);
        }
    };

    let runtime = match current_thread_runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let policy = FetchPolicy::from_config(&config.catalog);
    let entries = match runtime.block_on(fetch_with_policy(&*provider, &policy)) {
        Ok(entries) => entries,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "catalog_unavailable",
                error.to_string(),
                EXIT_CATALOG_UNAVAILABLE,
            );
        }
    };

    let lookup = match carrier::encode(&CatalogLookup::from_entries(&entries)) {
        Ok(lookup) => lookup,
        Err(error) => {
            return CommandResult::failure(COMMAND, "serialization", error.to_string(), EXIT_RUNTIME);
        }
    };

    let report =
        CatalogReport { command: COMMAND, status: "ok", source: config.catalog.source, entries, lookup };
    match serde_json::to_string(&report) {
        Ok(output) => CommandResult { exit_code: EXIT_OK, output },
        Err(error) => CommandResult::failure(COMMAND, "serialization", error.to_string(), EXIT_RUNTIME),
    }
}
