use std::fs;
use std::io::{self, Read};
use std::path::Path;

use boxoffice_core::audit::{new_correlation_id, TracingAuditSink};
use boxoffice_core::booking::{parse_turn_payload, TurnDispatcher};
use boxoffice_core::catalog::build_provider;
use boxoffice_core::config::{AppConfig, LoadOptions};
use boxoffice_core::errors::TurnError;
use tracing::debug;

use crate::commands::{
    current_thread_runtime, CommandResult, EXIT_CONFIG, EXIT_MALFORMED_TURN, EXIT_OK,
    EXIT_RUNTIME, EXIT_UNSUPPORTED_INTENT,
};

const COMMAND: &str = "turn";

/// Answers one turn read from `file`, or from stdin when no file is given.
pub fn run(file: Option<&Path>) -> CommandResult {
    let raw = match read_input(file) {
        Ok(raw) => raw,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "input_unreadable",
                format!("could not read turn input: {error}"),
                EXIT_MALFORMED_TURN,
            );
        }
    };

    run_with_input(&raw)
}

pub fn run_with_input(raw: &[u8]) -> CommandResult {
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

    let catalog = match build_provider(&config.catalog) {
        Ok(catalog) => catalog,
        Err(error) => {
            return CommandResult::failure(COMMAND, "catalog_config", error.to_string(), EXIT_CONFIG);
        }
    };

    let request = match parse_turn_payload(raw) {
        Ok(request) => request,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "malformed_turn",
                error.to_string(),
                EXIT_MALFORMED_TURN,
            );
        }
    };

    let runtime = match current_thread_runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let correlation_id = new_correlation_id();
    debug!(event_name = "cli.turn.dispatch", correlation_id = %correlation_id, "dispatching turn");

    let dispatcher = TurnDispatcher::from_config(&config, catalog, TracingAuditSink);
    let result = runtime.block_on(dispatcher.dispatch(request, &correlation_id));

    match result {
        Ok(response) => match serde_json::to_string(&response) {
            Ok(output) => CommandResult { exit_code: EXIT_OK, output },
            Err(error) => CommandResult::failure(
                COMMAND,
                "serialization",
                error.to_string(),
                EXIT_RUNTIME,
            ),
        },
        Err(error @ TurnError::UnsupportedIntent { .. }) => CommandResult::failure(
            COMMAND,
            "unsupported_intent",
            error.to_string(),
            EXIT_UNSUPPORTED_INTENT,
        ),
        Err(error @ TurnError::MalformedTurn(_)) => CommandResult::failure(
            COMMAND,
            "malformed_turn",
            error.to_string(),
            EXIT_MALFORMED_TURN,
        ),
        Err(error) => CommandResult::failure(COMMAND, "internal", error.to_string(), EXIT_RUNTIME),
    }
}

fn read_input(file: Option<&Path>) -> io::Result<Vec<u8>> {
    match file {
        Some(path) => fs::read(path),
        None => {
            let mut raw = Vec::new();
            io::stdin().read_to_end(&mut raw)?;
            Ok(raw)
        }
    }
}
