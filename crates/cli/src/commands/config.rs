use std::env;
use std::fs;
use std::path::Path;

use boxoffice_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let booking = &config.booking;
    let optional_hour = |hour: Option<u32>| hour.map_or_else(|| "<unset>".to_string(), |h| h.to_string());

    let rows = [
        ("server.bind_address", config.server.bind_address.clone(), vec!["BOXOFFICE_SERVER_BIND_ADDRESS"]),
        ("server.port", config.server.port.to_string(), vec!["BOXOFFICE_SERVER_PORT"]),
        ("catalog.source", format!("{:?}", config.catalog.source), vec!["BOXOFFICE_CATALOG_SOURCE"]),
        (
            "catalog.path",
            config
                .catalog
                .path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |path| path.display().to_string()),
            vec!["BOXOFFICE_CATALOG_PATH"],
        ),
        (
            "catalog.url",
            config.catalog.url.clone().unwrap_or_else(|| "<unset>".to_string()),
            vec!["BOXOFFICE_CATALOG_URL"],
        ),
        (
            "catalog.api_token",
            redact_token(config.catalog.api_token.as_ref()),
            vec!["BOXOFFICE_CATALOG_API_TOKEN"],
        ),
        (
            "catalog.timeout_secs",
            config.catalog.timeout_secs.to_string(),
            vec!["BOXOFFICE_CATALOG_TIMEOUT_SECS"],
        ),
        (
            "catalog.max_retries",
            config.catalog.max_retries.to_string(),
            vec!["BOXOFFICE_CATALOG_MAX_RETRIES"],
        ),
        ("booking.intent_name", booking.intent_name.clone(), vec!["BOXOFFICE_BOOKING_INTENT_NAME"]),
        (
            "booking.allow_same_day_booking",
            booking.allow_same_day_booking.to_string(),
            vec!["BOXOFFICE_BOOKING_ALLOW_SAME_DAY"],
        ),
        (
            "booking.hour_range_min",
            optional_hour(booking.hour_range_min),
            vec!["BOXOFFICE_BOOKING_HOUR_RANGE_MIN"],
        ),
        (
            "booking.hour_range_max",
            optional_hour(booking.hour_range_max),
            vec!["BOXOFFICE_BOOKING_HOUR_RANGE_MAX"],
        ),
        ("booking.fulfillment", format!("{:?}", booking.fulfillment), vec!["BOXOFFICE_BOOKING_FULFILLMENT"]),
        (
            "booking.option_labels",
            format!("{:?}", booking.option_labels),
            vec!["BOXOFFICE_BOOKING_OPTION_LABELS"],
        ),
        (
            "booking.timezone",
            booking.timezone.clone().unwrap_or_else(|| "<unset>".to_string()),
            vec!["BOXOFFICE_BOOKING_TIMEZONE"],
        ),
        (
            "booking.utc_offset_minutes",
            booking.utc_offset_minutes.to_string(),
            vec!["BOXOFFICE_BOOKING_UTC_OFFSET_MINUTES"],
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            vec!["BOXOFFICE_LOGGING_LEVEL", "BOXOFFICE_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            vec!["BOXOFFICE_LOGGING_FORMAT", "BOXOFFICE_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_keys) in rows {
        lines.push(render_line(key, &value, source(key, &env_keys)));
    }

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_token(token: Option<&SecretString>) -> String {
    let Some(token) = token else {
        return "<unset>".to_string();
    };
    let trimmed = token.expose_secret().trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
