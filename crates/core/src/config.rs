use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::booking::policy::{
    BookingPolicy, FulfillmentMode, HourRange, OptionLabelStyle, DEFAULT_INTENT_NAME,
};
use crate::clock::BookingZone;

pub const CONFIG_FILE_NAME: &str = "boxoffice.toml";
pub const DEFAULT_BOOKING_TIMEZONE: &str = "America/New_York";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub booking: BookingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub source: CatalogSource,
    pub path: Option<PathBuf>,
    pub url: Option<String>,
    pub api_token: Option<SecretString>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingConfig {
    pub intent_name: String,
    pub allow_same_day_booking: bool,
    pub hour_range_min: Option<u32>,
    pub hour_range_max: Option<u32>,
    pub fulfillment: FulfillmentMode,
    pub option_labels: OptionLabelStyle,
    /// IANA zone used to decide what "today" is. `None` selects `utc_offset_minutes`.
    pub timezone: Option<String>,
    pub utc_offset_minutes: i32,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSource {
    Static,
    File,
    Http,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub catalog_source: Option<CatalogSource>,
    pub catalog_path: Option<PathBuf>,
    pub catalog_url: Option<String>,
    pub allow_same_day_booking: Option<bool>,
    pub fulfillment: Option<FulfillmentMode>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            source: CatalogSource::Static,
            path: None,
            url: None,
            api_token: None,
            timeout_secs: 5,
            max_retries: 1,
        }
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            intent_name: DEFAULT_INTENT_NAME.to_string(),
            allow_same_day_booking: true,
            hour_range_min: None,
            hour_range_max: None,
            fulfillment: FulfillmentMode::Immediate,
            option_labels: OptionLabelStyle::Label,
            timezone: Some(DEFAULT_BOOKING_TIMEZONE.to_string()),
            utc_offset_minutes: 0,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 8080 },
            catalog: CatalogConfig::default(),
            booking: BookingConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl BookingConfig {
    pub fn hour_range(&self) -> Option<HourRange> {
        match (self.hour_range_min, self.hour_range_max) {
            (Some(min), Some(max)) => Some(HourRange { min, max }),
            _ => None,
        }
    }

    pub fn zone(&self) -> Result<BookingZone, ConfigError> {
        match self.timezone.as_deref() {
            Some(name) => BookingZone::named(name)
                .map_err(|message| ConfigError::Validation(format!("booking.timezone: {message}"))),
            None => BookingZone::fixed_minutes(self.utc_offset_minutes)
                .filter(|_| (-720..=840).contains(&self.utc_offset_minutes))
                .ok_or_else(|| {
                    ConfigError::Validation(
                        "booking.utc_offset_minutes must be in range -720..=840".to_string(),
                    )
                }),
        }
    }
}

impl From<&BookingConfig> for BookingPolicy {
    fn from(config: &BookingConfig) -> Self {
        Self {
            allow_same_day_booking: config.allow_same_day_booking,
            enforce_hour_range: config.hour_range(),
            fulfillment: config.fulfillment,
            option_labels: config.option_labels,
        }
    }
}

impl std::str::FromStr for CatalogSource {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "file" => Ok(Self::File),
            "http" => Ok(Self::Http),
            other => Err(ConfigError::Validation(format!(
                "unsupported catalog source `{other}` (expected static|file|http)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(catalog) = patch.catalog {
            if let Some(source) = catalog.source {
                self.catalog.source = source;
            }
            if let Some(path) = catalog.path {
                self.catalog.path = Some(path);
            }
            if let Some(url) = catalog.url {
                self.catalog.url = Some(url);
            }
            if let Some(api_token) = catalog.api_token {
                self.catalog.api_token = Some(api_token.into());
            }
            if let Some(timeout_secs) = catalog.timeout_secs {
                self.catalog.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = catalog.max_retries {
                self.catalog.max_retries = max_retries;
            }
        }

        if let Some(booking) = patch.booking {
            if let Some(intent_name) = booking.intent_name {
                self.booking.intent_name = intent_name;
            }
            if let Some(allow_same_day_booking) = booking.allow_same_day_booking {
                self.booking.allow_same_day_booking = allow_same_day_booking;
            }
            if let Some(min) = booking.hour_range_min {
                self.booking.hour_range_min = Some(min);
            }
            if let Some(max) = booking.hour_range_max {
                self.booking.hour_range_max = Some(max);
            }
            if let Some(fulfillment) = booking.fulfillment {
                self.booking.fulfillment = fulfillment;
            }
            if let Some(option_labels) = booking.option_labels {
                self.booking.option_labels = option_labels;
            }
            if let Some(timezone) = booking.timezone {
                self.booking.timezone = non_blank(timezone);
            }
            if let Some(utc_offset_minutes) = booking.utc_offset_minutes {
                self.booking.utc_offset_minutes = utc_offset_minutes;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("BOXOFFICE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("BOXOFFICE_SERVER_PORT") {
            self.server.port = parse_env("BOXOFFICE_SERVER_PORT", &value)?;
        }

        if let Some(value) = read_env("BOXOFFICE_CATALOG_SOURCE") {
            self.catalog.source = value.parse()?;
        }
        if let Some(value) = read_env("BOXOFFICE_CATALOG_PATH") {
            self.catalog.path = Some(PathBuf::from(value));
        }
        if let Some(value) = read_env("BOXOFFICE_CATALOG_URL") {
            self.catalog.url = Some(value);
        }
        if let Some(value) = read_env("BOXOFFICE_CATALOG_API_TOKEN") {
            self.catalog.api_token = Some(value.into());
        }
        if let Some(value) = read_env("BOXOFFICE_CATALOG_TIMEOUT_SECS") {
            self.catalog.timeout_secs = parse_env("BOXOFFICE_CATALOG_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("BOXOFFICE_CATALOG_MAX_RETRIES") {
            self.catalog.max_retries = parse_env("BOXOFFICE_CATALOG_MAX_RETRIES", &value)?;
        }

        if let Some(value) = read_env("BOXOFFICE_BOOKING_INTENT_NAME") {
            self.booking.intent_name = value;
        }
        if let Some(value) = read_env("BOXOFFICE_BOOKING_ALLOW_SAME_DAY") {
            self.booking.allow_same_day_booking =
                parse_env("BOXOFFICE_BOOKING_ALLOW_SAME_DAY", &value)?;
        }
        if let Some(value) = read_env("BOXOFFICE_BOOKING_HOUR_RANGE_MIN") {
            self.booking.hour_range_min =
                Some(parse_env("BOXOFFICE_BOOKING_HOUR_RANGE_MIN", &value)?);
        }
        if let Some(value) = read_env("BOXOFFICE_BOOKING_HOUR_RANGE_MAX") {
            self.booking.hour_range_max =
                Some(parse_env("BOXOFFICE_BOOKING_HOUR_RANGE_MAX", &value)?);
        }
        if let Some(value) = read_env("BOXOFFICE_BOOKING_FULFILLMENT") {
            self.booking.fulfillment = value.parse().map_err(ConfigError::Validation)?;
        }
        if let Some(value) = read_env("BOXOFFICE_BOOKING_OPTION_LABELS") {
            self.booking.option_labels = value.parse().map_err(ConfigError::Validation)?;
        }
        if let Some(value) = read_env("BOXOFFICE_BOOKING_TIMEZONE") {
            self.booking.timezone = Some(value.trim().to_string());
        }
        if let Some(value) = read_env("BOXOFFICE_BOOKING_UTC_OFFSET_MINUTES") {
            self.booking.utc_offset_minutes =
                parse_env("BOXOFFICE_BOOKING_UTC_OFFSET_MINUTES", &value)?;
        }

        let log_level =
            read_env("BOXOFFICE_LOGGING_LEVEL").or_else(|| read_env("BOXOFFICE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("BOXOFFICE_LOGGING_FORMAT").or_else(|| read_env("BOXOFFICE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(source) = overrides.catalog_source {
            self.catalog.source = source;
        }
        if let Some(path) = overrides.catalog_path {
            self.catalog.path = Some(path);
        }
        if let Some(url) = overrides.catalog_url {
            self.catalog.url = Some(url);
        }
        if let Some(allow_same_day_booking) = overrides.allow_same_day_booking {
            self.booking.allow_same_day_booking = allow_same_day_booking;
        }
        if let Some(fulfillment) = overrides.fulfillment {
            self.booking.fulfillment = fulfillment;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_server(&self.server)?;
        validate_catalog(&self.catalog)?;
        validate_booking(&self.booking)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(CONFIG_FILE_NAME), Path::new("config").join(CONFIG_FILE_NAME)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }
    Ok(())
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if catalog.timeout_secs == 0 || catalog.timeout_secs > 60 {
        return Err(ConfigError::Validation(
            "catalog.timeout_secs must be in range 1..=60".to_string(),
        ));
    }
    if catalog.max_retries > 5 {
        return Err(ConfigError::Validation(
            "catalog.max_retries must be in range 0..=5".to_string(),
        ));
    }

    match catalog.source {
        CatalogSource::Static => {}
        CatalogSource::File => {
            if catalog.path.is_none() {
                return Err(ConfigError::Validation(
                    "catalog.path is required when catalog.source = \"file\"".to_string(),
                ));
            }
        }
        CatalogSource::Http => {
            let Some(url) = catalog.url.as_deref() else {
                return Err(ConfigError::Validation(
                    "catalog.url is required when catalog.source = \"http\"".to_string(),
                ));
            };
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::Validation(
                    "catalog.url must start with http:// or https://".to_string(),
                ));
            }
        }
    }

    Ok(())
}

fn validate_booking(booking: &BookingConfig) -> Result<(), ConfigError> {
    if booking.intent_name.trim().is_empty() {
        return Err(ConfigError::Validation("booking.intent_name must not be empty".to_string()));
    }

    match (booking.hour_range_min, booking.hour_range_max) {
        (None, None) => {}
        (Some(min), Some(max)) => {
            if max > 23 || min > max {
                return Err(ConfigError::Validation(
                    "booking hour range must satisfy hour_range_min <= hour_range_max <= 23"
                        .to_string(),
                ));
            }
        }
        _ => {
            return Err(ConfigError::Validation(
                "booking.hour_range_min and booking.hour_range_max must be set together"
                    .to_string(),
            ));
        }
    }

    booking.zone().map(|_| ())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

/// An empty `timezone = ""` in the file switches to the fixed offset.
fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    catalog: Option<CatalogPatch>,
    booking: Option<BookingPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    source: Option<CatalogSource>,
    path: Option<PathBuf>,
    url: Option<String>,
    api_token: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct BookingPatch {
    intent_name: Option<String>,
    allow_same_day_booking: Option<bool>,
    hour_range_min: Option<u32>,
    hour_range_max: Option<u32>,
    fulfillment: Option<FulfillmentMode>,
    option_labels: Option<OptionLabelStyle>,
    timezone: Option<String>,
    utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
