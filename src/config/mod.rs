//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{net::SocketAddr, str::FromStr, time::Duration};

use chrono_tz::Tz;
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

pub use cli::{CliArgs, Command, ServeArgs, ServeOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "blog-counters";
const ENV_PREFIX: &str = "BLOG_COUNTERS";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_TIMEZONE: Tz = Tz::UTC;
pub(crate) const DEFAULT_COOKIE_NAME: &str = "visitor_id";

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub store: StoreSettings,
    pub counters: CounterSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

/// `remote` is `None` when no credentials were supplied; counters then live
/// in process memory.
#[derive(Debug, Clone, Default)]
pub struct StoreSettings {
    pub remote: Option<RemoteStoreSettings>,
}

#[derive(Debug, Clone)]
pub struct RemoteStoreSettings {
    pub url: Url,
    pub token: String,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct CounterSettings {
    pub timezone: Tz,
    pub cookie_name: String,
    pub dedup_visits: bool,
}

impl Default for CounterSettings {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            dedup_visits: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    pub(crate) fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        None => raw.apply_serve_overrides(&ServeOverrides::from_env()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    store: RawStoreSettings,
    counters: RawCounterSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.store_url.as_ref() {
            self.store.url = Some(url.clone());
        }
        if let Some(token) = overrides.store_token.as_ref() {
            self.store.token = Some(token.clone());
        }
        if let Some(seconds) = overrides.store_timeout_seconds {
            self.store.timeout_seconds = Some(seconds);
        }
        if let Some(timezone) = overrides.counters_timezone.as_ref() {
            self.counters.timezone = Some(timezone.clone());
        }
        if let Some(name) = overrides.counters_cookie_name.as_ref() {
            self.counters.cookie_name = Some(name.clone());
        }
        if let Some(dedup) = overrides.counters_dedup_visits {
            self.counters.dedup_visits = Some(dedup);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            store,
            counters,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            store: build_store_settings(store)?,
            counters: build_counter_settings(counters)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    let graceful_shutdown = positive_seconds(graceful_secs, "server.graceful_shutdown_seconds")?;

    Ok(ServerSettings {
        addr,
        graceful_shutdown,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_store_settings(store: RawStoreSettings) -> Result<StoreSettings, LoadError> {
    let url = non_blank(store.url);
    let token = non_blank(store.token);

    let (url, token) = match (url, token) {
        (None, None) => return Ok(StoreSettings { remote: None }),
        (Some(url), Some(token)) => (url, token),
        (Some(_), None) => {
            return Err(LoadError::invalid(
                "store.token",
                "a token is required when a store url is configured",
            ));
        }
        (None, Some(_)) => {
            return Err(LoadError::invalid(
                "store.url",
                "a url is required when a store token is configured",
            ));
        }
    };

    let url = Url::parse(&url)
        .map_err(|err| LoadError::invalid("store.url", format!("failed to parse: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "store.url",
            format!("unsupported scheme `{}`", url.scheme()),
        ));
    }

    let timeout = store
        .timeout_seconds
        .map(|seconds| positive_seconds(seconds, "store.timeout_seconds"))
        .transpose()?;

    Ok(StoreSettings {
        remote: Some(RemoteStoreSettings {
            url,
            token,
            timeout,
        }),
    })
}

fn build_counter_settings(counters: RawCounterSettings) -> Result<CounterSettings, LoadError> {
    let timezone = match non_blank(counters.timezone) {
        Some(name) => Tz::from_str(&name).map_err(|err| {
            LoadError::invalid("counters.timezone", format!("unknown time zone: {err}"))
        })?,
        None => DEFAULT_TIMEZONE,
    };

    let cookie_name = match counters.cookie_name {
        Some(name) => {
            let name = name.trim().to_string();
            if !is_cookie_token(&name) {
                return Err(LoadError::invalid(
                    "counters.cookie_name",
                    "must be a non-empty cookie token",
                ));
            }
            name
        }
        None => DEFAULT_COOKIE_NAME.to_string(),
    };

    Ok(CounterSettings {
        timezone,
        cookie_name,
        dedup_visits: counters.dedup_visits.unwrap_or(true),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStoreSettings {
    url: Option<String>,
    token: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCounterSettings {
    timezone: Option<String>,
    cookie_name: Option<String>,
    dedup_visits: Option<bool>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn positive_seconds(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(value))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

// RFC 6265 cookie-name token: visible ASCII minus separators.
fn is_cookie_token(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|byte| {
            byte.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&byte)
        })
}

#[cfg(test)]
mod tests;
