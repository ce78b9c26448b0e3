use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the blog counters binary.
#[derive(Debug, Parser)]
#[command(
    name = "blog-counters",
    version,
    about = "Page-view and site-visit counters for a blog"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "BLOG_COUNTERS_CONFIG_FILE",
        value_name = "PATH"
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the counter HTTP service.
    Serve(Box<ServeArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Upstash REST endpoint. Leave unset to count in memory.
    #[arg(long = "store-url", env = "UPSTASH_REDIS_REST_URL", value_name = "URL")]
    pub store_url: Option<String>,

    /// Upstash REST bearer token.
    #[arg(
        long = "store-token",
        env = "UPSTASH_REDIS_REST_TOKEN",
        value_name = "TOKEN",
        hide_env_values = true
    )]
    pub store_token: Option<String>,

    /// Per-request timeout for store calls.
    #[arg(long = "store-timeout-seconds", value_name = "SECONDS")]
    pub store_timeout_seconds: Option<u64>,

    /// IANA time zone used for day and hour buckets.
    #[arg(long = "counters-timezone", value_name = "TZ")]
    pub counters_timezone: Option<String>,

    /// Name of the visitor id cookie.
    #[arg(long = "counters-cookie-name", value_name = "NAME")]
    pub counters_cookie_name: Option<String>,

    /// Count each visitor at most once per day.
    #[arg(
        long = "counters-dedup-visits",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub counters_dedup_visits: Option<bool>,
}

impl ServeOverrides {
    /// Overrides sourced only from their environment variables, used when the
    /// binary runs without an explicit subcommand.
    pub fn from_env() -> Self {
        EnvOverrides::parse_from([env!("CARGO_PKG_NAME")]).overrides
    }
}

#[derive(Debug, Parser)]
struct EnvOverrides {
    #[command(flatten)]
    overrides: ServeOverrides,
}
