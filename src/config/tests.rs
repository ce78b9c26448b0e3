use std::io::Write;

use super::*;

fn serve_with(overrides: ServeOverrides) -> Result<Settings, LoadError> {
    let mut raw = RawSettings::default();
    raw.apply_serve_overrides(&overrides);
    Settings::from_raw(raw)
}

#[test]
fn defaults_select_memory_store_and_utc() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.to_string(), "127.0.0.1:3000");
    assert_eq!(settings.server.graceful_shutdown, Duration::from_secs(30));
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert!(settings.store.remote.is_none());
    assert_eq!(settings.counters.timezone, Tz::UTC);
    assert_eq!(settings.counters.cookie_name, "visitor_id");
    assert!(settings.counters.dedup_visits);
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());
    raw.counters.timezone = Some("Europe/Berlin".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        counters_timezone: Some("Asia/Seoul".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.counters.timezone, chrono_tz::Asia::Seoul);
}

#[test]
fn cli_json_logging_enforces_format() {
    let settings = serve_with(ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    })
    .expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn url_and_token_select_remote_store() {
    let settings = serve_with(ServeOverrides {
        store_url: Some("https://eu1-example.upstash.io".to_string()),
        store_token: Some("secret".to_string()),
        store_timeout_seconds: Some(5),
        ..Default::default()
    })
    .expect("valid settings");

    let remote = settings.store.remote.expect("remote store");
    assert_eq!(remote.url.host_str(), Some("eu1-example.upstash.io"));
    assert_eq!(remote.token, "secret");
    assert_eq!(remote.timeout, Some(Duration::from_secs(5)));
}

#[test]
fn blank_credentials_count_as_absent() {
    let settings = serve_with(ServeOverrides {
        store_url: Some("   ".to_string()),
        store_token: Some(String::new()),
        ..Default::default()
    })
    .expect("valid settings");

    assert!(settings.store.remote.is_none());
}

#[test]
fn half_configured_store_is_rejected() {
    let err = serve_with(ServeOverrides {
        store_url: Some("https://eu1-example.upstash.io".to_string()),
        ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, LoadError::Invalid { key: "store.token", .. }));

    let err = serve_with(ServeOverrides {
        store_token: Some("secret".to_string()),
        ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, LoadError::Invalid { key: "store.url", .. }));
}

#[test]
fn store_url_must_be_http() {
    let err = serve_with(ServeOverrides {
        store_url: Some("redis://localhost:6379".to_string()),
        store_token: Some("secret".to_string()),
        ..Default::default()
    })
    .unwrap_err();

    assert!(matches!(err, LoadError::Invalid { key: "store.url", .. }));
}

#[test]
fn zero_durations_are_rejected() {
    let err = serve_with(ServeOverrides {
        server_graceful_shutdown_seconds: Some(0),
        ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "server.graceful_shutdown_seconds",
            ..
        }
    ));

    let err = serve_with(ServeOverrides {
        server_port: Some(0),
        ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, LoadError::Invalid { key: "server.port", .. }));
}

#[test]
fn unknown_timezone_is_rejected() {
    let err = serve_with(ServeOverrides {
        counters_timezone: Some("Mars/Olympus_Mons".to_string()),
        ..Default::default()
    })
    .unwrap_err();

    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "counters.timezone",
            ..
        }
    ));
}

#[test]
fn cookie_name_must_be_a_token() {
    let err = serve_with(ServeOverrides {
        counters_cookie_name: Some("visitor id".to_string()),
        ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "counters.cookie_name",
            ..
        }
    ));

    let settings = serve_with(ServeOverrides {
        counters_cookie_name: Some("bc_vid".to_string()),
        counters_dedup_visits: Some(false),
        ..Default::default()
    })
    .expect("valid settings");
    assert_eq!(settings.counters.cookie_name, "bc_vid");
    assert!(!settings.counters.dedup_visits);
}

#[test]
#[serial_test::serial]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["blog-counters"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
#[serial_test::serial]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "blog-counters",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--store-url",
        "https://example.upstash.io",
        "--counters-dedup-visits",
        "false",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(
                serve.overrides.store_url.as_deref(),
                Some("https://example.upstash.io")
            );
            assert_eq!(serve.overrides.counters_dedup_visits, Some(false));
        }
    }
}

const LAYERED_ENV: [(&str, &str); 3] = [
    ("BLOG_COUNTERS__SERVER__PORT", "4200"),
    ("UPSTASH_REDIS_REST_URL", "https://eu1.upstash.io"),
    ("UPSTASH_REDIS_REST_TOKEN", "from-env"),
];

#[test]
#[serial_test::serial]
fn load_layers_file_then_env_then_cli() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config file");
    writeln!(file, "[server]\nport = 4100\n\n[counters]\ncookie_name = \"reader\"")
        .expect("write config");
    let path = file.path().to_str().expect("utf-8 temp path").to_string();

    // SAFETY: every test touching the process environment runs serially.
    unsafe {
        for (key, value) in LAYERED_ENV {
            std::env::set_var(key, value);
        }
    }

    let from_env = load(&CliArgs::parse_from(["blog-counters", "--config-file", &path]));
    let from_cli = load(&CliArgs::parse_from([
        "blog-counters",
        "--config-file",
        &path,
        "serve",
        "--server-port",
        "4300",
    ]));

    unsafe {
        for (key, _) in LAYERED_ENV {
            std::env::remove_var(key);
        }
    }

    let settings = from_env.expect("layered settings");
    assert_eq!(settings.server.addr.port(), 4200);
    assert_eq!(settings.counters.cookie_name, "reader");
    let remote = settings.store.remote.expect("remote store from UPSTASH_*");
    assert_eq!(remote.url.as_str(), "https://eu1.upstash.io/");
    assert_eq!(remote.token, "from-env");

    let settings = from_cli.expect("layered settings");
    assert_eq!(settings.server.addr.port(), 4300);
    assert!(settings.store.remote.is_some());
}
