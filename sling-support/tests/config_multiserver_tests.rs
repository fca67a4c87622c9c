use std::env;
use std::panic::{self, AssertUnwindSafe};

use serial_test::serial;

use sling_support::AppConfig;
use sling_support::config::Protocol;

fn clear_sling_env() {
    let keys: Vec<String> = env::vars()
        .filter_map(
            |(k, _)| {
                if k.starts_with("SLING_") { Some(k) } else { None }
            },
        )
        .collect();
    for k in keys {
        unsafe {
            env::remove_var(k);
        }
    }
}

fn set_env(k: &str, v: &str) {
    unsafe {
        env::set_var(k, v);
    }
}

#[test]
#[serial]
fn env_list_multiple_servers_with_default() {
    clear_sling_env();
    set_env("SLING_SERVERS", "author,publish,edge-eu");
    set_env("SLING_DEFAULT_SERVER", "author");

    // author relies on conventional defaults entirely
    // publish overrides host/port/credentials and is inactive
    set_env("SLING_SERVER_PUBLISH_HOST", "publish.example");
    set_env("SLING_SERVER_PUBLISH_PORT", "4503");
    set_env("SLING_SERVER_PUBLISH_USERNAME", "deployer");
    set_env("SLING_SERVER_PUBLISH_PASSWORD", "hunter2");
    set_env("SLING_SERVER_PUBLISH_ACTIVE", "false");
    set_env("SLING_SERVER_PUBLISH_TIMEOUT", "90");
    set_env("SLING_SERVER_PUBLISH_RETRY_ATTEMPTS", "7");

    // edge-eu uses a sanitized env suffix and https
    set_env("SLING_SERVER_EDGE_EU_HOST", "edge.example");
    set_env("SLING_SERVER_EDGE_EU_PROTOCOL", "https");

    let cfg = AppConfig::load_from_env().expect("load env");
    let sling = cfg.sling();

    assert_eq!(sling.servers.len(), 3);
    assert_eq!(sling.default_server.as_deref(), Some("author"));

    let author = sling.servers.get("author").expect("author server");
    assert_eq!(author.machine_name, "localhost");
    assert_eq!(author.port, 4502);
    assert_eq!(author.username, "admin");
    assert!(author.active);
    assert_eq!(author.timeout, Some(30));
    assert_eq!(author.retry_attempts, 3);

    let publish = sling.servers.get("publish").expect("publish server");
    assert_eq!(publish.machine_name, "publish.example");
    assert_eq!(publish.port, 4503);
    assert_eq!(publish.username, "deployer");
    assert_eq!(publish.password, "hunter2");
    assert!(!publish.active);
    assert_eq!(publish.timeout, Some(90));
    assert_eq!(publish.retry_attempts, 7);

    let edge = sling.servers.get("edge-eu").expect("edge-eu server");
    assert_eq!(edge.protocol, Protocol::Https);
    assert_eq!(edge.machine_name, "edge.example");

    clear_sling_env();
}

#[test]
#[serial]
fn unknown_declared_default_falls_back() {
    clear_sling_env();
    set_env("SLING_SERVERS", "author");
    set_env("SLING_DEFAULT_SERVER", "nonexistent");

    let cfg = AppConfig::load_from_env().expect("load env");
    let sling = cfg.sling();

    // Falls back: no server literally named "default", so none declared
    assert!(sling.default_server.is_none());
    assert_eq!(sling.servers.len(), 1);

    clear_sling_env();
}

#[test]
#[serial]
fn json_object_form() {
    clear_sling_env();
    set_env(
        "SLING_SERVERS_JSON",
        r#"{
            "author": {"host": "author.example"},
            "publish": {"host": "publish.example", "port": 4503,
                        "protocol": "https", "active": false,
                        "username": "deployer", "timeout": 10,
                        "retry_attempts": 5}
        }"#,
    );

    let cfg = AppConfig::load_from_env().expect("load env");
    let sling = cfg.sling();

    assert_eq!(sling.servers.len(), 2);
    let author = sling.servers.get("author").expect("author");
    assert_eq!(author.machine_name, "author.example");
    assert_eq!(author.port, 4502);

    let publish = sling.servers.get("publish").expect("publish");
    assert_eq!(publish.protocol, Protocol::Https);
    assert_eq!(publish.port, 4503);
    assert!(!publish.active);
    assert_eq!(publish.username, "deployer");
    assert_eq!(publish.timeout, Some(10));
    assert_eq!(publish.retry_attempts, 5);

    clear_sling_env();
}

#[test]
#[serial]
fn json_array_form_requires_name() {
    clear_sling_env();
    set_env(
        "SLING_SERVERS_JSON",
        r#"[{"name": "author", "host": "author.example"}]"#,
    );

    let cfg = AppConfig::load_from_env().expect("load env");
    let sling = cfg.sling();
    assert!(sling.servers.contains_key("author"));

    // Array element without a name must be rejected
    set_env("SLING_SERVERS_JSON", r#"[{"host": "author.example"}]"#);
    let cfg = AppConfig::load_from_env().expect("load env");
    let result = panic::catch_unwind(AssertUnwindSafe(|| cfg.sling()));
    assert!(result.is_err());

    clear_sling_env();
}

#[test]
#[serial]
fn json_takes_precedence_over_env_list() {
    clear_sling_env();
    set_env("SLING_SERVERS", "publish");
    set_env("SLING_SERVER_PUBLISH_HOST", "publish.example");
    set_env("SLING_SERVERS_JSON", r#"{"author": {}}"#);

    let cfg = AppConfig::load_from_env().expect("load env");
    let sling = cfg.sling();

    assert_eq!(sling.servers.len(), 1);
    assert!(sling.servers.contains_key("author"));

    clear_sling_env();
}

#[test]
#[serial]
fn invalid_json_panics() {
    clear_sling_env();
    set_env("SLING_SERVERS_JSON", "{not json");

    let cfg = AppConfig::load_from_env().expect("load env");
    let result = panic::catch_unwind(AssertUnwindSafe(|| cfg.sling()));
    assert!(result.is_err());

    clear_sling_env();
}

#[test]
#[serial]
fn invalid_server_name_rejected() {
    clear_sling_env();
    set_env("SLING_SERVERS", "bad name!");

    let cfg = AppConfig::load_from_env().expect("load env");
    let result = panic::catch_unwind(AssertUnwindSafe(|| cfg.sling()));
    assert!(result.is_err());

    clear_sling_env();
}

#[test]
#[serial]
fn duplicate_server_name_in_list_rejected() {
    clear_sling_env();
    set_env("SLING_SERVERS", "author,author");

    let cfg = AppConfig::load_from_env().expect("load env");
    let result = panic::catch_unwind(AssertUnwindSafe(|| cfg.sling()));
    assert!(result.is_err());

    clear_sling_env();
}

#[test]
#[serial]
fn duplicate_server_name_in_json_rejected() {
    clear_sling_env();
    set_env(
        "SLING_SERVERS_JSON",
        r#"[{"name": "author"},
            {"name": "author", "host": "other.example"}]"#,
    );

    let cfg = AppConfig::load_from_env().expect("load env");
    let result = panic::catch_unwind(AssertUnwindSafe(|| cfg.sling()));
    assert!(result.is_err());

    clear_sling_env();
}

#[test]
#[serial]
fn empty_server_list_rejected() {
    clear_sling_env();
    set_env("SLING_SERVERS", " , ,");

    let cfg = AppConfig::load_from_env().expect("load env");
    let result = panic::catch_unwind(AssertUnwindSafe(|| cfg.sling()));
    assert!(result.is_err());

    clear_sling_env();
}

#[test]
#[serial]
fn unsupported_protocol_rejected() {
    clear_sling_env();
    set_env("SLING_SERVERS", "author");
    set_env("SLING_SERVER_AUTHOR_PROTOCOL", "gopher");

    let cfg = AppConfig::load_from_env().expect("load env");
    let result = panic::catch_unwind(AssertUnwindSafe(|| cfg.sling()));
    assert!(result.is_err());

    clear_sling_env();
}
