// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Fedlink configuration system.

use fedlink_config::diagnostic::ConfigError;
use fedlink_config::model::FedlinkConfig;
use fedlink_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};
use fedlink_core::DiscoveryPolicy;

#[test]
fn full_config_deserializes() {
    let toml = r#"
[node]
name = "relay-1"
log_level = "debug"

[storage]
database_path = "/tmp/fedlink-test.db"
wal_mode = false

[discovery]
policy = "local_only"
refresh_interval_days = 7
new_contact_grace_hours = 2
fetch_timeout_secs = 5

[delivery]
direct_queue_ceiling = 50
batch_queue_ceiling = 80
delay_window_mins = 10
ignore_dead_contacts = true
archive_after_days = 14
backoff_cap_mins = 120
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.node.name, "relay-1");
    assert_eq!(config.node.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/fedlink-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.discovery.policy, DiscoveryPolicy::LocalOnly);
    assert_eq!(config.discovery.refresh_interval_days, 7);
    assert_eq!(config.discovery.new_contact_grace_hours, 2);
    assert_eq!(config.discovery.fetch_timeout_secs, 5);
    assert_eq!(config.delivery.direct_queue_ceiling, 50);
    assert_eq!(config.delivery.batch_queue_ceiling, 80);
    assert_eq!(config.delivery.delay_window_mins, 10);
    assert!(config.delivery.ignore_dead_contacts);
    assert_eq!(config.delivery.archive_after_days, 14);
    assert_eq!(config.delivery.backoff_cap_mins, 120);
}

#[test]
fn empty_config_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.node.name, "fedlink");
    assert_eq!(config.node.log_level, "info");
    assert!(config.storage.wal_mode);
    assert_eq!(config.discovery.policy, DiscoveryPolicy::LocalOrInteractor);
    assert_eq!(config.discovery.refresh_interval_days, 30);
    assert_eq!(config.discovery.new_contact_grace_hours, 24);
    assert_eq!(config.delivery.direct_queue_ceiling, 500);
    assert_eq!(config.delivery.batch_queue_ceiling, 1000);
    assert_eq!(config.delivery.archive_after_days, 32);
}

#[test]
fn dotted_override_wins_over_toml() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let toml_content = r#"
[delivery]
direct_queue_ceiling = 300
"#;

    // Stands in for FEDLINK_DELIVERY_DIRECT_QUEUE_CEILING=10.
    let config: FedlinkConfig = Figment::new()
        .merge(Serialized::defaults(FedlinkConfig::default()))
        .merge(Toml::string(toml_content))
        .merge(("delivery.direct_queue_ceiling", 10))
        .extract()
        .expect("should merge override");

    assert_eq!(config.delivery.direct_queue_ceiling, 10);
    assert_eq!(config.delivery.batch_queue_ceiling, 1000);
}

#[test]
fn missing_config_file_is_skipped() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let config: FedlinkConfig = Figment::new()
        .merge(Serialized::defaults(FedlinkConfig::default()))
        .merge(Toml::file("/nonexistent/path/fedlink.toml"))
        .extract()
        .expect("missing file should be silently skipped");

    assert_eq!(config.node.name, "fedlink");
}

#[test]
fn unknown_top_level_section_is_rejected() {
    let toml = r#"
[metrics]
enabled = true
"#;

    let err = load_config_from_str(toml).expect_err("unknown section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("metrics"),
        "error should mention the unknown section, got: {err_str}"
    );
}

#[test]
fn unknown_key_gets_suggestion_and_valid_keys() {
    let toml = r#"
[discovery]
polcy = "all"
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "polcy"
                && suggestion.as_deref() == Some("policy")
                && valid_keys.contains("refresh_interval_days")
        })
    });
    assert!(found, "expected UnknownKey for `polcy`, got: {errors:?}");
}

#[test]
fn wrong_type_for_ceiling_is_reported() {
    let toml = r#"
[delivery]
direct_queue_ceiling = "many"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject invalid type");
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::InvalidType { key, .. } if key.contains("direct_queue_ceiling"))
    });
    assert!(found, "expected InvalidType for the ceiling, got: {errors:?}");
}

#[test]
fn validation_collects_every_problem() {
    let toml = r#"
[node]
log_level = "loud"

[delivery]
direct_queue_ceiling = 0
batch_queue_ceiling = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("zero ceilings should fail");
    let messages: Vec<String> = errors
        .iter()
        .filter_map(|e| match e {
            ConfigError::Validation { message } => Some(message.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(messages.len(), 3, "got: {messages:?}");
    assert!(messages.iter().any(|m| m.contains("node.log_level")));
    assert!(messages.iter().any(|m| m.contains("direct_queue_ceiling")));
    assert!(messages.iter().any(|m| m.contains("batch_queue_ceiling")));
}

#[test]
fn unbounded_refresh_interval_is_rejected() {
    let toml = "[discovery]\nrefresh_interval_days = 4294967295\n";
    let errors = load_and_validate_str(toml).expect_err("refresh interval out of range");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::Validation { message } if message.contains("discovery.refresh_interval_days")
    )));
}

#[test]
fn unknown_key_in_file_carries_source_span() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fedlink.toml");
    std::fs::write(&path, "[delivery]\ndirect_queue_cieling = 3\n").unwrap();

    let errors = load_and_validate_path(&path).expect_err("typo should be rejected");
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, span: Some(_), src: Some(_), .. }
            if key == "direct_queue_cieling")
    });
    assert!(found, "expected a spanned UnknownKey, got: {errors:?}");
}

#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "polcy".to_string(),
        suggestion: Some("policy".to_string()),
        valid_keys: "policy, refresh_interval_days".to_string(),
        span: None,
        src: None,
    };

    assert!(error.code().is_some());
    let help = error.help().map(|h| h.to_string()).unwrap_or_default();
    assert!(help.contains("did you mean `policy`"), "got: {help}");

    let mut buf = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut buf, &error)
        .expect("should render");
    assert!(buf.contains("polcy"));
}

#[test]
#[serial_test::serial]
fn env_var_overrides_file_value() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fedlink.toml");
    std::fs::write(&path, "[delivery]\nbatch_queue_ceiling = 900\n").unwrap();

    // SAFETY: serialized with every other test touching the environment.
    unsafe { std::env::set_var("FEDLINK_DELIVERY_BATCH_QUEUE_CEILING", "25") };
    let result = load_and_validate_path(&path);
    unsafe { std::env::remove_var("FEDLINK_DELIVERY_BATCH_QUEUE_CEILING") };

    let config = result.expect("env override should validate");
    assert_eq!(config.delivery.batch_queue_ceiling, 25);
}
