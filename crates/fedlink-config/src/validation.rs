// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty paths, non-zero ceilings, and known log levels.

use crate::diagnostic::ConfigError;
use crate::model::FedlinkConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Upper bounds for the time windows, keeping timestamp arithmetic in range.
const MAX_REFRESH_INTERVAL_DAYS: u32 = 3650;
const MAX_NEW_CONTACT_GRACE_HOURS: u32 = 8760;
const MAX_DELAY_WINDOW_MINS: u32 = 1440;
const MAX_ARCHIVE_AFTER_DAYS: u32 = 3650;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &FedlinkConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.node.log_level.trim()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "node.log_level `{}` must be one of {}",
                config.node.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    let discovery = &config.discovery;
    if discovery.refresh_interval_days == 0 {
        errors.push(ConfigError::Validation {
            message: "discovery.refresh_interval_days must be at least 1".to_string(),
        });
    }

    for (name, value, max) in [
        (
            "discovery.refresh_interval_days",
            discovery.refresh_interval_days,
            MAX_REFRESH_INTERVAL_DAYS,
        ),
        (
            "discovery.new_contact_grace_hours",
            discovery.new_contact_grace_hours,
            MAX_NEW_CONTACT_GRACE_HOURS,
        ),
        (
            "delivery.delay_window_mins",
            config.delivery.delay_window_mins,
            MAX_DELAY_WINDOW_MINS,
        ),
        (
            "delivery.archive_after_days",
            config.delivery.archive_after_days,
            MAX_ARCHIVE_AFTER_DAYS,
        ),
    ] {
        if value > max {
            errors.push(ConfigError::Validation {
                message: format!("{name} must be at most {max}, got {value}"),
            });
        }
    }

    if discovery.fetch_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "discovery.fetch_timeout_secs must be at least 1".to_string(),
        });
    }

    let delivery = &config.delivery;
    for (name, value) in [
        ("delivery.direct_queue_ceiling", delivery.direct_queue_ceiling),
        ("delivery.batch_queue_ceiling", delivery.batch_queue_ceiling),
        ("delivery.delay_window_mins", delivery.delay_window_mins),
        ("delivery.archive_after_days", delivery.archive_after_days),
        ("delivery.backoff_cap_mins", delivery.backoff_cap_mins),
    ] {
        if value == 0 {
            errors.push(ConfigError::Validation {
                message: format!("{name} must be at least 1, got 0"),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
