// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./fedlink.toml` > `~/.config/fedlink/fedlink.toml` > `/etc/fedlink/fedlink.toml`
//! with environment variable overrides via `FEDLINK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::FedlinkConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/fedlink/fedlink.toml` (system-wide)
/// 3. `~/.config/fedlink/fedlink.toml` (user XDG config)
/// 4. `./fedlink.toml` (local directory)
/// 5. `FEDLINK_*` environment variables
pub fn load_config() -> Result<FedlinkConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<FedlinkConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FedlinkConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FedlinkConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FedlinkConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(FedlinkConfig::default()))
        .merge(Toml::file("/etc/fedlink/fedlink.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("fedlink/fedlink.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("fedlink.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `FEDLINK_DELIVERY_DIRECT_QUEUE_CEILING` must map to
/// `delivery.direct_queue_ceiling`, not `delivery.direct.queue.ceiling`.
fn env_provider() -> Env {
    Env::prefixed("FEDLINK_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name to its dotted config path.
fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 4] = ["node", "storage", "discovery", "delivery"];
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
