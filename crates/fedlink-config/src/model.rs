// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Fedlink federation subsystem.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use fedlink_core::DiscoveryPolicy;
use serde::{Deserialize, Serialize};

/// Top-level Fedlink configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FedlinkConfig {
    /// Node identity and logging.
    #[serde(default)]
    pub node: NodeConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Follower/following discovery settings.
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Outbound delivery queue settings.
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

/// Node identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    /// Display name of this node, used in log output.
    #[serde(default = "default_node_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: default_node_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_node_name() -> String {
    "fedlink".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("fedlink").join("fedlink.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("fedlink.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Follower/following discovery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Which contacts may be crawled at all.
    #[serde(default)]
    pub policy: DiscoveryPolicy,

    /// Minimum number of days between two crawls of the same contact.
    #[serde(default = "default_refresh_interval_days")]
    pub refresh_interval_days: u32,

    /// Contacts younger than this are never crawled under the `all` policy.
    #[serde(default = "default_new_contact_grace_hours")]
    pub new_contact_grace_hours: u32,

    /// Upper bound for each remote fetch made during a crawl.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            policy: DiscoveryPolicy::default(),
            refresh_interval_days: default_refresh_interval_days(),
            new_contact_grace_hours: default_new_contact_grace_hours(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

fn default_refresh_interval_days() -> u32 {
    30
}

fn default_new_contact_grace_hours() -> u32 {
    24
}

fn default_fetch_timeout_secs() -> u64 {
    20
}

/// Outbound delivery queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeliveryConfig {
    /// Maximum pending direct (per-recipient) messages per contact.
    #[serde(default = "default_direct_queue_ceiling")]
    pub direct_queue_ceiling: u32,

    /// Maximum pending batch (shared inbox) messages per contact.
    #[serde(default = "default_batch_queue_ceiling")]
    pub batch_queue_ceiling: u32,

    /// A queue attempt within this window marks the contact as recently delayed.
    #[serde(default = "default_delay_window_mins")]
    pub delay_window_mins: u32,

    /// Keep retrying contacts that have been archived as dead.
    #[serde(default)]
    pub ignore_dead_contacts: bool,

    /// Days of continuous failure after which a contact is archived.
    #[serde(default = "default_archive_after_days")]
    pub archive_after_days: u32,

    /// Upper bound for the exponential retry backoff.
    #[serde(default = "default_backoff_cap_mins")]
    pub backoff_cap_mins: u32,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            direct_queue_ceiling: default_direct_queue_ceiling(),
            batch_queue_ceiling: default_batch_queue_ceiling(),
            delay_window_mins: default_delay_window_mins(),
            ignore_dead_contacts: false,
            archive_after_days: default_archive_after_days(),
            backoff_cap_mins: default_backoff_cap_mins(),
        }
    }
}

fn default_direct_queue_ceiling() -> u32 {
    500
}

fn default_batch_queue_ceiling() -> u32 {
    1000
}

fn default_delay_window_mins() -> u32 {
    15
}

fn default_archive_after_days() -> u32 {
    32
}

fn default_backoff_cap_mins() -> u32 {
    60
}
