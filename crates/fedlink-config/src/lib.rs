// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Fedlink federation subsystem.
//!
//! TOML files are layered (system, user, local) with `FEDLINK_*` environment
//! overrides, rejected on unknown keys, and validated after deserialization.
//! Errors are rendered as miette diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use fedlink_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("direct ceiling: {}", config.delivery.direct_queue_ceiling);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::{Path, PathBuf};

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{DeliveryConfig, DiscoveryConfig, FedlinkConfig, NodeConfig, StorageConfig};

/// Load configuration from the standard file hierarchy and validate it.
pub fn load_and_validate() -> Result<FedlinkConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_toml_sources)
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<FedlinkConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        read_sources([path.to_path_buf()])
    })
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<FedlinkConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

fn finish(
    loaded: Result<FedlinkConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<FedlinkConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Contents of every config file that exists, keyed by the path figment reports.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut candidates = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join("fedlink.toml"));
    }
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("fedlink/fedlink.toml"));
    }
    candidates.push(PathBuf::from("/etc/fedlink/fedlink.toml"));
    read_sources(candidates)
}

fn read_sources(paths: impl IntoIterator<Item = PathBuf>) -> Vec<(String, String)> {
    paths
        .into_iter()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}
