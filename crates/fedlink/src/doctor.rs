// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `fedlink doctor` command implementation.
//!
//! Runs diagnostic checks against the configuration and the database and
//! prints one line per check.

use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use fedlink_config::FedlinkConfig;
use fedlink_core::{DiscoveryPolicy, FedlinkError, HealthStatus, PluginAdapter};
use fedlink_storage::queries::contacts;

use crate::inspect::open_storage;

/// Status of a diagnostic check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: &'static str,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &'static str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name,
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run all checks and print them. Returns the number of failed checks.
pub async fn run_doctor(
    config: &FedlinkConfig,
    config_path: Option<&Path>,
    plain: bool,
) -> Result<usize, FedlinkError> {
    let use_color = !plain && std::io::stdout().is_terminal();

    let mut results = vec![check_config(config_path)];
    results.extend(check_settings(config));
    results.push(check_database(config).await);

    println!();
    println!("  fedlink doctor");
    println!("  {}", "-".repeat(50));
    for result in &results {
        println!("{}", render_line(result, use_color));
    }
    println!();

    let failed = results.iter().filter(|r| r.status == CheckStatus::Fail).count();
    let warned = results.iter().filter(|r| r.status == CheckStatus::Warn).count();
    match failed + warned {
        0 => println!("  All checks passed."),
        1 => println!("  1 issue found."),
        n => println!("  {n} issues found."),
    }
    println!();

    Ok(failed)
}

fn render_line(result: &CheckResult, use_color: bool) -> String {
    let ms = result.duration.as_millis();
    if !use_color {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        return format!("    {tag} {:<16} {} ({ms}ms)", result.name, result.message);
    }

    use colored::Colorize;
    let (symbol, message) = match result.status {
        CheckStatus::Pass => ("✓".green(), result.message.normal()),
        CheckStatus::Warn => ("!".yellow(), result.message.yellow()),
        CheckStatus::Fail => ("✗".red(), result.message.red()),
    };
    format!("    {symbol} {:<16} {message} ({ms}ms)", result.name)
}

/// Re-read the configuration to report how it was resolved.
fn check_config(path: Option<&Path>) -> CheckResult {
    let start = Instant::now();
    let loaded = match path {
        Some(path) => fedlink_config::load_and_validate_path(path),
        None => fedlink_config::load_and_validate(),
    };
    match loaded {
        Ok(_) => {
            let source = path.map_or_else(|| "search path".to_string(), |p| p.display().to_string());
            CheckResult::new("Configuration", CheckStatus::Pass, format!("valid ({source})"), start)
        }
        Err(errors) => CheckResult::new(
            "Configuration",
            CheckStatus::Fail,
            format!("{} error(s)", errors.len()),
            start,
        ),
    }
}

/// Settings that are valid but worth flagging to an operator.
fn check_settings(config: &FedlinkConfig) -> Vec<CheckResult> {
    let start = Instant::now();
    let discovery = match config.discovery.policy {
        DiscoveryPolicy::None => CheckResult::new(
            "Discovery",
            CheckStatus::Warn,
            "policy is none, relations are never crawled",
            start,
        ),
        policy => CheckResult::new(
            "Discovery",
            CheckStatus::Pass,
            format!(
                "policy {policy}, refresh every {} days",
                config.discovery.refresh_interval_days
            ),
            start,
        ),
    };

    let delivery = if config.delivery.ignore_dead_contacts {
        CheckResult::new(
            "Delivery",
            CheckStatus::Warn,
            "ignore_dead_contacts is set, archived contacts keep retrying",
            start,
        )
    } else {
        CheckResult::new(
            "Delivery",
            CheckStatus::Pass,
            format!(
                "ceilings {} direct / {} batch",
                config.delivery.direct_queue_ceiling, config.delivery.batch_queue_ceiling
            ),
            start,
        )
    };

    vec![discovery, delivery]
}

/// Open the database (which applies pending migrations) and run a quick check.
async fn check_database(config: &FedlinkConfig) -> CheckResult {
    let start = Instant::now();
    let path = &config.storage.database_path;

    if !Path::new(path).exists() {
        return CheckResult::new(
            "Database",
            CheckStatus::Warn,
            format!("not found: {path} (run `fedlink migrate`)"),
            start,
        );
    }

    let storage = match open_storage(config).await {
        Ok(storage) => storage,
        Err(e) => return CheckResult::new("Database", CheckStatus::Fail, format!("open failed: {e}"), start),
    };

    match storage.health_check().await {
        Ok(HealthStatus::Healthy) => {}
        Ok(HealthStatus::Degraded(msg) | HealthStatus::Unhealthy(msg)) => {
            return CheckResult::new("Database", CheckStatus::Fail, msg, start);
        }
        Err(e) => {
            return CheckResult::new("Database", CheckStatus::Fail, format!("check failed: {e}"), start);
        }
    }

    let count = match storage.database() {
        Ok(db) => contacts::count(db).await,
        Err(e) => Err(e),
    };
    match count {
        Ok(n) => CheckResult::new("Database", CheckStatus::Pass, format!("ok, {n} contacts"), start),
        Err(e) => CheckResult::new("Database", CheckStatus::Fail, format!("query failed: {e}"), start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedlink_config::{DeliveryConfig, StorageConfig};

    fn config_with_db(path: &Path) -> FedlinkConfig {
        FedlinkConfig {
            storage: StorageConfig {
                database_path: path.to_string_lossy().to_string(),
                wal_mode: true,
            },
            ..FedlinkConfig::default()
        }
    }

    #[tokio::test]
    async fn missing_database_warns() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_db(&dir.path().join("absent.db"));
        let result = check_database(&config).await;
        assert_eq!(result.status, CheckStatus::Warn);
        assert!(result.message.contains("fedlink migrate"));
    }

    #[tokio::test]
    async fn migrated_database_passes() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_db(&dir.path().join("fedlink.db"));
        crate::inspect::run_migrate(&config).await.unwrap();

        let result = check_database(&config).await;
        assert_eq!(result.status, CheckStatus::Pass, "{}", result.message);
        assert!(result.message.contains("0 contacts"));
    }

    #[test]
    fn explicit_config_file_is_checked() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.toml");
        std::fs::write(&good, "[discovery]\npolicy = \"all\"\n").unwrap();
        assert_eq!(check_config(Some(&good)).status, CheckStatus::Pass);

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[discovery]\npolcy = \"all\"\n").unwrap();
        let result = check_config(Some(&bad));
        assert_eq!(result.status, CheckStatus::Fail);
        assert!(result.message.ends_with("error(s)"));
    }

    #[test]
    fn risky_settings_warn() {
        let config = FedlinkConfig {
            delivery: DeliveryConfig {
                ignore_dead_contacts: true,
                ..Default::default()
            },
            ..FedlinkConfig::default()
        };
        let results = check_settings(&config);
        assert_eq!(results[0].status, CheckStatus::Pass);
        assert_eq!(results[1].status, CheckStatus::Warn);

        let mut disabled = FedlinkConfig::default();
        disabled.discovery.policy = DiscoveryPolicy::None;
        assert_eq!(check_settings(&disabled)[0].status, CheckStatus::Warn);
    }

    #[test]
    fn plain_lines_carry_status_tags() {
        let result = CheckResult {
            name: "Database",
            status: CheckStatus::Fail,
            message: "open failed".to_string(),
            duration: Duration::from_millis(3),
        };
        let line = render_line(&result, false);
        assert!(line.contains("[FAIL]"));
        assert!(line.ends_with("open failed (3ms)"));
    }
}
