// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fedlink operator CLI.
//!
//! Inspects and maintains the federation database: schema migration,
//! environment diagnostics, and read-only views of delivery backlogs,
//! relation counts and delivery counters.

mod doctor;
mod inspect;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use fedlink_config::{ConfigError, FedlinkConfig};
use fedlink_core::{ContactId, ItemId};

/// Fedlink - federation relation discovery and delivery tooling.
#[derive(Parser, Debug)]
#[command(name = "fedlink", version, about, long_about = None)]
struct Cli {
    /// Configuration file to use instead of the standard search path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or upgrade the database schema.
    Migrate,
    /// Check configuration and database health.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Show the delivery backlog and liveness of a contact.
    Queue {
        #[arg(long)]
        contact: i64,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
        #[arg(long)]
        plain: bool,
    },
    /// Show follower, following and mutual counts of a contact.
    Relations {
        contact: i64,
        /// Also report the relations shared with this contact.
        #[arg(long)]
        with: Option<i64>,
        /// Also list up to this many ids per relation.
        #[arg(long, default_value_t = 0)]
        limit: u32,
        #[arg(long)]
        json: bool,
    },
    /// Show the delivery counters of an outbound item.
    State {
        item: i64,
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            fedlink_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.node.log_level);

    let result = match cli.command {
        Commands::Migrate => inspect::run_migrate(&config).await,
        Commands::Doctor { plain } => {
            match doctor::run_doctor(&config, cli.config.as_deref(), plain).await {
                Ok(0) => Ok(()),
                Ok(_) => std::process::exit(1),
                Err(e) => Err(e),
            }
        }
        Commands::Queue {
            contact,
            json,
            plain,
        } => inspect::run_queue(&config, ContactId(contact), json, plain).await,
        Commands::Relations {
            contact,
            with,
            limit,
            json,
        } => {
            inspect::run_relations(&config, ContactId(contact), with.map(ContactId), limit, json)
                .await
        }
        Commands::State { item, json } => inspect::run_state(&config, ItemId(item), json).await,
    };

    if let Err(e) = result {
        eprintln!("fedlink: {e}");
        std::process::exit(1);
    }
}

/// Load from `path` when given, otherwise from the standard hierarchy.
fn load_config(path: Option<&Path>) -> Result<FedlinkConfig, Vec<ConfigError>> {
    match path {
        Some(path) if !path.exists() => Err(vec![ConfigError::Other(format!(
            "config file not found: {}",
            path.display()
        ))]),
        Some(path) => fedlink_config::load_and_validate_path(path),
        None => fedlink_config::load_and_validate(),
    }
}

/// Log to stderr so report output on stdout stays parseable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fedlink={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_queue_with_global_config() {
        let cli = Cli::try_parse_from([
            "fedlink", "queue", "--contact", "42", "--json", "--config", "/tmp/f.toml",
        ])
        .unwrap();
        assert_eq!(cli.config.as_deref(), Some(Path::new("/tmp/f.toml")));
        assert!(matches!(
            cli.command,
            Commands::Queue {
                contact: 42,
                json: true,
                plain: false
            }
        ));
    }

    #[test]
    fn missing_config_file_is_reported() {
        let errors = load_config(Some(Path::new("/nonexistent/fedlink-test.toml"))).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("not found"));
    }

    #[test]
    fn explicit_config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fedlink.toml");
        std::fs::write(&path, "[delivery]\ndirect_queue_ceiling = 9\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.delivery.direct_queue_ceiling, 9);
    }
}
