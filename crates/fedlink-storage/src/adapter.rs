// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use fedlink_config::model::StorageConfig;
use fedlink_core::{AdapterType, FedlinkError, HealthStatus, PluginAdapter, StorageAdapter};

use crate::database::Database;
use crate::directory::SqliteContactDirectory;

/// SQLite-backed storage adapter.
///
/// The database is opened lazily by [`StorageAdapter::initialize`]; engines
/// then borrow the shared [`Database`] handle through [`SqliteStorage::database`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage. Nothing is opened until `initialize`.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// The opened database, or an error if `initialize` has not run.
    pub fn database(&self) -> Result<&Database, FedlinkError> {
        self.db.get().ok_or_else(|| FedlinkError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    /// A contact directory over the same database.
    pub fn directory(&self) -> Result<SqliteContactDirectory, FedlinkError> {
        Ok(SqliteContactDirectory::new(self.database()?.clone()))
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, FedlinkError> {
        let db = self.database()?;
        let integrity = db
            .connection()
            .call(|conn| -> Result<String, rusqlite::Error> {
                conn.query_row("PRAGMA quick_check", [], |row| row.get(0))
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        if integrity == "ok" {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Degraded(format!("quick_check: {integrity}")))
        }
    }

    async fn shutdown(&self) -> Result<(), FedlinkError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), FedlinkError> {
        let db = Database::open_with_options(&self.config.database_path, self.config.wal_mode)
            .await?;
        self.db.set(db).map_err(|_| FedlinkError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), FedlinkError> {
        self.database()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}
