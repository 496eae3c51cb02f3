// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Fedlink federation subsystem.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and typed operations for contacts,
//! relation edges, the delivery queue, and delivery counters.

pub mod adapter;
pub mod database;
pub mod directory;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
pub use directory::{SqliteContactDirectory, identity_key, normalize_url};
pub use models::*;
