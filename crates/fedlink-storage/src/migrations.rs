// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary and applied on
//! every [`Database`](crate::Database) open.

use fedlink_core::FedlinkError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Apply all pending migrations, returning how many were applied.
///
/// Refinery tracks applied versions in `refinery_schema_history`.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<usize, FedlinkError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(|e| FedlinkError::Storage {
            source: Box::new(e),
        })?;
    Ok(report.applied_migrations().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_create_every_table_once() {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        assert_eq!(run_migrations(&mut conn).unwrap(), 1);
        assert_eq!(run_migrations(&mut conn).unwrap(), 0);

        for table in ["contact", "relation_edge", "delivery_queue", "delivery_state"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "missing table {table}");
        }
    }
}
