// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact table operations.

use chrono::{DateTime, Utc};
use fedlink_core::time::format_ts;
use fedlink_core::{ContactId, ContactRecord, FedlinkError};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::directory::{identity_key, normalize_url};
use crate::models::{CONTACT_COLUMNS, ContactRow, NewContact};

/// Look up a contact id by profile URL.
pub async fn find_by_url(db: &Database, url: &str) -> Result<Option<ContactId>, FedlinkError> {
    let key = identity_key(url);
    db.connection()
        .call(move |conn| -> Result<Option<i64>, rusqlite::Error> {
            conn.query_row(
                "SELECT id FROM contact WHERE url_key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
        .map(|id| id.map(ContactId))
}

/// Insert a contact, or return the id of the contact already holding its URL.
pub async fn insert(db: &Database, contact: NewContact) -> Result<ContactId, FedlinkError> {
    let url = normalize_url(&contact.url);
    let key = identity_key(&contact.url);
    let network = contact.network.to_string();
    let created_at = format_ts(contact.created_at);
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.execute(
                "INSERT INTO contact (url, url_key, network, created_at, is_local, is_self)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(url_key) DO NOTHING",
                params![url, key, network, created_at, contact.is_local, contact.is_self],
            )?;
            conn.query_row(
                "SELECT id FROM contact WHERE url_key = ?1",
                params![key],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
        .map(ContactId)
}

/// Fetch a full contact record.
pub async fn get(db: &Database, id: ContactId) -> Result<Option<ContactRecord>, FedlinkError> {
    let row = db
        .connection()
        .call(move |conn| -> Result<Option<ContactRow>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {CONTACT_COLUMNS} FROM contact WHERE id = ?1"),
                params![id.0],
                ContactRow::from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    row.map(ContactRow::into_record).transpose()
}

/// Record the time of the last completed follower crawl.
pub async fn set_last_discovery(
    db: &Database,
    id: ContactId,
    at: DateTime<Utc>,
) -> Result<(), FedlinkError> {
    let at = format_ts(at);
    update_one(db, id, move |conn| {
        conn.execute(
            "UPDATE contact SET last_discovery_at = ?1 WHERE id = ?2",
            params![at, id.0],
        )
    })
    .await
}

/// Overwrite the failure countdown of a contact.
pub async fn set_liveness(
    db: &Database,
    id: ContactId,
    term_date: Option<DateTime<Utc>>,
    archived: bool,
) -> Result<(), FedlinkError> {
    let term_date = term_date.map(format_ts);
    update_one(db, id, move |conn| {
        conn.execute(
            "UPDATE contact SET term_date = ?1, archived = ?2 WHERE id = ?3",
            params![term_date, archived, id.0],
        )
    })
    .await
}

/// Flag whether a local user follows or is followed by this contact.
pub async fn set_local(db: &Database, id: ContactId, is_local: bool) -> Result<(), FedlinkError> {
    update_one(db, id, move |conn| {
        conn.execute(
            "UPDATE contact SET is_local = ?1 WHERE id = ?2",
            params![is_local, id.0],
        )
    })
    .await
}

/// Flag this contact as the node's own identity.
pub async fn set_self(db: &Database, id: ContactId, is_self: bool) -> Result<(), FedlinkError> {
    update_one(db, id, move |conn| {
        conn.execute(
            "UPDATE contact SET is_self = ?1 WHERE id = ?2",
            params![is_self, id.0],
        )
    })
    .await
}

/// Number of known contacts.
pub async fn count(db: &Database) -> Result<u64, FedlinkError> {
    db.connection()
        .call(|conn| -> Result<u64, rusqlite::Error> {
            conn.query_row("SELECT COUNT(*) FROM contact", [], |row| row.get(0))
        })
        .await
        .map_err(map_tr_err)
}

async fn update_one<F>(db: &Database, id: ContactId, update: F) -> Result<(), FedlinkError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<usize, rusqlite::Error> + Send + 'static,
{
    let changed = db.connection().call(update).await.map_err(map_tr_err)?;
    if changed == 0 {
        return Err(FedlinkError::NotFound {
            kind: "contact",
            id: id.0,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use fedlink_core::Network;

    #[tokio::test]
    async fn insert_is_idempotent_per_identity() {
        let db = Database::open_in_memory().await.unwrap();
        let a = insert(&db, NewContact::remote("https://Remote.Example/users/alice/"))
            .await
            .unwrap();
        let b = insert(&db, NewContact::remote("http://remote.example/users/alice"))
            .await
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(count(&db).await.unwrap(), 1);

        let found = find_by_url(&db, "https://remote.example/users/alice").await.unwrap();
        assert_eq!(found, Some(a));
        let record = get(&db, a).await.unwrap().unwrap();
        assert_eq!(record.url, "https://remote.example/users/alice");
    }

    #[tokio::test]
    async fn record_round_trips_flags_and_timestamps() {
        let db = Database::open_in_memory().await.unwrap();
        let created = fedlink_core::time::now() - Duration::days(3);
        let id = insert(
            &db,
            NewContact {
                url: "https://remote.example/users/bob".into(),
                network: Network::ActivityPub,
                created_at: created,
                is_local: true,
                is_self: false,
            },
        )
        .await
        .unwrap();

        let seen = fedlink_core::time::now();
        set_last_discovery(&db, id, seen).await.unwrap();
        set_liveness(&db, id, Some(seen), true).await.unwrap();

        let record = get(&db, id).await.unwrap().unwrap();
        assert_eq!(record.network, Network::ActivityPub);
        assert_eq!(record.created_at, created);
        assert_eq!(record.last_discovery_at, Some(seen));
        assert_eq!(record.term_date, Some(seen));
        assert!(record.is_local);
        assert!(record.archived);
    }

    #[tokio::test]
    async fn updates_on_missing_contact_are_not_found() {
        let db = Database::open_in_memory().await.unwrap();
        let err = set_local(&db, ContactId(42), true).await.unwrap_err();
        assert!(matches!(err, FedlinkError::NotFound { kind: "contact", id: 42 }));
        assert!(get(&db, ContactId(42)).await.unwrap().is_none());
    }
}
