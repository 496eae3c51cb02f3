// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed [`ContactDirectory`] and profile URL normalization.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fedlink_core::{ContactDirectory, ContactId, ContactRecord, FedlinkError};

use crate::database::Database;
use crate::models::NewContact;
use crate::queries::contacts;

/// Canonical spelling of a profile URL.
///
/// Trims whitespace, lowercases scheme and host, and drops trailing slashes.
/// Path and query are left untouched since they are case-sensitive.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    let Some((scheme, rest)) = trimmed.split_once("://") else {
        return trimmed.to_string();
    };
    let (host, path) = rest.split_at(rest.find('/').unwrap_or(rest.len()));
    format!(
        "{}://{}{}",
        scheme.to_ascii_lowercase(),
        host.to_ascii_lowercase(),
        path
    )
}

/// Identity key under which a contact is stored: `http` and `https` collapse.
pub fn identity_key(raw: &str) -> String {
    let normalized = normalize_url(raw);
    match normalized.split_once("://") {
        Some(("http" | "https", rest)) => rest.to_string(),
        _ => normalized,
    }
}

/// Contact directory stored in the `contact` table.
#[derive(Debug, Clone)]
pub struct SqliteContactDirectory {
    db: Database,
}

impl SqliteContactDirectory {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a contact with explicit attributes (local/self flags, creation time).
    pub async fn create_with(&self, contact: NewContact) -> Result<ContactId, FedlinkError> {
        contacts::insert(&self.db, contact).await
    }

    pub async fn set_local(&self, id: ContactId, is_local: bool) -> Result<(), FedlinkError> {
        contacts::set_local(&self.db, id, is_local).await
    }

    pub async fn set_self(&self, id: ContactId, is_self: bool) -> Result<(), FedlinkError> {
        contacts::set_self(&self.db, id, is_self).await
    }
}

#[async_trait]
impl ContactDirectory for SqliteContactDirectory {
    async fn resolve(&self, url: &str) -> Result<Option<ContactId>, FedlinkError> {
        contacts::find_by_url(&self.db, url).await
    }

    async fn create(&self, url: &str) -> Result<ContactId, FedlinkError> {
        if normalize_url(url).is_empty() {
            return Err(FedlinkError::InvalidArgument(
                "contact url must not be empty".to_string(),
            ));
        }
        contacts::insert(&self.db, NewContact::remote(url)).await
    }

    async fn get(&self, id: ContactId) -> Result<Option<ContactRecord>, FedlinkError> {
        contacts::get(&self.db, id).await
    }

    async fn mark_discovered(&self, id: ContactId, at: DateTime<Utc>) -> Result<(), FedlinkError> {
        contacts::set_last_discovery(&self.db, id, at).await
    }

    async fn set_liveness(
        &self,
        id: ContactId,
        term_date: Option<DateTime<Utc>>,
        archived: bool,
    ) -> Result<(), FedlinkError> {
        contacts::set_liveness(&self.db, id, term_date, archived).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_scheme_and_host_only() {
        assert_eq!(
            normalize_url("  HTTPS://Social.Example/Users/Alice/ "),
            "https://social.example/Users/Alice"
        );
        assert_eq!(normalize_url("https://social.example"), "https://social.example");
    }

    #[test]
    fn identity_key_ignores_http_vs_https() {
        assert_eq!(
            identity_key("http://social.example/u/a"),
            identity_key("https://social.example/u/a/")
        );
        assert_ne!(
            identity_key("acct://social.example/u/a"),
            identity_key("https://social.example/u/a")
        );
    }

    #[tokio::test]
    async fn resolve_or_create_reuses_existing_contact() {
        let db = Database::open_in_memory().await.unwrap();
        let directory = SqliteContactDirectory::new(db);

        assert!(directory.resolve("https://a.example/u/1").await.unwrap().is_none());
        let created = directory.resolve_or_create("https://a.example/u/1").await.unwrap();
        let again = directory.resolve_or_create("http://A.example/u/1/").await.unwrap();
        assert_eq!(created, again);

        let record = directory.get(created).await.unwrap().unwrap();
        assert!(record.last_discovery_at.is_none());
        assert!(!record.is_local);
    }

    #[tokio::test]
    async fn create_rejects_blank_url() {
        let db = Database::open_in_memory().await.unwrap();
        let directory = SqliteContactDirectory::new(db);
        let err = directory.create("  / ").await.unwrap_err();
        assert!(matches!(err, FedlinkError::InvalidArgument(_)));
    }
}
