// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `fedlink migrate`, `queue`, `relations` and `state` commands.
//!
//! Each command builds a serializable report from the database and prints it
//! either as text or, with `--json`, as pretty JSON for scripting.

use std::io::IsTerminal;
use std::sync::Arc;

use fedlink_config::FedlinkConfig;
use fedlink_core::time::format_ts;
use fedlink_core::types::DeliveryState;
use fedlink_core::{
    ContactDirectory, ContactId, FedlinkError, HealthStatus, ItemId, PluginAdapter, Protocol,
    StorageAdapter,
};
use fedlink_delivery::{DeliveryEngine, DeliveryStateTracker, Liveness};
use fedlink_storage::queries::{contacts, relations};
use fedlink_storage::{Database, SqliteStorage};
use serde::Serialize;

/// Open (and migrate) the configured database.
pub async fn open_storage(config: &FedlinkConfig) -> Result<SqliteStorage, FedlinkError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    Ok(storage)
}

pub async fn run_migrate(config: &FedlinkConfig) -> Result<(), FedlinkError> {
    let storage = open_storage(config).await?;
    if let HealthStatus::Degraded(msg) | HealthStatus::Unhealthy(msg) =
        storage.health_check().await?
    {
        return Err(FedlinkError::Storage {
            source: format!("database opened but unhealthy: {msg}").into(),
        });
    }
    let contacts = contacts::count(storage.database()?).await?;
    println!(
        "fedlink: database ready at {} ({contacts} contacts)",
        config.storage.database_path
    );
    storage.close().await
}

/// Backlog and liveness of one contact.
#[derive(Debug, Serialize)]
pub struct QueueReport {
    pub contact: ContactId,
    pub url: Option<String>,
    pub pending: usize,
    pub pending_batch: usize,
    pub oldest: Option<String>,
    pub max_attempts: u32,
    pub recently_delayed: bool,
    pub liveness: String,
    pub direct_ceiling: u32,
    pub batch_ceiling: u32,
}

pub async fn queue_report(
    config: &FedlinkConfig,
    db: &Database,
    contact: ContactId,
) -> Result<QueueReport, FedlinkError> {
    let directory = Arc::new(fedlink_storage::SqliteContactDirectory::new(db.clone()));
    let engine = DeliveryEngine::new(&config.delivery, db.clone(), directory.clone());

    let record = directory.get(contact).await?;
    let backlog = engine.backlog(contact).await?;
    let liveness = engine.breaker().liveness(contact).await?;

    Ok(QueueReport {
        contact,
        url: record.map(|r| r.url),
        pending: backlog.len(),
        pending_batch: backlog.iter().filter(|item| item.is_batch).count(),
        oldest: backlog.first().map(|item| format_ts(item.created_at)),
        max_attempts: backlog.iter().map(|item| item.attempts).max().unwrap_or(0),
        recently_delayed: engine.was_recently_delayed(contact).await?,
        liveness: describe_liveness(liveness),
        direct_ceiling: engine.ceiling(false),
        batch_ceiling: engine.ceiling(true),
    })
}

fn describe_liveness(liveness: Liveness) -> String {
    match liveness {
        Liveness::Healthy => "healthy".to_string(),
        Liveness::Failing { since } => format!("failing since {}", format_ts(since)),
        Liveness::Archived => "archived".to_string(),
    }
}

pub async fn run_queue(
    config: &FedlinkConfig,
    contact: ContactId,
    json: bool,
    plain: bool,
) -> Result<(), FedlinkError> {
    let storage = open_storage(config).await?;
    let report = queue_report(config, storage.database()?, contact).await?;

    if json {
        return print_json(&report);
    }

    let use_color = !plain && std::io::stdout().is_terminal();
    println!();
    println!("  fedlink queue: contact {}", report.contact);
    println!("  {}", "-".repeat(40));
    println!("    URL:       {}", report.url.as_deref().unwrap_or("(unknown contact)"));
    println!(
        "    Pending:   {} ({} batch) of {} direct / {} batch",
        report.pending, report.pending_batch, report.direct_ceiling, report.batch_ceiling
    );
    if let Some(oldest) = &report.oldest {
        println!("    Oldest:    {oldest} (max attempts {})", report.max_attempts);
    }
    println!("    Delayed:   {}", if report.recently_delayed { "yes" } else { "no" });
    println!("    Liveness:  {}", paint_liveness(&report.liveness, use_color));
    println!();
    Ok(())
}

fn paint_liveness(liveness: &str, use_color: bool) -> String {
    if !use_color {
        return liveness.to_string();
    }
    use colored::Colorize;
    match liveness {
        "healthy" => liveness.green().to_string(),
        "archived" => liveness.red().to_string(),
        _ => liveness.yellow().to_string(),
    }
}

/// Relation counts of one contact.
#[derive(Debug, Serialize)]
pub struct RelationsReport {
    pub contact: ContactId,
    pub followers: u64,
    pub following: u64,
    pub mutuals: u64,
    pub all: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub follower_ids: Vec<ContactId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub following_ids: Vec<ContactId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub all_ids: Vec<ContactId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common: Option<CommonReport>,
}

/// Relations `contact` shares with another contact.
#[derive(Debug, Serialize)]
pub struct CommonReport {
    pub with: ContactId,
    pub followers: u64,
    pub following: u64,
    pub interactions: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub follower_ids: Vec<ContactId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub following_ids: Vec<ContactId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interaction_ids: Vec<ContactId>,
}

pub async fn relations_report(
    db: &Database,
    contact: ContactId,
    with: Option<ContactId>,
    limit: u32,
) -> Result<RelationsReport, FedlinkError> {
    let (follower_ids, following_ids, all_ids) = if limit > 0 {
        (
            relations::list_followers(db, contact, limit, 0).await?,
            relations::list_following(db, contact, limit, 0).await?,
            relations::list_all(db, contact, limit, 0).await?,
        )
    } else {
        Default::default()
    };

    let common = match with {
        Some(other) => Some(common_report(db, contact, other, limit).await?),
        None => None,
    };

    Ok(RelationsReport {
        contact,
        followers: relations::count_followers(db, contact).await?,
        following: relations::count_following(db, contact).await?,
        mutuals: relations::count_mutuals(db, contact).await?,
        all: relations::count_all(db, contact).await?,
        follower_ids,
        following_ids,
        all_ids,
        common,
    })
}

async fn common_report(
    db: &Database,
    contact: ContactId,
    other: ContactId,
    limit: u32,
) -> Result<CommonReport, FedlinkError> {
    let (follower_ids, following_ids, interaction_ids) = if limit > 0 {
        (
            relations::list_common_followers(db, contact, other, limit, 0).await?,
            relations::list_common_following(db, contact, other, limit, 0).await?,
            relations::list_common_interactions(db, contact, other, limit, 0).await?,
        )
    } else {
        Default::default()
    };

    Ok(CommonReport {
        with: other,
        followers: relations::count_common_followers(db, contact, other).await?,
        following: relations::count_common_following(db, contact, other).await?,
        interactions: relations::count_common_interactions(db, contact, other).await?,
        follower_ids,
        following_ids,
        interaction_ids,
    })
}

pub async fn run_relations(
    config: &FedlinkConfig,
    contact: ContactId,
    with: Option<ContactId>,
    limit: u32,
    json: bool,
) -> Result<(), FedlinkError> {
    let storage = open_storage(config).await?;
    let report = relations_report(storage.database()?, contact, with, limit).await?;

    if json {
        return print_json(&report);
    }

    println!();
    println!("  fedlink relations: contact {}", report.contact);
    println!("  {}", "-".repeat(40));
    println!("    Followers: {}", report.followers);
    println!("    Following: {}", report.following);
    println!("    Mutuals:   {}", report.mutuals);
    println!("    Total:     {}", report.all);
    print_ids("Follower ids", &report.follower_ids);
    print_ids("Following ids", &report.following_ids);
    print_ids("Related ids", &report.all_ids);
    if let Some(common) = &report.common {
        println!();
        println!("    In common with contact {}:", common.with);
        println!("      Followers:    {}", common.followers);
        println!("      Following:    {}", common.following);
        println!("      Interactions: {}", common.interactions);
        print_ids("  Follower ids", &common.follower_ids);
        print_ids("  Following ids", &common.following_ids);
        print_ids("  Interaction ids", &common.interaction_ids);
    }
    println!();
    Ok(())
}

fn print_ids(label: &str, ids: &[ContactId]) {
    if !ids.is_empty() {
        println!("    {label}: {}", join_ids(ids));
    }
}

fn join_ids(ids: &[ContactId]) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Delivery counters of one outbound item.
#[derive(Debug, Serialize)]
pub struct StateReport {
    pub item: ItemId,
    pub state: Option<DeliveryState>,
}

pub async fn run_state(config: &FedlinkConfig, item: ItemId, json: bool) -> Result<(), FedlinkError> {
    let storage = open_storage(config).await?;
    let tracker = DeliveryStateTracker::new(storage.database()?.clone());
    let report = StateReport {
        item,
        state: tracker.get(item).await?,
    };

    if json {
        return print_json(&report);
    }

    println!();
    println!("  fedlink state: item {}", report.item);
    println!("  {}", "-".repeat(40));
    match &report.state {
        None => println!("    not tracked"),
        Some(state) => {
            println!("    Queued:  {}", state.queued);
            println!("    Done:    {}", state.done);
            println!("    Failed:  {}", state.failed);
            for protocol in Protocol::ALL {
                let count = state.done_via(protocol);
                if count > 0 {
                    println!("      via {protocol:<12} {count}");
                }
            }
        }
    }
    println!();
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), FedlinkError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| FedlinkError::Internal(format!("failed to serialize report: {e}")))?;
    println!("{out}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use fedlink_core::Network;
    use fedlink_storage::SqliteContactDirectory;

    async fn db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn queue_report_summarizes_backlog() {
        let db = db().await;
        let config = FedlinkConfig::default();
        let directory = Arc::new(SqliteContactDirectory::new(db.clone()));
        let peer = directory.create("https://peer.example/u/1").await.unwrap();
        let engine = DeliveryEngine::new(&config.delivery, db.clone(), directory.clone());
        engine.enqueue(peer, Network::ActivityPub, "{}", false).await.unwrap();
        engine.enqueue(peer, Network::ActivityPub, "{}", true).await.unwrap();

        let report = queue_report(&config, &db, peer).await.unwrap();
        assert_eq!(report.url.as_deref(), Some("https://peer.example/u/1"));
        assert_eq!((report.pending, report.pending_batch), (2, 1));
        assert!(report.recently_delayed);
        assert_eq!(report.liveness, "healthy");
        assert_eq!((report.direct_ceiling, report.batch_ceiling), (500, 1000));
    }

    #[tokio::test]
    async fn queue_report_for_unknown_contact_is_empty() {
        let db = db().await;
        let report = queue_report(&FedlinkConfig::default(), &db, ContactId(9)).await.unwrap();
        assert!(report.url.is_none());
        assert_eq!(report.pending, 0);
        assert!(report.oldest.is_none());
        assert!(!report.recently_delayed);
    }

    #[tokio::test]
    async fn relations_report_lists_when_asked() {
        let db = db().await;
        let directory = SqliteContactDirectory::new(db.clone());
        let a = directory.create("https://a.example/u/a").await.unwrap();
        let b = directory.create("https://a.example/u/b").await.unwrap();
        relations::reconcile(&db, a, vec![b], vec![b], Utc::now()).await.unwrap();

        let report = relations_report(&db, a, None, 5).await.unwrap();
        assert_eq!((report.followers, report.following, report.mutuals, report.all), (1, 1, 1, 1));
        assert_eq!(report.follower_ids, vec![b]);
        assert_eq!(report.all_ids, vec![b]);
        assert!(report.common.is_none());

        let bare = relations_report(&db, a, None, 0).await.unwrap();
        assert!(bare.follower_ids.is_empty());
        let json = serde_json::to_string(&bare).unwrap();
        assert!(!json.contains("follower_ids"));
        assert!(!json.contains("common"));
    }

    #[tokio::test]
    async fn relations_report_compares_two_contacts() {
        let db = db().await;
        let directory = SqliteContactDirectory::new(db.clone());
        let mut ids = Vec::new();
        for name in ["a", "b", "x", "y"] {
            ids.push(directory.create(&format!("https://a.example/u/{name}")).await.unwrap());
        }
        let (a, b, x, y) = (ids[0], ids[1], ids[2], ids[3]);
        relations::reconcile(&db, a, vec![x, y], vec![y], Utc::now()).await.unwrap();
        relations::reconcile(&db, b, vec![x], vec![y], Utc::now()).await.unwrap();

        let report = relations_report(&db, a, Some(b), 10).await.unwrap();
        let common = report.common.unwrap();
        assert_eq!(common.with, b);
        assert_eq!((common.followers, common.following, common.interactions), (1, 1, 2));
        assert_eq!(common.follower_ids, vec![x]);
        assert_eq!(common.following_ids, vec![y]);
        assert_eq!(common.interaction_ids, vec![x, y]);
    }

    #[test]
    fn liveness_descriptions() {
        assert_eq!(describe_liveness(Liveness::Archived), "archived");
        let since = Utc::now() - Duration::days(2);
        assert!(describe_liveness(Liveness::Failing { since }).starts_with("failing since "));
        assert_eq!(paint_liveness("healthy", false), "healthy");
    }

    #[test]
    fn untracked_state_serializes_as_null() {
        let report = StateReport {
            item: ItemId(4),
            state: None,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(json, r#"{"item":4,"state":null}"#);
    }
}
