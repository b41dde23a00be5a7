//! Test utilities for database and feed fixtures.
//!
//! This module provides an in-memory SQLite database with migrations applied
//! plus small builders for provider feed documents.

use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use std::sync::Arc;

/// Sets up an in-memory SQLite database with all migrations applied.
///
/// Foreign keys stay enforced so reconciliation order is exercised for real.
pub async fn setup_test_db() -> Result<Arc<DatabaseConnection>> {
    let db = Database::connect("sqlite::memory:").await?;

    Migrator::up(&db, None).await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        "PRAGMA foreign_keys = ON".to_string(),
    ))
    .await?;

    Ok(Arc::new(db))
}

/// Wraps base-event fragments in the provider's document envelope.
#[allow(dead_code)]
pub fn feed(base_events: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<eventList xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" version="1.0">
  <output>
{}
  </output>
</eventList>"#,
        base_events.join("\n")
    )
}

#[allow(dead_code)]
pub fn base_event(id: i64, title: &str, sell_mode: &str, events: &[String]) -> String {
    format!(
        r#"<base_event base_event_id="{id}" sell_mode="{sell_mode}" title="{title}">{}</base_event>"#,
        events.join("")
    )
}

/// Event whose show starts at `event_date`, independent of its sell window.
#[allow(dead_code)]
pub fn event_on(
    id: i64,
    event_date: &str,
    sell_from: &str,
    sell_to: &str,
    zones: &[String],
) -> String {
    format!(
        r#"<event event_start_date="{event_date}" event_id="{id}" sell_from="{sell_from}" sell_to="{sell_to}" sold_out="false">{}</event>"#,
        zones.join("")
    )
}

/// Event whose show starts at 21:30 on the day its sales close.
#[allow(dead_code)]
pub fn event(id: i64, sell_from: &str, sell_to: &str, zones: &[String]) -> String {
    let event_date = format!("{}T21:30:00", &sell_to[..10]);
    event_on(id, &event_date, sell_from, sell_to, zones)
}

#[allow(dead_code)]
pub fn zone(id: i64, name: &str, price: &str, capacity: i64, numbered: &str) -> String {
    format!(
        r#"<zone zone_id="{id}" capacity="{capacity}" price="{price}" name="{name}" numbered="{numbered}" />"#
    )
}
