//! Database migrations for the event catalog.
//!
//! All foreign keys point at external feed identifiers rather than surrogate ids,
//! so reconciliation never depends on row identity.

pub use sea_orm_migration::prelude::*;

mod m2025_01_10_000001_create_base_events;
mod m2025_01_10_000002_create_events;
mod m2025_01_10_000003_create_zones;
mod m2025_01_10_000004_create_event_zones;
mod m2025_01_10_000005_create_log_entries;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_01_10_000001_create_base_events::Migration),
            Box::new(m2025_01_10_000002_create_events::Migration),
            Box::new(m2025_01_10_000003_create_zones::Migration),
            Box::new(m2025_01_10_000004_create_event_zones::Migration),
            Box::new(m2025_01_10_000005_create_log_entries::Migration),
        ]
    }
}
