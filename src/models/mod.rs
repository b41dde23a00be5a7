//! # Data Models
//!
//! SeaORM entities for the event catalog plus small API-facing types.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod base_event;
pub mod event;
pub mod event_zone;
pub mod log_entry;
pub mod zone;

pub use base_event::Entity as BaseEvent;
pub use event::Entity as Event;
pub use event_zone::Entity as EventZone;
pub use log_entry::Entity as LogEntry;
pub use zone::Entity as Zone;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "event-catalog".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Distribution channel of a base event.
///
/// Stored as free text because the feed is not validated at ingestion time;
/// only `online` base events are publicly listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SellMode {
    Online,
    Offline,
}

impl SellMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            SellMode::Online => "online",
            SellMode::Offline => "offline",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "online" => Some(SellMode::Online),
            "offline" => Some(SellMode::Offline),
            _ => None,
        }
    }
}

impl std::fmt::Display for SellMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
