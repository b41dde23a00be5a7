//! # Common API Types
//!
//! Response shapes for the public catalog endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Placeholder used when a value cannot be computed (no events or no zones).
pub const NOT_AVAILABLE: &str = "N/A";

/// Envelope wrapping every successful catalog response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Envelope<T> {
    /// Response payload
    pub data: T,
    /// Always null on success; errors are returned as problem+json
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self { data, error: None }
    }
}

/// Payload of `GET /events`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventsData {
    pub events: Vec<EventSummary>,
}

/// Public view of one base event with its computed schedule and price range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EventSummary {
    /// Catalog identifier of the base event
    #[schema(value_type = String)]
    pub id: Uuid,
    pub title: String,
    /// `YYYY-MM-DD` of the latest sales start, or "N/A"
    #[schema(example = "2021-06-30")]
    pub start_date: String,
    /// `HH:MM:SS` of the latest sales start, or "N/A"
    #[schema(example = "21:00:00")]
    pub start_time: String,
    /// `YYYY-MM-DD` of the latest sales end, or "N/A"
    pub end_date: String,
    /// `HH:MM:SS` of the latest sales end, or "N/A"
    pub end_time: String,
    /// Lowest zone price with two decimals, or "N/A"
    #[schema(example = "15.00")]
    pub min_price: String,
    /// Highest zone price with two decimals, or "N/A"
    #[schema(example = "20.00")]
    pub max_price: String,
}

/// Health check response body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
}
