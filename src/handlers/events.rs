//! # Events API Handlers
//!
//! Public, read-only listing of online base events selling inside a date window.

use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use super::types::{Envelope, EventSummary, EventsData, NOT_AVAILABLE};
use crate::error::{ApiError, validation_error};
use crate::repositories::{CatalogEntry, CatalogQueryRepository};
use crate::server::AppState;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Query parameters for the events listing
#[derive(Debug, Default, Deserialize, Serialize, IntoParams, ToSchema)]
pub struct ListEventsQuery {
    /// Lower bound (exclusive) for `sell_from`, `YYYY-MM-DD`
    pub starts_at: Option<String>,
    /// Upper bound (exclusive) for `sell_to`, `YYYY-MM-DD`
    pub ends_at: Option<String>,
}

/// Lists online base events with at least one event selling inside the window
#[utoipa::path(
    get,
    path = "/events",
    params(ListEventsQuery),
    responses(
        (status = 200, description = "Matching events", body = Envelope<EventsData>, example = json!({
            "data": {
                "events": [{
                    "id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
                    "title": "Camela en concierto",
                    "start_date": "2020-07-01",
                    "start_time": "00:00:00",
                    "end_date": "2021-06-30",
                    "end_time": "21:00:00",
                    "min_price": "15.00",
                    "max_price": "30.00"
                }]
            },
            "error": null
        })),
        (status = 400, description = "Missing or malformed date parameter", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "events"
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<Envelope<EventsData>>, ApiError> {
    let starts_at = parse_day_start("starts_at", query.starts_at.as_deref())?;
    let ends_at = parse_day_start("ends_at", query.ends_at.as_deref())?;

    let repo = CatalogQueryRepository::new(state.db.clone());
    let entries = repo.list_online_events(starts_at, ends_at).await?;

    tracing::debug!(
        starts_at = %starts_at,
        ends_at = %ends_at,
        results = entries.len(),
        "Listed events"
    );

    Ok(Json(Envelope::ok(EventsData {
        events: entries.iter().map(summarize).collect(),
    })))
}

/// Parses `YYYY-MM-DD` into midnight of that day.
fn parse_day_start(name: &str, value: Option<&str>) -> Result<NaiveDateTime, ApiError> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Err(validation_error(
            &format!("Query parameter '{name}' is required"),
            json!({ name: "required" }),
        ));
    };

    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map(|date| date.and_time(chrono::NaiveTime::MIN))
        .map_err(|_| {
            validation_error(
                &format!("Query parameter '{name}' must be a date in YYYY-MM-DD format"),
                json!({ name: raw }),
            )
        })
}

/// Computes the public view of a catalog entry.
///
/// Start fields come from the event with the latest `sell_from`. End fields come
/// from the event with the latest `sell_to`: its `sell_to` date and its
/// `event_date` time of day. Prices span every zone of every event.
pub fn summarize(entry: &CatalogEntry) -> EventSummary {
    let latest_start = entry
        .events
        .iter()
        .max_by_key(|e| (e.sell_from, e.event_id))
        .map(|e| e.sell_from);
    let latest_end = entry
        .events
        .iter()
        .max_by_key(|e| (e.sell_to, e.event_id));

    let min_price = entry.prices.iter().min();
    let max_price = entry.prices.iter().max();

    EventSummary {
        id: entry.base_event.id,
        title: entry.base_event.title.clone(),
        start_date: format_or_na(latest_start, DATE_FORMAT),
        start_time: format_or_na(latest_start, "%H:%M:%S"),
        end_date: format_or_na(latest_end.map(|e| e.sell_to), DATE_FORMAT),
        end_time: format_or_na(latest_end.map(|e| e.event_date), "%H:%M:%S"),
        min_price: min_price.map_or_else(|| NOT_AVAILABLE.to_string(), |p| format!("{p:.2}")),
        max_price: max_price.map_or_else(|| NOT_AVAILABLE.to_string(), |p| format!("{p:.2}")),
    }
}

fn format_or_na(value: Option<NaiveDateTime>, format: &str) -> String {
    value.map_or_else(
        || NOT_AVAILABLE.to_string(),
        |v| v.format(format).to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{base_event, event};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn at(value: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn base(title: &str) -> base_event::Model {
        let now = Utc::now().fixed_offset();
        base_event::Model {
            id: Uuid::new_v4(),
            base_event_id: 1,
            title: title.to_string(),
            sell_mode: "online".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn occurrence(event_id: i64, event_date: &str, sell_from: &str, sell_to: &str) -> event::Model {
        let now = Utc::now().fixed_offset();
        event::Model {
            id: Uuid::new_v4(),
            event_id,
            base_event_id: 1,
            event_date: at(event_date),
            sell_from: at(sell_from),
            sell_to: at(sell_to),
            sold_out: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn summary_uses_latest_windows_and_price_span() {
        let entry = CatalogEntry {
            base_event: base("Tour"),
            events: vec![
                occurrence(
                    1,
                    "2021-07-02T21:30:00",
                    "2021-01-01T10:00:00",
                    "2021-06-30T20:00:00",
                ),
                occurrence(
                    2,
                    "2021-06-01T22:00:00",
                    "2021-02-01T09:30:00",
                    "2021-05-30T19:00:00",
                ),
            ],
            prices: vec![
                Decimal::new(1000, 2),
                Decimal::new(2550, 2),
                Decimal::new(2550, 2),
                Decimal::new(4000, 2),
            ],
        };

        let summary = summarize(&entry);
        assert_eq!(summary.title, "Tour");
        assert_eq!(summary.start_date, "2021-02-01");
        assert_eq!(summary.start_time, "09:30:00");
        assert_eq!(summary.end_date, "2021-06-30");
        assert_eq!(summary.end_time, "21:30:00");
        assert_eq!(summary.min_price, "10.00");
        assert_eq!(summary.max_price, "40.00");
    }

    #[test]
    fn summary_without_events_is_not_available() {
        let entry = CatalogEntry {
            base_event: base("Empty"),
            events: vec![],
            prices: vec![],
        };

        let summary = summarize(&entry);
        assert_eq!(summary.start_date, NOT_AVAILABLE);
        assert_eq!(summary.start_time, NOT_AVAILABLE);
        assert_eq!(summary.end_date, NOT_AVAILABLE);
        assert_eq!(summary.end_time, NOT_AVAILABLE);
        assert_eq!(summary.min_price, NOT_AVAILABLE);
        assert_eq!(summary.max_price, NOT_AVAILABLE);
    }

    #[test]
    fn zero_price_is_a_price() {
        let entry = CatalogEntry {
            base_event: base("Free"),
            events: vec![occurrence(1, "2021-07-02T21:30:00", "2021-01-01T10:00:00", "2021-06-30T20:00:00")],
            prices: vec![Decimal::ZERO, Decimal::new(5, 0)],
        };

        let summary = summarize(&entry);
        assert_eq!(summary.min_price, "0.00");
        assert_eq!(summary.max_price, "5.00");
    }

    #[test]
    fn date_parameters_are_validated() {
        assert_eq!(
            parse_day_start("starts_at", Some("2021-06-30")).unwrap(),
            at("2021-06-30T00:00:00")
        );

        let missing = parse_day_start("starts_at", None).unwrap_err();
        assert_eq!(missing.status, axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(&*missing.code, "VALIDATION_FAILED");

        let blank = parse_day_start("ends_at", Some("  ")).unwrap_err();
        assert_eq!(blank.status, axum::http::StatusCode::BAD_REQUEST);

        let malformed = parse_day_start("ends_at", Some("30/06/2021")).unwrap_err();
        assert!(malformed.message.contains("YYYY-MM-DD"));
    }
}
