//! Read-side queries backing the public events listing.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::error::RepositoryError;
use crate::models::{
    SellMode, base_event,
    base_event::Entity as BaseEvent,
    event::{self, Entity as Event},
    event_zone::{self, Entity as EventZone},
};

/// A base event together with all of its events and every zone price under them.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub base_event: base_event::Model,
    pub events: Vec<event::Model>,
    pub prices: Vec<Decimal>,
}

#[derive(Debug, Clone)]
pub struct CatalogQueryRepository {
    pub db: Arc<DatabaseConnection>,
}

impl CatalogQueryRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Online base events with at least one event selling strictly inside
    /// `(starts_at, ends_at)`, ordered by `base_event_id`, each listed once.
    ///
    /// The window only selects base events; the returned entry carries all of
    /// their events and prices.
    pub async fn list_online_events(
        &self,
        starts_at: NaiveDateTime,
        ends_at: NaiveDateTime,
    ) -> Result<Vec<CatalogEntry>, RepositoryError> {
        let matching_ids: Vec<i64> = Event::find()
            .select_only()
            .column(event::Column::BaseEventId)
            .filter(event::Column::SellFrom.gt(starts_at))
            .filter(event::Column::SellTo.lt(ends_at))
            .distinct()
            .into_tuple()
            .all(&*self.db)
            .await?;

        if matching_ids.is_empty() {
            return Ok(Vec::new());
        }

        let base_events = BaseEvent::find()
            .filter(base_event::Column::BaseEventId.is_in(matching_ids))
            .filter(base_event::Column::SellMode.eq(SellMode::Online.as_str()))
            .order_by_asc(base_event::Column::BaseEventId)
            .all(&*self.db)
            .await?;

        if base_events.is_empty() {
            return Ok(Vec::new());
        }

        let base_ids: Vec<i64> = base_events.iter().map(|b| b.base_event_id).collect();
        let events = Event::find()
            .filter(event::Column::BaseEventId.is_in(base_ids))
            .order_by_asc(event::Column::EventId)
            .all(&*self.db)
            .await?;

        let event_owner: BTreeMap<i64, i64> = events
            .iter()
            .map(|e| (e.event_id, e.base_event_id))
            .collect();
        let zones = EventZone::find()
            .filter(event_zone::Column::EventId.is_in(event_owner.keys().copied().collect::<Vec<_>>()))
            .all(&*self.db)
            .await?;

        let mut events_by_base: BTreeMap<i64, Vec<event::Model>> = BTreeMap::new();
        for event in events {
            events_by_base
                .entry(event.base_event_id)
                .or_default()
                .push(event);
        }

        let mut prices_by_base: BTreeMap<i64, Vec<Decimal>> = BTreeMap::new();
        for zone in zones {
            if let Some(base_id) = event_owner.get(&zone.event_id) {
                prices_by_base.entry(*base_id).or_default().push(zone.price);
            }
        }

        Ok(base_events
            .into_iter()
            .map(|base_event| {
                let id = base_event.base_event_id;
                CatalogEntry {
                    events: events_by_base.remove(&id).unwrap_or_default(),
                    prices: prices_by_base.remove(&id).unwrap_or_default(),
                    base_event,
                }
            })
            .collect())
    }
}
