//! Depth-first reconciliation of parsed feed nodes against the repositories.
//!
//! Order within a base-event subtree is fixed: base event, then each event,
//! then for each zone the zone row followed by its event-zone row. A failure
//! skips exactly the subtree rooted at the failing record:
//!
//! | failing record         | skipped                         |
//! |------------------------|---------------------------------|
//! | base event             | its events and their zones      |
//! | event                  | its zones                       |
//! | zone id or name        | the zone and its event-zone row |
//! | zone price or capacity | the event-zone row only         |

use std::fmt;

use tracing::{debug, info, instrument};

use super::error::PersistenceError;
use super::normalize::{BaseEventRecord, EventRecord, ZonePriceRecord, ZoneRecord};
use super::parser::{Attributes, BaseEventNode, EventNode, ZoneNode};
use super::report::{EntityKind, RunReporter};
use crate::repositories::{
    BaseEventAttributes, CatalogRepositories, EventAttributes, EventZoneAttributes, EventZoneKey,
    UpsertRepository, Upserted, ZoneAttributes,
};

pub struct Reconciler<B, E, Z, EZ> {
    repositories: CatalogRepositories<B, E, Z, EZ>,
}

impl<B, E, Z, EZ> Reconciler<B, E, Z, EZ>
where
    B: UpsertRepository<Key = i64, Attributes = BaseEventAttributes>,
    E: UpsertRepository<Key = i64, Attributes = EventAttributes>,
    Z: UpsertRepository<Key = i64, Attributes = ZoneAttributes>,
    EZ: UpsertRepository<Key = EventZoneKey, Attributes = EventZoneAttributes>,
{
    pub fn new(repositories: CatalogRepositories<B, E, Z, EZ>) -> Self {
        Self { repositories }
    }

    pub fn repositories(&self) -> &CatalogRepositories<B, E, Z, EZ> {
        &self.repositories
    }

    /// Reconciles every base-event subtree in document order.
    #[instrument(skip_all, fields(run_id = %reporter.run_id(), base_events = nodes.len()))]
    pub async fn reconcile(&self, nodes: &[BaseEventNode], reporter: &mut RunReporter) {
        for node in nodes {
            self.reconcile_base_event(node, reporter).await;
        }
    }

    async fn reconcile_base_event(&self, node: &BaseEventNode, reporter: &mut RunReporter) {
        let raw_id = raw_id(&node.attributes, "base_event_id");

        let record = match BaseEventRecord::from_node(node) {
            Ok(record) => record,
            Err(err) => {
                reporter.record_field_error(EntityKind::BaseEvent, raw_id, &err);
                return;
            }
        };

        let outcome = self
            .repositories
            .base_events
            .upsert(record.base_event_id, record.attributes())
            .await;
        if !self.settle(EntityKind::BaseEvent, record.base_event_id, outcome, reporter) {
            return;
        }

        for event in &node.events {
            self.reconcile_event(record.base_event_id, event, reporter)
                .await;
        }
    }

    async fn reconcile_event(&self, base_event_id: i64, node: &EventNode, reporter: &mut RunReporter) {
        let raw_id = raw_id(&node.attributes, "event_id");

        let record = match EventRecord::from_node(node) {
            Ok(record) => record,
            Err(err) => {
                reporter.record_field_error(EntityKind::Event, raw_id, &err);
                return;
            }
        };

        let outcome = self
            .repositories
            .events
            .upsert(record.event_id, record.attributes(base_event_id))
            .await;
        if !self.settle(EntityKind::Event, record.event_id, outcome, reporter) {
            return;
        }

        for zone in &node.zones {
            self.reconcile_zone(record.event_id, zone, reporter).await;
        }
    }

    /// Zone row first, then the join row that references it. A bad price
    /// part leaves the zone row in place and fails only the join row.
    async fn reconcile_zone(&self, event_id: i64, node: &ZoneNode, reporter: &mut RunReporter) {
        let zone = match ZoneRecord::from_node(node) {
            Ok(zone) => zone,
            Err(err) => {
                reporter.record_field_error(
                    EntityKind::Zone,
                    raw_id(&node.attributes, "zone_id"),
                    &err,
                );
                return;
            }
        };

        let outcome = self
            .repositories
            .zones
            .upsert(zone.zone_id, zone.attributes())
            .await;
        if !self.settle(EntityKind::Zone, zone.zone_id, outcome, reporter) {
            return;
        }

        let key = zone.event_zone_key(event_id);
        let price = match ZonePriceRecord::from_node(node) {
            Ok(price) => price,
            Err(err) => {
                let external_id = key.to_string();
                reporter.record_field_error(
                    EntityKind::EventZone,
                    Some(external_id.as_str()),
                    &err,
                );
                return;
            }
        };

        let outcome = self
            .repositories
            .event_zones
            .upsert(key, price.attributes())
            .await;
        self.settle(EntityKind::EventZone, key, outcome, reporter);
    }

    /// Books an upsert outcome; `false` means the subtree must be skipped.
    fn settle<K: fmt::Display, M>(
        &self,
        entity: EntityKind,
        external_id: K,
        outcome: Result<Upserted<M>, crate::error::RepositoryError>,
        reporter: &mut RunReporter,
    ) -> bool {
        match outcome {
            Ok(upserted) => {
                if upserted.is_created() {
                    info!(entity = %entity, external_id = %external_id, "Created new record");
                    reporter.record_created(entity);
                } else {
                    debug!(entity = %entity, external_id = %external_id, "Updated record");
                    reporter.record_updated(entity);
                }
                true
            }
            Err(source) => {
                reporter.record_persistence_error(&PersistenceError {
                    entity,
                    external_id: external_id.to_string(),
                    source,
                });
                false
            }
        }
    }
}

fn raw_id<'a>(attributes: &'a Attributes, field: &str) -> Option<&'a str> {
    attributes.get(field).map(String::as_str)
}
