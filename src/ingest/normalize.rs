//! Attribute coercion.
//!
//! Converts untyped parser nodes into typed records. Every constructor looks only
//! at its own node, so a bad value never leaks into a sibling or a parent.

use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::{Decimal, RoundingStrategy};

use super::error::FieldError;
use super::parser::{Attributes, BaseEventNode, EventNode, ZoneNode};
use crate::repositories::{
    BaseEventAttributes, EventAttributes, EventZoneAttributes, EventZoneKey, ZoneAttributes,
};

/// Timestamp layout used by the feed, e.g. `2021-06-30T21:00:00`.
pub const FEED_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Smallest magnitude that no longer fits DECIMAL(10, 2).
const PRICE_LIMIT: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseEventRecord {
    pub base_event_id: i64,
    pub title: String,
    pub sell_mode: String,
}

impl BaseEventRecord {
    pub fn from_node(node: &BaseEventNode) -> Result<Self, FieldError> {
        let attrs = &node.attributes;
        Ok(Self {
            base_event_id: integer(attrs, "base_event_id")?,
            title: text(attrs, "title"),
            sell_mode: text(attrs, "sell_mode"),
        })
    }

    pub fn attributes(&self) -> BaseEventAttributes {
        BaseEventAttributes {
            title: self.title.clone(),
            sell_mode: self.sell_mode.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub event_id: i64,
    pub event_date: NaiveDateTime,
    pub sell_from: NaiveDateTime,
    pub sell_to: NaiveDateTime,
    pub sold_out: bool,
}

impl EventRecord {
    /// The occurrence date is read from `event_date`, falling back to the
    /// `event_start_date` attribute the live feed publishes.
    pub fn from_node(node: &EventNode) -> Result<Self, FieldError> {
        let attrs = &node.attributes;
        let date_field = if attrs.contains_key("event_date") {
            "event_date"
        } else if attrs.contains_key("event_start_date") {
            "event_start_date"
        } else {
            "event_date"
        };

        Ok(Self {
            event_id: integer(attrs, "event_id")?,
            event_date: timestamp(attrs, date_field)?,
            sell_from: timestamp(attrs, "sell_from")?,
            sell_to: timestamp(attrs, "sell_to")?,
            sold_out: flag(attrs, "sold_out"),
        })
    }

    pub fn attributes(&self, base_event_id: i64) -> EventAttributes {
        EventAttributes {
            base_event_id,
            event_date: self.event_date,
            sell_from: self.sell_from,
            sell_to: self.sell_to,
            sold_out: self.sold_out,
        }
    }
}

/// Zone identity: the feed-global part of a `<zone>` node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneRecord {
    pub zone_id: i64,
    pub name: String,
}

impl ZoneRecord {
    pub fn from_node(node: &ZoneNode) -> Result<Self, FieldError> {
        let attrs = &node.attributes;
        Ok(Self {
            zone_id: integer(attrs, "zone_id")?,
            name: text(attrs, "name"),
        })
    }

    pub fn attributes(&self) -> ZoneAttributes {
        ZoneAttributes {
            name: self.name.clone(),
        }
    }

    pub fn event_zone_key(&self, event_id: i64) -> EventZoneKey {
        EventZoneKey {
            event_id,
            zone_id: self.zone_id,
        }
    }
}

/// Price and availability of a zone for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZonePriceRecord {
    pub price: Decimal,
    pub capacity: i64,
    pub numbered: bool,
}

impl ZonePriceRecord {
    pub fn from_node(node: &ZoneNode) -> Result<Self, FieldError> {
        let attrs = &node.attributes;
        let capacity = integer(attrs, "capacity")?;
        if capacity < 0 {
            return Err(FieldError::invalid(
                "capacity",
                raw(attrs, "capacity").unwrap_or_default(),
                "must not be negative",
            ));
        }

        Ok(Self {
            price: price(attrs, "price")?,
            capacity,
            numbered: flag(attrs, "numbered"),
        })
    }

    pub fn attributes(&self) -> EventZoneAttributes {
        EventZoneAttributes {
            price: self.price,
            capacity: self.capacity,
            numbered: self.numbered,
        }
    }
}

fn raw<'a>(attrs: &'a Attributes, field: &str) -> Option<&'a str> {
    attrs.get(field).map(String::as_str)
}

fn text(attrs: &Attributes, field: &str) -> String {
    raw(attrs, field).unwrap_or_default().to_string()
}

/// Only the literal `"true"` is true.
fn flag(attrs: &Attributes, field: &str) -> bool {
    raw(attrs, field) == Some("true")
}

fn integer(attrs: &Attributes, field: &'static str) -> Result<i64, FieldError> {
    let value = raw(attrs, field).ok_or_else(|| FieldError::missing(field))?;
    value
        .trim()
        .parse::<i64>()
        .map_err(|e| FieldError::invalid(field, value, format!("not a base-10 integer ({e})")))
}

fn price(attrs: &Attributes, field: &'static str) -> Result<Decimal, FieldError> {
    let value = raw(attrs, field).ok_or_else(|| FieldError::missing(field))?;
    let parsed = Decimal::from_str(value.trim())
        .map_err(|e| FieldError::invalid(field, value, format!("not a decimal number ({e})")))?;

    let rounded = parsed.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded.abs() >= PRICE_LIMIT {
        return Err(FieldError::invalid(
            field,
            value,
            "exceeds 8 integer digits",
        ));
    }
    Ok(rounded)
}

fn timestamp(attrs: &Attributes, field: &'static str) -> Result<NaiveDateTime, FieldError> {
    let value = raw(attrs, field).ok_or_else(|| FieldError::missing(field))?;
    let trimmed = value.trim();
    NaiveDateTime::parse_from_str(trimmed, FEED_TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f"))
        .map_err(|e| {
            FieldError::invalid(
                field,
                value,
                format!("expected {FEED_TIMESTAMP_FORMAT} ({e})"),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn zone(pairs: &[(&str, &str)]) -> ZoneNode {
        ZoneNode {
            attributes: attrs(pairs),
        }
    }

    #[test]
    fn base_event_strings_pass_through() {
        let node = BaseEventNode {
            attributes: attrs(&[("base_event_id", " 291 "), ("sell_mode", "online")]),
            events: vec![],
        };
        let record = BaseEventRecord::from_node(&node).unwrap();
        assert_eq!(record.base_event_id, 291);
        assert_eq!(record.title, "");
        assert_eq!(record.sell_mode, "online");
    }

    #[test]
    fn base_event_id_must_be_numeric() {
        let node = BaseEventNode {
            attributes: attrs(&[("base_event_id", "29a")]),
            events: vec![],
        };
        let err = BaseEventRecord::from_node(&node).unwrap_err();
        assert_eq!(err.field, "base_event_id");
        assert_eq!(err.raw.as_deref(), Some("29a"));
    }

    #[test]
    fn event_timestamps_and_sold_out() {
        let node = EventNode {
            attributes: attrs(&[
                ("event_id", "1642"),
                ("event_date", "2021-02-10T20:00:00"),
                ("sell_from", "2021-01-01T00:00:00.250"),
                ("sell_to", "2021-02-09T19:50:00"),
                ("sold_out", "TRUE"),
            ]),
            zones: vec![],
        };
        let record = EventRecord::from_node(&node).unwrap();

        assert_eq!(
            record.event_date,
            NaiveDate::from_ymd_opt(2021, 2, 10)
                .unwrap()
                .and_hms_opt(20, 0, 0)
                .unwrap()
        );
        assert_eq!(record.sell_from.date(), NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert!(!record.sold_out);
    }

    #[test]
    fn event_date_falls_back_to_start_date_attribute() {
        let node = EventNode {
            attributes: attrs(&[
                ("event_id", "291"),
                ("event_start_date", "2021-06-30T21:00:00"),
                ("sell_from", "2020-07-01T00:00:00"),
                ("sell_to", "2021-06-30T20:00:00"),
                ("sold_out", "true"),
            ]),
            zones: vec![],
        };
        let record = EventRecord::from_node(&node).unwrap();
        assert_eq!(record.event_date.to_string(), "2021-06-30 21:00:00");
        assert!(record.sold_out);
    }

    #[test]
    fn unparsable_timestamp_is_field_error() {
        let node = EventNode {
            attributes: attrs(&[
                ("event_id", "1"),
                ("event_date", "30/06/2021"),
                ("sell_from", "2020-07-01T00:00:00"),
                ("sell_to", "2021-06-30T20:00:00"),
            ]),
            zones: vec![],
        };
        let err = EventRecord::from_node(&node).unwrap_err();
        assert_eq!(err.field, "event_date");
        assert_eq!(err.raw.as_deref(), Some("30/06/2021"));

        let node = EventNode {
            attributes: attrs(&[("event_id", "1"), ("event_date", "2021-06-30T21:00:00")]),
            zones: vec![],
        };
        let err = EventRecord::from_node(&node).unwrap_err();
        assert_eq!(err.field, "sell_from");
        assert_eq!(err.raw, None);
    }

    #[test]
    fn zone_identity_ignores_price_fields() {
        let record = ZoneRecord::from_node(&zone(&[
            ("zone_id", " 40 "),
            ("name", "Platea"),
            ("price", "abc"),
            ("capacity", "-1"),
        ]))
        .unwrap();
        assert_eq!(record.zone_id, 40);
        assert_eq!(record.name, "Platea");
        assert_eq!(record.event_zone_key(7).to_string(), "7/40");

        let err = ZoneRecord::from_node(&zone(&[("price", "1.00"), ("capacity", "1")])).unwrap_err();
        assert_eq!(err, FieldError::missing("zone_id"));
    }

    #[test]
    fn zone_numbered_is_lenient() {
        let base = [("price", "20.00"), ("capacity", "243")];

        let absent = ZonePriceRecord::from_node(&zone(&base)).unwrap();
        assert!(!absent.numbered);

        for value in ["false", "True", "1", "yes", ""] {
            let mut pairs = base.to_vec();
            pairs.push(("numbered", value));
            assert!(!ZonePriceRecord::from_node(&zone(&pairs)).unwrap().numbered);
        }

        let mut pairs = base.to_vec();
        pairs.push(("numbered", "true"));
        assert!(ZonePriceRecord::from_node(&zone(&pairs)).unwrap().numbered);
    }

    #[test]
    fn zone_price_rounds_to_cents() {
        let record =
            ZonePriceRecord::from_node(&zone(&[("price", "25.505"), ("capacity", "0")])).unwrap();
        assert_eq!(record.price, Decimal::new(2551, 2));
        assert_eq!(record.price.to_string(), "25.51");
    }

    #[test]
    fn zone_price_rejects_bad_numbers() {
        let err =
            ZonePriceRecord::from_node(&zone(&[("price", "abc"), ("capacity", "10")])).unwrap_err();
        assert_eq!(err.field, "price");

        let err =
            ZonePriceRecord::from_node(&zone(&[("price", "1.00"), ("capacity", "-3")])).unwrap_err();
        assert_eq!(err.field, "capacity");
        assert_eq!(err.raw.as_deref(), Some("-3"));

        let err = ZonePriceRecord::from_node(&zone(&[("price", "123456789.00"), ("capacity", "1")]))
            .unwrap_err();
        assert_eq!(err.field, "price");
    }
}
