//! XML feed parser.
//!
//! Turns the raw document into `base_event → event → zone` nodes whose
//! attributes are kept as untyped strings. Only the document structure is
//! checked here: the root must contain a container element, and the
//! base-event list is read from that root's first child element. Unknown
//! elements are skipped together with their content.

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::error::ParseError;

/// Attribute name to raw attribute value, as found on the element.
pub type Attributes = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseEventNode {
    pub attributes: Attributes,
    pub events: Vec<EventNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventNode {
    pub attributes: Attributes,
    pub zones: Vec<ZoneNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneNode {
    pub attributes: Attributes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Root,
    Container,
    BaseEvent,
    Event,
    Zone,
    Skipped,
}

struct FeedBuilder {
    stack: Vec<Frame>,
    root_name: Option<String>,
    root_closed: bool,
    container_seen: bool,
    nodes: Vec<BaseEventNode>,
}

impl FeedBuilder {
    fn new() -> Self {
        Self {
            stack: Vec::new(),
            root_name: None,
            root_closed: false,
            container_seen: false,
            nodes: Vec::new(),
        }
    }

    /// Classifies a newly opened element and records nodes we care about.
    fn open(&mut self, reader: &Reader<&[u8]>, element: &BytesStart<'_>) -> Result<Frame, ParseError> {
        let local_name = element.local_name();
        let name = local_name.as_ref();

        let frame = match self.stack.last().copied() {
            None if self.root_closed => {
                return Err(malformed(reader, "content after the root element"));
            }
            None => {
                self.root_name = Some(String::from_utf8_lossy(element.name().as_ref()).into_owned());
                Frame::Root
            }
            Some(Frame::Root) if !self.container_seen => {
                self.container_seen = true;
                Frame::Container
            }
            Some(Frame::Container) if name == b"base_event" => {
                self.nodes.push(BaseEventNode {
                    attributes: read_attributes(reader, element)?,
                    events: Vec::new(),
                });
                Frame::BaseEvent
            }
            Some(Frame::BaseEvent) if name == b"event" => {
                let attributes = read_attributes(reader, element)?;
                if let Some(base_event) = self.nodes.last_mut() {
                    base_event.events.push(EventNode {
                        attributes,
                        zones: Vec::new(),
                    });
                }
                Frame::Event
            }
            Some(Frame::Event) if name == b"zone" => {
                let attributes = read_attributes(reader, element)?;
                if let Some(event) = self
                    .nodes
                    .last_mut()
                    .and_then(|base_event| base_event.events.last_mut())
                {
                    event.zones.push(ZoneNode { attributes });
                }
                Frame::Zone
            }
            Some(_) => Frame::Skipped,
        };

        Ok(frame)
    }

    fn close(&mut self) {
        if self.stack.pop() == Some(Frame::Root) {
            self.root_closed = true;
        }
    }

    fn finish(self, reader: &Reader<&[u8]>) -> Result<Vec<BaseEventNode>, ParseError> {
        let Some(root) = self.root_name else {
            return Err(ParseError::EmptyDocument);
        };
        if !self.stack.is_empty() {
            return Err(malformed(reader, "unexpected end of document"));
        }
        if !self.container_seen {
            return Err(ParseError::MissingContainer { root });
        }
        Ok(self.nodes)
    }
}

/// Parses a feed document into base-event nodes.
///
/// Each base event may carry zero or more events, and each event zero or more
/// zones. Not well-formed XML, an empty document or a root without a
/// container element is a [`ParseError`].
pub fn parse_feed(raw: &[u8]) -> Result<Vec<BaseEventNode>, ParseError> {
    let mut reader = Reader::from_reader(raw);
    let mut builder = FeedBuilder::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| malformed(&reader, e.to_string()))?;

        match event {
            Event::Start(element) => {
                let frame = builder.open(&reader, &element)?;
                builder.stack.push(frame);
            }
            Event::Empty(element) => {
                let frame = builder.open(&reader, &element)?;
                builder.stack.push(frame);
                builder.close();
            }
            Event::End(_) => builder.close(),
            Event::Eof => break,
            Event::Text(text) if builder.stack.is_empty() => {
                if text.iter().any(|b| !b.is_ascii_whitespace()) {
                    return Err(malformed(&reader, "text outside the root element"));
                }
            }
            _ => {}
        }
    }

    builder.finish(&reader)
}

fn read_attributes(reader: &Reader<&[u8]>, element: &BytesStart<'_>) -> Result<Attributes, ParseError> {
    let decoder = reader.decoder();
    let mut attributes = Attributes::new();

    for attribute in element.attributes() {
        let attribute = attribute.map_err(|e| malformed(reader, e.to_string()))?;
        let key = decoder
            .decode(attribute.key.as_ref())
            .map_err(|e| malformed(reader, e.to_string()))?
            .into_owned();
        let value = attribute
            .decode_and_unescape_value(decoder)
            .map_err(|e| malformed(reader, e.to_string()))?
            .into_owned();
        attributes.insert(key, value);
    }

    Ok(attributes)
}

fn malformed(reader: &Reader<&[u8]>, message: impl Into<String>) -> ParseError {
    ParseError::Malformed {
        position: reader.buffer_position() as u64,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<eventList xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" version="1.0">
  <output>
    <base_event base_event_id="291" sell_mode="online" title="Camela en concierto">
      <event event_start_date="2021-06-30T21:00:00" event_end_date="2021-06-30T22:00:00" event_id="291" sell_from="2020-07-01T00:00:00" sell_to="2021-06-30T20:00:00" sold_out="false">
        <zone zone_id="40" capacity="243" price="20.00" name="Platea" numbered="true" />
        <zone zone_id="38" capacity="100" price="15.00" name="Grada 2" numbered="false" />
      </event>
    </base_event>
    <base_event base_event_id="322" sell_mode="online" organizer_company_id="2" title="Pantomima Full">
      <event event_start_date="2021-02-10T20:00:00" event_id="1642" sell_from="2021-01-01T00:00:00" sell_to="2021-02-09T19:50:00" sold_out="false">
        <zone zone_id="311" capacity="2" price="55.00" name="A28" numbered="true" />
      </event>
    </base_event>
  </output>
</eventList>"#;

    #[test]
    fn parses_nested_nodes_with_raw_attributes() {
        let nodes = parse_feed(SAMPLE.as_bytes()).unwrap();

        assert_eq!(nodes.len(), 2);
        let first = &nodes[0];
        assert_eq!(first.attributes["base_event_id"], "291");
        assert_eq!(first.attributes["title"], "Camela en concierto");
        assert_eq!(first.events.len(), 1);
        assert_eq!(first.events[0].zones.len(), 2);
        assert_eq!(first.events[0].zones[1].attributes["name"], "Grada 2");
        assert_eq!(first.events[0].zones[0].attributes["price"], "20.00");

        assert_eq!(nodes[1].attributes["organizer_company_id"], "2");
    }

    #[test]
    fn tolerates_zero_and_multiple_events() {
        let doc = r#"<eventList><output>
            <base_event base_event_id="1" title="None" sell_mode="online"/>
            <base_event base_event_id="2" title="Two" sell_mode="online">
              <event event_id="10"/>
              <event event_id="11"><zone zone_id="5"/></event>
            </base_event>
        </output></eventList>"#;

        let nodes = parse_feed(doc.as_bytes()).unwrap();
        assert!(nodes[0].events.is_empty());
        assert_eq!(nodes[1].events.len(), 2);
        assert!(nodes[1].events[0].zones.is_empty());
        assert_eq!(nodes[1].events[1].zones.len(), 1);
    }

    #[test]
    fn skips_unknown_elements() {
        let doc = r#"<eventList><output>
            <promo id="9"><base_event base_event_id="99"/></promo>
            <base_event base_event_id="1" title="T" sell_mode="online">
              <venue name="Hall"><event event_id="77"/></venue>
              <event event_id="10"><note>bring id</note><zone zone_id="5"/></event>
            </base_event>
        </output><trailer/></eventList>"#;

        let nodes = parse_feed(doc.as_bytes()).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].events.len(), 1);
        assert_eq!(nodes[0].events[0].attributes["event_id"], "10");
        assert_eq!(nodes[0].events[0].zones.len(), 1);
    }

    #[test]
    fn only_the_first_root_child_is_the_container() {
        let doc = r#"<eventList><output/><output><base_event base_event_id="1"/></output></eventList>"#;
        assert!(parse_feed(doc.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn unescapes_attribute_values() {
        let doc = r#"<eventList><output><base_event base_event_id="1" title="Tom &amp; Jerry"/></output></eventList>"#;
        let nodes = parse_feed(doc.as_bytes()).unwrap();
        assert_eq!(nodes[0].attributes["title"], "Tom & Jerry");
    }

    #[test]
    fn structural_failures_are_parse_errors() {
        assert_eq!(parse_feed(b""), Err(ParseError::EmptyDocument));
        assert_eq!(parse_feed(b"   \n"), Err(ParseError::EmptyDocument));
        assert_eq!(
            parse_feed(b"<eventList/>"),
            Err(ParseError::MissingContainer {
                root: "eventList".to_string()
            })
        );
        assert!(matches!(
            parse_feed(b"<eventList><output></eventList>"),
            Err(ParseError::Malformed { .. })
        ));
        assert!(matches!(
            parse_feed(b"<eventList><output>"),
            Err(ParseError::Malformed { .. })
        ));
        assert!(matches!(
            parse_feed(b"not xml at all"),
            Err(ParseError::Malformed { .. })
        ));
    }
}
