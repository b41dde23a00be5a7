//! Error taxonomy of an ingestion run.
//!
//! Only [`FetchError`] and [`ParseError`] end a run. [`FieldError`] and
//! [`PersistenceError`] are scoped to one record subtree and end up in the run
//! report instead.

use thiserror::Error;

use super::report::EntityKind;
use crate::error::RepositoryError;

/// Retrieving the feed failed; there is nothing to reconcile.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid feed url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("feed {url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("failed to read feed body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// The document is not a usable feed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("feed document is empty")]
    EmptyDocument,
    #[error("malformed feed document at byte {position}: {message}")]
    Malformed { position: u64, message: String },
    #[error("feed root <{root}> has no container element")]
    MissingContainer { root: String },
}

/// One attribute could not be coerced into its typed value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("field `{field}` {}: {reason}", describe_raw(.raw))]
pub struct FieldError {
    pub field: &'static str,
    /// Raw attribute value; `None` when the attribute was absent.
    pub raw: Option<String>,
    pub reason: String,
}

fn describe_raw(raw: &Option<String>) -> String {
    match raw {
        Some(value) => format!("has invalid value {value:?}"),
        None => "is missing".to_string(),
    }
}

impl FieldError {
    pub fn missing(field: &'static str) -> Self {
        Self {
            field,
            raw: None,
            reason: "attribute not present".to_string(),
        }
    }

    pub fn invalid(field: &'static str, raw: &str, reason: impl Into<String>) -> Self {
        Self {
            field,
            raw: Some(raw.to_string()),
            reason: reason.into(),
        }
    }
}

/// A repository write failed for one record.
#[derive(Debug, Error)]
#[error("failed to persist {entity} {external_id}: {source}")]
pub struct PersistenceError {
    pub entity: EntityKind,
    pub external_id: String,
    #[source]
    pub source: RepositoryError,
}

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_error_messages_name_field_and_value() {
        let err = FieldError::invalid("price", "abc", "not a decimal number");
        assert_eq!(
            err.to_string(),
            "field `price` has invalid value \"abc\": not a decimal number"
        );

        let err = FieldError::missing("zone_id");
        assert_eq!(
            err.to_string(),
            "field `zone_id` is missing: attribute not present"
        );
    }

    #[test]
    fn persistence_error_names_entity() {
        let err = PersistenceError {
            entity: EntityKind::Event,
            external_id: "291".to_string(),
            source: RepositoryError::Validation("bad".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "failed to persist event 291: validation failed: bad"
        );
    }
}
