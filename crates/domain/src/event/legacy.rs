//! Boundary adapter upgrading older event shapes to [`DomainEvent`].
//!
//! Known historical shapes:
//!
//! * `emergency_situation_started`: `emergency_situation_id`,
//!   `initiator_id`, a single `affected_area`, no severity, timestamp in
//!   `date_time_occurred_utc` or `started_on`.
//! * `emergency_situation_ended`: `emergency_situation_id`, timestamp in
//!   `occurred_on` or `ended_on`.
//! * `emergency_started` carrying a single `affected_area` instead of a list.
//!
//! All of them are rewritten in place and then decoded as the canonical enum,
//! so subscribers only ever see one shape per event type.

use serde_json::{Map, Value};

use super::DomainEvent;

const TYPE_RENAMES: &[(&str, &str)] = &[
    ("emergency_situation_started", "emergency_started"),
    ("emergency_situation_ended", "emergency_ended"),
];

const FIELD_RENAMES: &[(&str, &str)] = &[
    ("emergency_situation_id", "emergency_id"),
    ("initiator_id", "initiator_user_id"),
    ("date_time_occurred_utc", "occurred_at"),
    ("started_on", "occurred_at"),
    ("occurred_on", "occurred_at"),
    ("ended_on", "occurred_at"),
];

/// Errors raised while decoding an inbound event.
#[derive(Debug, thiserror::Error)]
pub enum EventDecodeError {
    #[error("event payload must be a JSON object")]
    NotAnObject,

    #[error("event payload has no \"type\" field")]
    MissingType,

    #[error("malformed event: {0}")]
    Json(#[from] serde_json::Error),
}

/// Entry point for events arriving from outside the process.
pub struct EventEnvelope;

impl EventEnvelope {
    /// Decode a JSON document in any known shape.
    ///
    /// # Errors
    ///
    /// Returns [`EventDecodeError`] when the input is not an object, has no
    /// type tag, or does not match any known shape.
    pub fn decode(input: &str) -> Result<DomainEvent, EventDecodeError> {
        let value: Value = serde_json::from_str(input)?;
        Self::decode_value(value)
    }

    /// Same as [`decode`](Self::decode) for an already parsed value.
    ///
    /// # Errors
    ///
    /// See [`decode`](Self::decode).
    pub fn decode_value(value: Value) -> Result<DomainEvent, EventDecodeError> {
        let Value::Object(mut object) = value else {
            return Err(EventDecodeError::NotAnObject);
        };
        upgrade(&mut object)?;
        Ok(serde_json::from_value(Value::Object(object))?)
    }
}

fn upgrade(object: &mut Map<String, Value>) -> Result<(), EventDecodeError> {
    let tag = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or(EventDecodeError::MissingType)?
        .to_owned();

    if let Some((_, canonical)) = TYPE_RENAMES.iter().find(|(old, _)| *old == tag) {
        object.insert("type".to_owned(), Value::String((*canonical).to_owned()));
    }

    for (old, new) in FIELD_RENAMES {
        if object.contains_key(*new) {
            object.remove(*old);
        } else if let Some(value) = object.remove(*old) {
            object.insert((*new).to_owned(), value);
        }
    }

    if let Some(area) = object.remove("affected_area")
        && !object.contains_key("affected_areas")
        && !area.is_null()
    {
        object.insert("affected_areas".to_owned(), Value::Array(vec![area]));
    }

    Ok(())
}
