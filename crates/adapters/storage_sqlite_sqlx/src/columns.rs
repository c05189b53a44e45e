//! Conversions between domain values and `SQLite` column values.

use std::str::FromStr;

use serde::Serialize;
use serde::de::DeserializeOwned;

use safelink_domain::time::Timestamp;

use crate::error::decode_err;

pub(crate) fn parse<T>(value: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    T::from_str(value).map_err(decode_err)
}

pub(crate) fn parse_time(value: &str) -> Result<Timestamp, sqlx::Error> {
    Ok(chrono::DateTime::parse_from_rfc3339(value)
        .map_err(decode_err)?
        .to_utc())
}

pub(crate) fn parse_optional_time(value: Option<String>) -> Result<Option<Timestamp>, sqlx::Error> {
    value.as_deref().map(parse_time).transpose()
}

/// Read a unit-variant enum stored as its bare serde name.
pub(crate) fn parse_enum<T: DeserializeOwned>(value: &str) -> Result<T, sqlx::Error> {
    serde_json::from_str(&format!("\"{value}\"")).map_err(decode_err)
}

/// Store a unit-variant enum as its bare serde name.
pub(crate) fn enum_text<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    Ok(match serde_json::to_value(value)? {
        serde_json::Value::String(name) => name,
        other => other.to_string(),
    })
}

pub(crate) fn version_from_column(value: i64) -> Result<u64, sqlx::Error> {
    u64::try_from(value).map_err(decode_err)
}

pub(crate) fn integer_param<T>(value: T) -> Result<i64, sqlx::Error>
where
    i64: TryFrom<T, Error = std::num::TryFromIntError>,
{
    i64::try_from(value).map_err(|err| sqlx::Error::Encode(Box::new(err)))
}
