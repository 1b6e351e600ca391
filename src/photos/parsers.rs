/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::photos::errors::GPhotosError;
use crate::photos::protocol::RpcKey;
use crate::photos::MediaType;
use chrono::{DateTime, Utc};
use serde::de::Error;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::str::FromStr;

/// A listing row split into its positional fields and the metadata map trailing them.
#[derive(Debug, Clone, Default)]
pub(crate) struct RawRow {
    fields: Vec<Value>,
    metadata: Map<String, Value>,
}

impl RawRow {
    pub(crate) fn from_value(value: Value) -> Result<Self, GPhotosError> {
        let Value::Array(mut fields) = value else {
            return Err(GPhotosError::parse("listing row is not an array"));
        };
        let metadata = if matches!(fields.last(), Some(Value::Object(_))) {
            match fields.pop() {
                Some(Value::Object(map)) => map,
                _ => Map::new(),
            }
        } else {
            Map::new()
        };
        Ok(Self { fields, metadata })
    }

    pub(crate) fn field(&self, idx: usize) -> Option<&Value> {
        self.fields.get(idx)
    }

    pub(crate) fn metadata(&self, key: RpcKey) -> Option<&Value> {
        self.metadata.get(key.key().as_str())
    }

    pub(crate) fn str_field(&self, idx: usize, what: &str) -> Result<String, GPhotosError> {
        self.field(idx)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| GPhotosError::parse(format!("listing row is missing {what}")))
    }

    pub(crate) fn time_field(&self, idx: usize, what: &str) -> Result<DateTime<Utc>, GPhotosError> {
        self.field(idx)
            .and_then(as_datetime)
            .ok_or_else(|| GPhotosError::parse(format!("listing row is missing {what}")))
    }
}

// Numbers sometimes arrive as floats
pub(crate) fn as_i64(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|v| v as i64))
}

pub(crate) fn as_u64(value: &Value) -> Option<u64> {
    as_i64(value).and_then(|v| u64::try_from(v).ok())
}

// Epoch milliseconds
pub(crate) fn as_datetime(value: &Value) -> Option<DateTime<Utc>> {
    as_i64(value).and_then(DateTime::from_timestamp_millis)
}

// Parses a media kind, unrecognised kinds become Unknown
pub fn from_media_kind<'de, D>(deserializer: D) -> Result<MediaType, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    MediaType::from_str(&s).or(Ok(MediaType::Unknown))
}

// Parses integers that may have been sent as strings
pub fn from_number_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v: Value = Deserialize::deserialize(deserializer)?;
    let parsed = match &v {
        Value::String(s) => s.parse().ok(),
        other => as_i64(other),
    };
    parsed.ok_or_else(|| D::Error::custom(format!("expected an integer, found {v}")))
}
