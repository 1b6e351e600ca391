/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

//! Wire format of the `/data` and `/mutate` RPC endpoints.
//!
//! Requests are nested JSON arrays sent in the `f.req` form field. Responses start with a fixed
//! non-JSON marker, followed by a nested array where the payload sits under a numeric-string key.

use crate::photos::errors::GPhotosError;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde_json::{Map, Value, json};

/// Marker every RPC response body starts with
pub const RESPONSE_PREFIX: &str = ")]}'";

/// Opaque numeric identifiers used by the RPC protocol.
///
/// These carry no derivable meaning and must match the server exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u64)]
pub enum RpcKey {
    AlbumList = 72930366,
    PhotoList = 74806772,
    AlbumCreate = 79956622,
    AlbumRemoveItems = 85381832,
    /// Metadata entry on a photo row holding a video's duration and dimensions
    VideoInfo = 76647426,
    /// Marker on a photo row's media field for video items
    VideoMarker = 15658734,
}

impl RpcKey {
    pub fn id(self) -> u64 {
        self.into()
    }

    /// Form used as an object key in requests and responses
    pub fn key(self) -> String {
        self.id().to_string()
    }
}

// Envelope slot holding the payload
const DATA_SLOT: usize = 2;
const MUTATION_SLOT: usize = 1;

/// Removes [`RESPONSE_PREFIX`] and parses what remains as JSON
pub fn decode_envelope(body: &str) -> Result<Value, GPhotosError> {
    let json = body.strip_prefix(RESPONSE_PREFIX).ok_or_else(|| {
        GPhotosError::parse(format!("response does not start with {RESPONSE_PREFIX}"))
    })?;
    serde_json::from_str(json)
        .map_err(|err| GPhotosError::parse(format!("response is not valid JSON: {err}")))
}

/// Payload of a `/data` response
pub fn decode_data(body: &str, key: RpcKey) -> Result<Value, GPhotosError> {
    take_payload(decode_envelope(body)?, DATA_SLOT, key)
}

/// Payload of a `/mutate` response
pub fn decode_mutation(body: &str, key: RpcKey) -> Result<Value, GPhotosError> {
    take_payload(decode_envelope(body)?, MUTATION_SLOT, key)
}

fn take_payload(mut envelope: Value, slot: usize, key: RpcKey) -> Result<Value, GPhotosError> {
    let key_str = key.key();
    envelope
        .get_mut(0)
        .and_then(|entry| entry.get_mut(slot))
        .and_then(|payload| payload.get_mut(key_str.as_str()))
        .map(Value::take)
        .ok_or_else(|| GPhotosError::parse(format!("response has no payload for key {key_str}")))
}

/// Builds a listing request for one page, starting after `cursor`
pub fn list_request(key: RpcKey, cursor: Option<&str>) -> Value {
    let mut query = Map::new();
    query.insert(key.key(), json!([cursor, null, null, null, 1]));
    json!([[[key.id(), [Value::Object(query)], null, null, 1]]])
}

/// Wraps a mutation payload in the batch envelope the `/mutate` endpoint expects
pub fn mutation_request(key: RpcKey, payload: Value) -> Value {
    let mut mutation = Map::new();
    mutation.insert(key.key(), payload);
    json!(["af.maf", [["af.add", key.id(), [Value::Object(mutation)]]]])
}
