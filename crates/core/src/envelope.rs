// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Versioned encoding for persisted blobs.
//!
//! Every blob written to the local store is wrapped as
//! `{"version": N, "data": ...}` so a later release can migrate or discard
//! data it does not understand. Decoding keeps three outcomes apart:
//!
//! - `Ok(None)`: nothing stored under the key
//! - `Err(Error::CorruptedData)`: bytes are present but unreadable
//! - `Err(Error::UnsupportedVersion)`: readable, but written in another format

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

/// Serializes `data` inside a version envelope.
pub fn encode<T: Serialize>(version: u32, data: &T) -> Result<Vec<u8>> {
    let value = serde_json::json!({
        "version": version,
        "data": data,
    });
    Ok(serde_json::to_vec(&value)?)
}

/// Decodes a blob previously written by [`encode`] with the same version.
pub fn decode<T: DeserializeOwned>(blob: Option<&[u8]>, version: u32) -> Result<Option<T>> {
    let Some(bytes) = blob else {
        return Ok(None);
    };

    let mut value: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|e| Error::CorruptedData(format!("not valid JSON: {e}")))?;

    let found = value
        .get("version")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| Error::CorruptedData("missing version tag".to_string()))?;

    if found != u64::from(version) {
        return Err(Error::UnsupportedVersion {
            found: u32::try_from(found).unwrap_or(u32::MAX),
            expected: version,
        });
    }

    let data = value
        .get_mut("data")
        .map(serde_json::Value::take)
        .ok_or_else(|| Error::CorruptedData("missing data field".to_string()))?;

    serde_json::from_value(data)
        .map(Some)
        .map_err(|e| Error::CorruptedData(format!("unexpected shape: {e}")))
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
