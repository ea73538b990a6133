//! Pagination cursors.
//!
//! A references cursor maps each upload that still has results to that
//! upload's own continuation token, serialized as a JSON object and encoded
//! with standard base64. An empty map encodes to the empty string, which
//! means there are no more pages.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::QueryError;
use crate::types::UploadId;

/// Per-upload continuation tokens.
pub type Cursor = BTreeMap<UploadId, String>;

/// Encode a cursor. An empty cursor encodes to `""`.
pub fn encode_cursor(cursor: &Cursor) -> Result<String, QueryError> {
    if cursor.is_empty() {
        return Ok(String::new());
    }

    let json =
        serde_json::to_vec(cursor).map_err(|e| QueryError::InvalidCursor(e.to_string()))?;
    Ok(STANDARD.encode(json))
}

/// Decode a cursor. An absent or empty cursor is the first page.
pub fn decode_cursor(raw: Option<&str>) -> Result<Cursor, QueryError> {
    let Some(raw) = raw.filter(|raw| !raw.is_empty()) else {
        return Ok(Cursor::new());
    };

    let json = STANDARD
        .decode(raw)
        .map_err(|e| QueryError::InvalidCursor(e.to_string()))?;
    serde_json::from_slice(&json).map_err(|e| QueryError::InvalidCursor(e.to_string()))
}

/// Encode an integer offset cursor.
pub fn encode_offset_cursor(offset: usize) -> String {
    STANDARD.encode(offset.to_string())
}

/// Decode an integer offset cursor. An absent or empty cursor is offset 0.
pub fn decode_offset_cursor(raw: Option<&str>) -> Result<usize, QueryError> {
    let Some(raw) = raw.filter(|raw| !raw.is_empty()) else {
        return Ok(0);
    };

    let decoded = STANDARD
        .decode(raw)
        .map_err(|e| QueryError::InvalidCursor(e.to_string()))?;
    let text = String::from_utf8(decoded).map_err(|e| QueryError::InvalidCursor(e.to_string()))?;
    text.parse()
        .map_err(|_| QueryError::InvalidCursor(format!("not an offset: {:?}", text)))
}

/// Offset of the page following one of `count` items at `offset`, or `None`
/// if that page was the last.
pub fn next_offset(offset: usize, count: usize, total_count: usize) -> Option<usize> {
    let next = offset + count;
    (next < total_count).then_some(next)
}
