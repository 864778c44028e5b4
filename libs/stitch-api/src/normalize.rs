use crate::error::IngestError;
use crate::record::{Record, SingleRecord};

/// Decode the input buffer: a JSON array of objects.
///
/// Any other top-level shape, or an element that is not an object, is a
/// decode error. There is no partial result.
pub fn decode_records(bytes: &[u8]) -> Result<Vec<Record>, IngestError> {
    serde_json::from_slice(bytes).map_err(IngestError::Decode)
}

/// Wrap every record as an upsert stamped with `sequence`, keeping order.
pub fn normalize(records: Vec<Record>, sequence: i64) -> Vec<SingleRecord> {
    records
        .into_iter()
        .map(|data| SingleRecord::upsert(data, sequence))
        .collect()
}

/// `decode_records` + `normalize`.
pub fn normalize_bytes(bytes: &[u8], sequence: i64) -> Result<Vec<SingleRecord>, IngestError> {
    Ok(normalize(decode_records(bytes)?, sequence))
}
