//! Record normalization and batch partitioning for the Stitch Import API.
//!
//! Input bytes (a JSON array of objects) are decoded, wrapped as upserts
//! stamped with one sequence value, then cut into batches bounded by
//! serialized size and record count. Transport lives in `stitch-client`.

pub mod batch;
pub mod error;
pub mod normalize;
pub mod payload;
pub mod record;
pub mod schema;
mod util;

pub use batch::{
    partition, partition_with, BatchLimits, JsonSizer, Partitioner, RecordSizer,
    DEFAULT_MAX_BYTES, DEFAULT_MAX_COUNT,
};
pub use error::{ErrorKind, IngestError};
pub use normalize::{decode_records, normalize, normalize_bytes};
pub use payload::{package, BatchPayload};
pub use record::{Action, Batch, Record, SingleRecord};
pub use schema::{build_schema, FieldTrait, Property, Schema};
pub use util::now_secs;

/// Decode, normalize and partition in one call.
pub fn build_message_batches(
    bytes: &[u8],
    sequence: i64,
    limits: BatchLimits,
) -> Result<Vec<Batch>, IngestError> {
    partition(normalize_bytes(bytes, sequence)?, limits)
}
