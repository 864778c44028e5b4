use serde::{Deserialize, Serialize};

use crate::error::IngestError;
use crate::record::{Batch, Record, SingleRecord};

/// Import API accepts up to 4 MB per request; keep headroom for the envelope.
pub const DEFAULT_MAX_BYTES: usize = 3_900_000;
/// Import API accepts up to 20k messages per request.
pub const DEFAULT_MAX_COUNT: usize = 19_500;

// ═══════════════════════════════════════════════════════════════
//  Limits
// ═══════════════════════════════════════════════════════════════

/// Ceilings applied to every batch.
///
/// A batch is sealed right after the record that makes its byte total reach
/// `max_bytes` or its length reach `max_count`. A batch therefore never holds
/// more than `max_count` records, and only its last record can carry the byte
/// total past `max_bytes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchLimits {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
    #[serde(default = "default_max_count")]
    pub max_count: usize,
}

fn default_max_bytes() -> usize {
    DEFAULT_MAX_BYTES
}
fn default_max_count() -> usize {
    DEFAULT_MAX_COUNT
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self { max_bytes: DEFAULT_MAX_BYTES, max_count: DEFAULT_MAX_COUNT }
    }
}

impl BatchLimits {
    pub fn new(max_bytes: usize, max_count: usize) -> Self {
        Self { max_bytes, max_count }
    }

    pub fn validate(&self) -> Result<(), IngestError> {
        if self.max_bytes == 0 {
            return Err(IngestError::config("max_bytes must be greater than 0"));
        }
        if self.max_count == 0 {
            return Err(IngestError::config("max_count must be greater than 0"));
        }
        Ok(())
    }

    fn is_full(&self, bytes: usize, count: usize) -> bool {
        bytes >= self.max_bytes || count >= self.max_count
    }
}

// ═══════════════════════════════════════════════════════════════
//  Sizing
// ═══════════════════════════════════════════════════════════════

/// Measures the size a record's data payload contributes to a batch.
///
/// Only `data` is measured; the action/sequence envelope is not counted.
pub trait RecordSizer {
    fn size(&self, data: &Record) -> Result<usize, serde_json::Error>;
}

/// Compact JSON length of the data payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSizer;

impl RecordSizer for JsonSizer {
    fn size(&self, data: &Record) -> Result<usize, serde_json::Error> {
        let mut counter = ByteCounter(0);
        serde_json::to_writer(&mut counter, data)?;
        Ok(counter.0)
    }
}

/// Writer that only counts bytes, so sizing does not allocate.
struct ByteCounter(usize);

impl std::io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0 += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════
//  Partitioner
// ═══════════════════════════════════════════════════════════════

/// Cuts an ordered stream of records into batches.
///
/// All state lives in the value; one partitioner per invocation.
pub struct Partitioner<S = JsonSizer> {
    limits: BatchLimits,
    sizer: S,
    batches: Vec<Batch>,
    current: Batch,
    current_bytes: usize,
    pushed: usize,
}

impl Partitioner<JsonSizer> {
    pub fn new(limits: BatchLimits) -> Result<Self, IngestError> {
        Self::with_sizer(limits, JsonSizer)
    }
}

impl<S: RecordSizer> Partitioner<S> {
    /// Zero ceilings are rejected.
    pub fn with_sizer(limits: BatchLimits, sizer: S) -> Result<Self, IngestError> {
        limits.validate()?;
        Ok(Self {
            limits,
            sizer,
            batches: Vec::new(),
            current: Vec::new(),
            current_bytes: 0,
            pushed: 0,
        })
    }

    /// Append one record to the current batch, sealing it if a ceiling is hit.
    ///
    /// A failed measurement leaves the partitioner unchanged.
    pub fn push(&mut self, record: SingleRecord) -> Result<(), IngestError> {
        let size = self
            .sizer
            .size(&record.data)
            .map_err(|source| IngestError::Measure { index: self.pushed, source })?;

        self.pushed += 1;
        self.current.push(record);
        self.current_bytes += size;

        if self.limits.is_full(self.current_bytes, self.current.len()) {
            self.seal();
        }
        Ok(())
    }

    /// Number of batches sealed so far.
    pub fn sealed(&self) -> usize {
        self.batches.len()
    }

    /// Seal the in-progress batch (if any) and return all batches in order.
    pub fn finish(mut self) -> Vec<Batch> {
        if !self.current.is_empty() {
            self.seal();
        }
        self.batches
    }

    fn seal(&mut self) {
        let batch = std::mem::take(&mut self.current);
        tracing::debug!(
            batch = self.batches.len(),
            records = batch.len(),
            bytes = self.current_bytes,
            "batch sealed"
        );
        self.current_bytes = 0;
        self.batches.push(batch);
    }
}

/// Split `records` into batches under `limits`, measuring with [`JsonSizer`].
pub fn partition(
    records: Vec<SingleRecord>,
    limits: BatchLimits,
) -> Result<Vec<Batch>, IngestError> {
    partition_with(records, limits, JsonSizer)
}

/// Same as [`partition`] with a caller-provided sizer.
pub fn partition_with<S: RecordSizer>(
    records: Vec<SingleRecord>,
    limits: BatchLimits,
    sizer: S,
) -> Result<Vec<Batch>, IngestError> {
    let mut partitioner = Partitioner::with_sizer(limits, sizer)?;
    for record in records {
        partitioner.push(record)?;
    }
    Ok(partitioner.finish())
}
