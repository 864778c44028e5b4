use serde::{Deserialize, Serialize};

use crate::error::IngestError;
use crate::record::Batch;
use crate::schema::Schema;

/// Body of one `POST /v2/import/batch` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPayload {
    pub table_name: String,
    pub schema: Schema,
    pub messages: Batch,
    pub key_names: Vec<String>,
}

impl BatchPayload {
    pub fn new(
        table_name: impl Into<String>,
        schema: Schema,
        messages: Batch,
        key_names: Vec<String>,
    ) -> Self {
        Self { table_name: table_name.into(), schema, messages, key_names }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, IngestError> {
        serde_json::to_vec(self).map_err(IngestError::Encode)
    }
}

/// Package every batch with the same table, schema and key names.
pub fn package(
    batches: Vec<Batch>,
    table_name: &str,
    schema: &Schema,
    key_names: &[String],
) -> Vec<BatchPayload> {
    batches
        .into_iter()
        .map(|messages| BatchPayload::new(table_name, schema.clone(), messages, key_names.to_vec()))
        .collect()
}
