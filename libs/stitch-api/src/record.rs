use serde::{Deserialize, Serialize};

/// One decoded input row: arbitrary JSON object, passed through opaquely.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// An ordered group of records destined for one import request.
pub type Batch = Vec<SingleRecord>;

/// Operation applied by the import API to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    #[default]
    Upsert,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Upsert => f.write_str("upsert"),
        }
    }
}

/// A single row as sent in `messages` of a batch payload.
///
/// `sequence` is shared by every record of one invocation; the API uses it
/// to order versions of the same primary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleRecord {
    pub action: Action,
    pub sequence: i64,
    pub data: Record,
}

impl SingleRecord {
    pub fn upsert(data: Record, sequence: i64) -> Self {
        Self { action: Action::Upsert, sequence, data }
    }
}
