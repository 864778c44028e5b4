use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// JSON-schema style description of one `data` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Describes the structure of `SingleRecord::data` for the target table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub properties: BTreeMap<String, Property>,
}

/// One field declaration as written in config: name, type, optional format.
///
/// ```toml
/// [[schema]]
/// name = "created_at"
/// type = "string"
/// format = "date-time"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTrait {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub format: Option<String>,
}

impl FieldTrait {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self { name: name.into(), field_type: field_type.into(), format: None }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

/// Build a schema from field declarations.
///
/// An empty `format` is dropped. A repeated name overrides the earlier entry.
pub fn build_schema<'a>(traits: impl IntoIterator<Item = &'a FieldTrait>) -> Schema {
    let properties = traits
        .into_iter()
        .map(|t| {
            let property = Property {
                field_type: t.field_type.clone(),
                format: t.format.clone().filter(|f| !f.is_empty()),
            };
            (t.name.clone(), property)
        })
        .collect();
    Schema { properties }
}
