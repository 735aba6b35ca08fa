use serde::Deserialize;
use serde_json::{Map, Value};

/// One issue as returned by the search endpoint: its key plus the raw field map.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    pub key: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl RawRecord {
    /// The field value, treating an explicit `null` the same as a missing key.
    pub fn field(&self, id: &str) -> Option<&Value> {
        self.fields.get(id).filter(|v| !v.is_null())
    }
}
