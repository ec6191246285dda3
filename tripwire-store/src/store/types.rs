use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

/// The durable documents tripwire keeps, one entry per resource or service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Document {
    CircuitBreakers,
    RetryHistory,
}

impl Document {
    pub const ALL: [Document; 2] = [Document::CircuitBreakers, Document::RetryHistory];

    pub fn as_str(&self) -> &'static str {
        match self {
            Document::CircuitBreakers => "circuit_breakers",
            Document::RetryHistory => "retry_history",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `name -> snapshot` mapping as stored on disk.
pub type Entries = BTreeMap<String, JsonValue>;

/// Field stamped into every saved entry.
pub const UPDATED_AT: &str = "updated_at";
