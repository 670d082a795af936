use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Fields every submitted transaction must carry.
pub const REQUIRED_FIELDS: [&str; 2] = ["author", "content"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransactionError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("field {0} must be a string")]
    InvalidField(&'static str),
}

/// A client-submitted payload. The chain never interprets it, it only
/// hashes it verbatim once it lands in a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub author: String,
    pub content: String,
    /// Unix timestamp (UTC) assigned by the receiving node.
    pub timestamp: i64,
    /// Any additional client fields, kept sorted so hashing is stable.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Transaction {
    pub fn new(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            content: content.into(),
            timestamp: Utc::now().timestamp(),
            extra: BTreeMap::new(),
        }
    }

    /// Build a transaction from raw client fields, stamping it with the
    /// current time. A client-supplied `timestamp` is overwritten.
    pub fn from_fields(mut fields: Map<String, Value>) -> Result<Self, TransactionError> {
        let author = take_required(&mut fields, REQUIRED_FIELDS[0])?;
        let content = take_required(&mut fields, REQUIRED_FIELDS[1])?;
        fields.remove("timestamp");

        Ok(Self {
            author,
            content,
            timestamp: Utc::now().timestamp(),
            extra: fields.into_iter().collect(),
        })
    }
}

fn take_required(
    fields: &mut Map<String, Value>,
    name: &'static str,
) -> Result<String, TransactionError> {
    match fields.remove(name) {
        None | Some(Value::Null) => Err(TransactionError::MissingField(name)),
        Some(Value::String(s)) if s.is_empty() => Err(TransactionError::MissingField(name)),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(TransactionError::InvalidField(name)),
    }
}
