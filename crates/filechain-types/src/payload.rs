use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::record::FileRecord;

/// Marker message carried by the genesis block.
pub const GENESIS_MESSAGE: &str = "Genesis Block";

/// Append-only retraction of an earlier file record.
///
/// A tombstone marks every earlier record with the same content address as
/// retracted without rewriting the blocks that hold them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tombstone {
    pub content_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// What a block carries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    /// The index-0 sentinel. Never listed, never matched by lookups.
    Genesis { message: String },
    /// A file record.
    File(FileRecord),
    /// A retraction of earlier records.
    Tombstone(Tombstone),
}

impl Payload {
    pub fn genesis() -> Self {
        Self::Genesis {
            message: GENESIS_MESSAGE.to_string(),
        }
    }

    pub fn is_genesis(&self) -> bool {
        matches!(self, Self::Genesis { .. })
    }

    pub fn as_file(&self) -> Option<&FileRecord> {
        match self {
            Self::File(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_file_mut(&mut self) -> Option<&mut FileRecord> {
        match self {
            Self::File(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_tombstone(&self) -> Option<&Tombstone> {
        match self {
            Self::Tombstone(t) => Some(t),
            _ => None,
        }
    }

    /// Short label used in logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Genesis { .. } => "genesis",
            Self::File(_) => "file",
            Self::Tombstone(_) => "tombstone",
        }
    }

    /// Canonical JSON value used for digest computation.
    ///
    /// Independent of the serde layout so that export field changes can never
    /// silently change digests.
    pub fn canonical_value(&self) -> Value {
        match self {
            Self::Genesis { message } => json!({
                "kind": "genesis",
                "message": message,
            }),
            Self::File(record) => {
                let mut value = record.canonical_value();
                if let Value::Object(map) = &mut value {
                    map.insert("kind".into(), Value::from("file"));
                }
                value
            }
            Self::Tombstone(t) => json!({
                "content_address": t.content_address,
                "kind": "tombstone",
                "reason": t.reason,
            }),
        }
    }
}

impl From<FileRecord> for Payload {
    fn from(record: FileRecord) -> Self {
        Self::File(record)
    }
}

impl From<Tombstone> for Payload {
    fn from(tombstone: Tombstone) -> Self {
        Self::Tombstone(tombstone)
    }
}
