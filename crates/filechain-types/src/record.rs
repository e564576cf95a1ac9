use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::TypeError;

/// Uploader recorded when the caller does not name one.
pub const ANONYMOUS_UPLOADER: &str = "anonymous";

/// Metadata binding one uploaded file to its content address.
///
/// A record is an immutable value once it is wrapped in a block. The ledger
/// does not enforce uniqueness of `content_address`; duplicates across blocks
/// are distinct historical events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Original file name, non-empty.
    pub name: String,
    /// Lowercase extension (text after the last `.`), possibly empty.
    pub extension: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Opaque identifier issued by the content-addressed blob store.
    pub content_address: String,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// Who uploaded the file.
    #[serde(default = "default_uploader")]
    pub uploader: String,
}

fn default_uploader() -> String {
    ANONYMOUS_UPLOADER.to_string()
}

impl FileRecord {
    /// Build a record stamped with the current time and an anonymous uploader.
    pub fn new(
        name: impl Into<String>,
        size_bytes: u64,
        content_address: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            extension: Self::extension_of(&name),
            name,
            size_bytes,
            content_address: content_address.into(),
            created_at: Utc::now(),
            uploader: default_uploader(),
        }
    }

    /// Set the uploader. Blank names fall back to the anonymous sentinel.
    pub fn with_uploader(mut self, uploader: impl Into<String>) -> Self {
        let uploader = uploader.into();
        self.uploader = if uploader.trim().is_empty() {
            default_uploader()
        } else {
            uploader
        };
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Lowercased text after the last `.` of a file name, or empty.
    pub fn extension_of(name: &str) -> String {
        match name.rsplit_once('.') {
            Some((_, ext)) => ext.to_lowercase(),
            None => String::new(),
        }
    }

    /// Caller-side input checks. The ledger never calls this itself.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.name.trim().is_empty() {
            return Err(TypeError::EmptyName);
        }
        if self.content_address.trim().is_empty() {
            return Err(TypeError::EmptyContentAddress);
        }
        Ok(())
    }

    /// Canonical JSON value used for digest computation.
    pub fn canonical_value(&self) -> Value {
        json!({
            "content_address": self.content_address,
            "created_at": canonical_time(&self.created_at),
            "extension": self.extension,
            "name": self.name,
            "size_bytes": self.size_bytes,
            "uploader": self.uploader,
        })
    }
}

/// RFC 3339, UTC, fixed nanosecond precision, `Z` suffix.
pub fn canonical_time(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}
