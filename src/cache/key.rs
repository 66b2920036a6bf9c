//! Cache key derivation.
//!
//! A key is the operation name followed by a SHA-256 digest of the canonical
//! JSON form of the operation's arguments. Object keys are sorted before
//! hashing, so two argument structs that differ only in field order map to
//! the same entry.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::cache::{CacheError, MAX_KEY_LENGTH};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Builds the key for `operation` invoked with `args`.
    pub fn derive<A>(operation: &str, args: &A) -> Result<Self, CacheError>
    where
        A: Serialize + ?Sized,
    {
        if operation.is_empty() {
            return Err(CacheError::InvalidKey(
                "operation name cannot be empty".to_string(),
            ));
        }

        let value = serde_json::to_value(args)?;
        let mut canonical = String::new();
        write_canonical(&value, &mut canonical);

        let digest = Sha256::digest(canonical.as_bytes());
        let key = format!("{operation}:{}", hex::encode(digest));

        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidKey(format!(
                "key exceeds maximum length of {MAX_KEY_LENGTH} bytes"
            )));
        }

        Ok(Self(key))
    }

    /// Wraps a prebuilt key string.
    pub fn from_raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The operation segment of the key.
    pub fn operation(&self) -> &str {
        self.0.split_once(':').map_or(&self.0, |(op, _)| op)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Writes `value` as JSON with object members sorted by key.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut members: Vec<_> = map.iter().collect();
            members.sort_by(|(a, _), (b, _)| a.cmp(b));
            out.push('{');
            for (i, (name, member)) in members.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(name.clone()).to_string());
                out.push(':');
                write_canonical(member, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
