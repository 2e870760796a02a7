/* Records are flat string-to-string field maps with a store-assigned id,
mirroring the schema-flexible document model the API exposes. The id format
follows the 12-byte hex convention of document databases: timestamp,
per-process discriminator, counter. */

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use coursebook_base::{CoursebookError, CoursebookResult};

/// Number of hex characters in a record id.
const ID_LENGTH: usize = 24;

static COUNTER: AtomicU32 = AtomicU32::new(0);
static PROCESS_FIELD: OnceLock<u64> = OnceLock::new();

/// 40-bit discriminator mixed from the process id and startup time, so ids
/// from different processes do not collide.
fn process_field() -> u64 {
    *PROCESS_FIELD.get_or_init(|| {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos() as u64)
            .unwrap_or(0);
        let pid = std::process::id() as u64;
        (pid.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ nanos.wrapping_mul(0xC2B2_AE3D_27D4_EB4F))
            & 0xFF_FFFF_FFFF
    })
}

/// Unique identifier of a persisted record.
///
/// Always 24 lowercase hex characters. Assigned by the store on insert and
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    /// Generate a fresh id: 4 bytes of unix seconds, 5 bytes of process
    /// discriminator, 3 bytes of counter.
    pub fn generate() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0) as u32;
        let count = COUNTER.fetch_add(1, Ordering::Relaxed) & 0xFF_FFFF;
        Self(format!(
            "{:08x}{:010x}{:06x}",
            secs,
            process_field(),
            count
        ))
    }

    /// Parse an id from client input.
    ///
    /// Accepts exactly 24 hex characters (either case, normalized to
    /// lowercase). Anything else fails with `InvalidIdentifier` so malformed
    /// ids never reach the store.
    pub fn parse(input: &str) -> CoursebookResult<Self> {
        if input.len() != ID_LENGTH || !input.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Box::new(CoursebookError::invalid_identifier(input)));
        }
        Ok(Self(input.to_ascii_lowercase()))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted record: store-assigned id plus a flat field map.
///
/// Field values are always strings; nesting and typed values are not part
/// of the data model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    id: RecordId,
    fields: BTreeMap<String, String>,
}

impl Record {
    /// Create a record with the given id and fields.
    pub fn new(id: RecordId, fields: BTreeMap<String, String>) -> Self {
        Self { id, fields }
    }

    /// Get the record id.
    pub fn id(&self) -> &RecordId {
        &self.id
    }

    /// Get all fields.
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Get a single field value.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Overwrite a single field value.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Check whether every filter entry matches this record exactly.
    /// A filter field the record does not carry never matches.
    pub fn matches(&self, filter: &BTreeMap<String, String>) -> bool {
        filter
            .iter()
            .all(|(key, value)| self.field(key) == Some(value.as_str()))
    }
}
