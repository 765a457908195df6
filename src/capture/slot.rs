use crate::error::StoreError;
use crate::models::CaptureRecord;
use crate::store::{KeyValueStore, Record};
use std::sync::Arc;

/// Store key holding the pending capture
pub const SLOT_KEY: &str = "screenshot";

/// Single-entry buffer for a capture waiting to be turned into a prompt
///
/// A new capture replaces any unconsumed one. Reading is a take: the entry is
/// removed in the same step it is read, and expired entries are dropped.
pub struct CaptureSlot {
    store: Arc<dyn KeyValueStore>,
    ttl_ms: i64,
}

impl CaptureSlot {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl_ms: u64) -> Self {
        Self {
            store,
            ttl_ms: i64::try_from(ttl_ms).unwrap_or(i64::MAX),
        }
    }

    pub fn put(&self, record: &CaptureRecord) -> Result<(), StoreError> {
        let mut entry = Record::new();
        entry.insert(SLOT_KEY.to_string(), serde_json::to_value(record)?);
        self.store.set(entry)?;
        ::log::debug!("Stored capture taken at {}", record.captured_at);
        Ok(())
    }

    /// Takes the pending capture if it is younger than the TTL at `now_ms`
    pub fn take(&self, now_ms: i64) -> Result<Option<CaptureRecord>, StoreError> {
        let Some(value) = self.store.take(SLOT_KEY)? else {
            return Ok(None);
        };
        let record: CaptureRecord = match serde_json::from_value(value) {
            Ok(record) => record,
            Err(e) => {
                ::log::warn!("Discarding unreadable capture: {}", e);
                return Ok(None);
            }
        };

        let age = now_ms - record.captured_at;
        if age > self.ttl_ms {
            ::log::info!("Discarding capture taken {} ms ago", age);
            return Ok(None);
        }
        Ok(Some(record))
    }
}
