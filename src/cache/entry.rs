//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL, flags and CAS support.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

// == Constants ==
/// Expiration times above this many seconds are absolute Unix timestamps (30 days).
pub const RELATIVE_TTL_LIMIT_SECS: u64 = 60 * 60 * 24 * 30;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored payload
    pub value: Bytes,
    /// Opaque client flags, returned verbatim on retrieval
    pub flags: u32,
    /// CAS token assigned when this version of the entry was written
    pub cas: u64,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry.
    ///
    /// # Arguments
    /// * `value` - The payload to store
    /// * `flags` - Client flags
    /// * `ttl_seconds` - Expiration time as sent by the client (0 = never)
    /// * `cas` - Token issued for this write
    pub fn new(value: Bytes, flags: u32, ttl_seconds: u64, cas: u64) -> Self {
        let now = current_timestamp_ms();

        Self {
            value,
            flags,
            cas,
            created_at: now,
            expires_at: expiry_from_ttl(ttl_seconds, now),
        }
    }

    // == Size ==
    /// Bytes charged against the cache capacity: the payload length.
    pub fn size(&self) -> u64 {
        self.value.len() as u64
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// its expiration time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Same as [`CacheEntry::is_expired`] against a caller-provided clock reading.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires) => now_ms >= expires,
            None => false,
        }
    }
}

// == Cache Item ==
/// Snapshot of an entry handed out of the store.
///
/// `Bytes` is reference counted, so cloning the payload out of the store is cheap
/// and callers never hold a reference into the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheItem {
    pub key: Bytes,
    pub value: Bytes,
    pub flags: u32,
    pub cas: u64,
}

impl CacheItem {
    pub(crate) fn from_entry(key: &Bytes, entry: &CacheEntry) -> Self {
        Self {
            key: key.clone(),
            value: entry.value.clone(),
            flags: entry.flags,
            cas: entry.cas,
        }
    }
}

// == Utility Functions ==
/// Converts a client expiration time into an absolute expiry in Unix milliseconds.
///
/// - `0` never expires
/// - up to 30 days is relative to `now_ms`
/// - anything larger is an absolute Unix timestamp in seconds
pub fn expiry_from_ttl(ttl_seconds: u64, now_ms: u64) -> Option<u64> {
    match ttl_seconds {
        0 => None,
        ttl if ttl > RELATIVE_TTL_LIMIT_SECS => Some(ttl.saturating_mul(1000)),
        ttl => Some(now_ms.saturating_add(ttl * 1000)),
    }
}

/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = CacheEntry::new(Bytes::from("test_value"), 0, 0, 1);

        assert_eq!(entry.value, Bytes::from("test_value"));
        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired());
        assert_eq!(entry.size(), 10);
    }

    #[test]
    fn test_entry_creation_with_ttl() {
        let entry = CacheEntry::new(Bytes::from("test_value"), 7, 60, 1);

        assert_eq!(entry.flags, 7);
        let expires = entry.expires_at.unwrap();
        assert_eq!(expires, entry.created_at + 60_000);
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new(Bytes::from("test_value"), 0, 1, 1);

        assert!(!entry.is_expired());

        sleep(Duration::from_millis(1100));

        assert!(entry.is_expired());
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = current_timestamp_ms();
        let entry = CacheEntry {
            value: Bytes::from("test"),
            flags: 0,
            cas: 1,
            created_at: now,
            expires_at: Some(now),
        };

        assert!(entry.is_expired_at(now), "Entry should be expired at boundary");
        assert!(!entry.is_expired_at(now - 1));
    }

    #[test]
    fn test_expiry_relative_and_absolute() {
        let now = 1_000_000;
        assert_eq!(expiry_from_ttl(0, now), None);
        assert_eq!(expiry_from_ttl(2, now), Some(now + 2_000));
        assert_eq!(
            expiry_from_ttl(RELATIVE_TTL_LIMIT_SECS, now),
            Some(now + RELATIVE_TTL_LIMIT_SECS * 1000)
        );

        // Past the 30 day limit the value is a Unix timestamp in seconds
        let absolute = RELATIVE_TTL_LIMIT_SECS + 1;
        assert_eq!(expiry_from_ttl(absolute, now), Some(absolute * 1000));
    }

    #[test]
    fn test_absolute_expiry_in_the_past_is_expired() {
        // Well past 30 days of seconds but long before "now"
        let entry = CacheEntry::new(Bytes::from("old"), 0, RELATIVE_TTL_LIMIT_SECS + 10, 1);
        assert!(entry.is_expired());
    }

    #[test]
    fn test_item_snapshot() {
        let entry = CacheEntry::new(Bytes::from("v"), 3, 0, 42);
        let item = CacheItem::from_entry(&Bytes::from("k"), &entry);

        assert_eq!(item.key, Bytes::from("k"));
        assert_eq!(item.value, Bytes::from("v"));
        assert_eq!(item.flags, 3);
        assert_eq!(item.cas, 42);
    }
}
