use async_trait::async_trait;
use moka::Expiry;
use moka::sync::Cache;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
    #[error("cache rejected write: {0}")]
    Rejected(String),
}

/// Advisory byte cache in front of the agreement store, keyed by ssp id.
/// Entries carry their own ttl, given at write time.
#[async_trait]
pub trait AgreementCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;
}

#[derive(Clone)]
struct Entry {
    bytes: Arc<[u8]>,
    ttl: Duration,
}

struct EntryTtl;

impl Expiry<String, Entry> for EntryTtl {
    fn expire_after_create(&self, _key: &String, value: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In process [`AgreementCache`], bounded by entry count
pub struct LocalAgreementCache {
    cache: Cache<String, Entry>,
}

impl LocalAgreementCache {
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryTtl)
            .build();

        Self { cache }
    }
}

#[async_trait]
impl AgreementCache for LocalAgreementCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.cache.get(key).map(|entry| entry.bytes.to_vec()))
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        if ttl.is_zero() {
            return Err(CacheError::Rejected(format!("zero ttl for {key}")));
        }

        self.cache.insert(
            key.to_string(),
            Entry {
                bytes: value.into(),
                ttl,
            },
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let cache = LocalAgreementCache::new(16);

        cache.put("ssp", b"[1,2]".to_vec(), Duration::from_secs(60)).await.unwrap();

        assert_eq!(cache.get("ssp").await.unwrap(), Some(b"[1,2]".to_vec()));
        assert_eq!(cache.get("other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_entry_expires_after_its_ttl() {
        let cache = LocalAgreementCache::new(16);

        cache.put("short", b"a".to_vec(), Duration::from_millis(50)).await.unwrap();
        cache.put("long", b"b".to_vec(), Duration::from_secs(60)).await.unwrap();

        // moka reads its own clock, so this waits in real time
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(cache.get("short").await.unwrap(), None);
        assert_eq!(cache.get("long").await.unwrap(), Some(b"b".to_vec()));
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let cache = LocalAgreementCache::new(16);

        cache.put("ssp", b"old".to_vec(), Duration::from_secs(60)).await.unwrap();
        cache.put("ssp", b"new".to_vec(), Duration::from_secs(60)).await.unwrap();

        assert_eq!(cache.get("ssp").await.unwrap(), Some(b"new".to_vec()));
    }

    #[tokio::test]
    async fn test_zero_ttl_rejected() {
        let cache = LocalAgreementCache::new(16);

        let err = cache.put("ssp", b"x".to_vec(), Duration::ZERO).await;

        assert!(matches!(err, Err(CacheError::Rejected(_))));
        assert_eq!(cache.get("ssp").await.unwrap(), None);
    }
}
