use crate::child_span_debug;
use crate::core::directory::cache::AgreementCache;
use crate::core::directory::store::AgreementStore;
use crate::core::models::agreement::AgreementRecord;
use opentelemetry::metrics::Counter;
use opentelemetry::{KeyValue, global};
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use thiserror::Error;
use tracing::{Instrument, debug, warn};

static LOOKUPS_TOTAL: LazyLock<Counter<u64>> = LazyLock::new(|| {
    global::meter("adx")
        .u64_counter("directory_lookups")
        .with_description("Partner directory lookups by source")
        .with_unit("1")
        .build()
});

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("partner directory unavailable: {0}")]
    Unavailable(String),
}

/// Cache-aside lookup of the agreements for a publisher.
///
/// The cache is advisory: an unreachable cache or an entry which does
/// not decode is treated as a miss, and failing to populate it is only
/// logged. Only a failed store read fails the lookup. Staleness is
/// bounded by `ttl`.
pub struct PartnerDirectory {
    store: Arc<dyn AgreementStore>,
    cache: Arc<dyn AgreementCache>,
    ttl: Duration,
}

impl PartnerDirectory {
    pub fn new(
        store: Arc<dyn AgreementStore>,
        cache: Arc<dyn AgreementCache>,
        ttl: Duration,
    ) -> Self {
        Self { store, cache, ttl }
    }

    /// Agreements for `ssp_id` ordered by dsp id, possibly empty
    pub async fn lookup(&self, ssp_id: &str) -> Result<Vec<Arc<AgreementRecord>>, DirectoryError> {
        if let Some(records) = self.cached(ssp_id).await {
            LOOKUPS_TOTAL.add(1, &[KeyValue::new("source", "cache")]);
            return Ok(records.into_iter().map(Arc::new).collect());
        }

        let mut records = self
            .store
            .agreements(ssp_id)
            .instrument(child_span_debug!("agreement_store_read", ssp_id = %ssp_id))
            .await
            .map_err(|e| DirectoryError::Unavailable(format!("{e:#}")))?;

        LOOKUPS_TOTAL.add(1, &[KeyValue::new("source", "store")]);

        records.retain(|record| {
            if !record.is_valid() {
                warn!(
                    "Dropping agreement {} -> {} with negative commission {}",
                    record.ssp_id, record.dsp_id, record.commission
                );
            }
            record.is_valid()
        });

        // store order is not stable between reads
        records.sort_by(|a, b| a.dsp_id.cmp(&b.dsp_id));

        self.populate(ssp_id, &records).await;

        Ok(records.into_iter().map(Arc::new).collect())
    }

    async fn cached(&self, ssp_id: &str) -> Option<Vec<AgreementRecord>> {
        let bytes = match self.cache.get(ssp_id).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!("Agreement cache read failed for {}: {}", ssp_id, e);
                return None;
            }
        };

        match serde_json::from_slice::<Vec<AgreementRecord>>(&bytes) {
            Ok(records) => {
                debug!("Agreement cache hit for {}", ssp_id);
                Some(records)
            }
            Err(e) => {
                warn!("Discarding corrupt agreement cache entry for {}: {}", ssp_id, e);
                None
            }
        }
    }

    async fn populate(&self, ssp_id: &str, records: &[AgreementRecord]) {
        let bytes = match serde_json::to_vec(records) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to encode agreements for {}: {}", ssp_id, e);
                return;
            }
        };

        if let Err(e) = self.cache.put(ssp_id, bytes, self.ttl).await {
            warn!("Agreement cache write failed for {}: {}", ssp_id, e);
        }
    }
}
