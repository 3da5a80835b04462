use crate::core::models::settlement::SettlementRecord;
use crate::core::settlement::sink::{SettlementError, SettlementSink};
use opentelemetry::metrics::Counter;
use opentelemetry::{KeyValue, global};
use rust_decimal::Decimal;
use std::sync::{Arc, LazyLock};
use tokio::task::JoinHandle;
use tracing::{debug, error};

static SETTLEMENTS_TOTAL: LazyLock<Counter<u64>> = LazyLock::new(|| {
    global::meter("adx")
        .u64_counter("settlements")
        .with_description("Settlement writes attempted for won auctions")
        .with_unit("1")
        .build()
});

/// Persists the economics of won auctions. Best effort only:
/// there is no retry and a lost write is never surfaced
/// to the publisher response.
pub struct SettlementRecorder {
    sink: Arc<dyn SettlementSink>,
}

impl SettlementRecorder {
    pub fn new(sink: Arc<dyn SettlementSink>) -> Self {
        Self { sink }
    }

    /// Stamp and write a settlement, returning the sink failure if any
    pub async fn record(
        &self,
        ssp_id: &str,
        dsp_id: &str,
        publisher_floor: Decimal,
        clearing_price: Decimal,
        commission: Decimal,
    ) -> Result<(), SettlementError> {
        let record =
            SettlementRecord::new(ssp_id, dsp_id, publisher_floor, clearing_price, commission);

        Self::write(self.sink.as_ref(), &record).await
    }

    /// Fire and forget variant of [`Self::record`]. Failures are
    /// logged and counted, the returned handle may be dropped.
    pub fn submit(
        &self,
        ssp_id: &str,
        dsp_id: &str,
        publisher_floor: Decimal,
        clearing_price: Decimal,
        commission: Decimal,
    ) -> JoinHandle<()> {
        let record =
            SettlementRecord::new(ssp_id, dsp_id, publisher_floor, clearing_price, commission);

        let sink = self.sink.clone();

        tokio::spawn(async move {
            if let Err(e) = Self::write(sink.as_ref(), &record).await {
                error!(
                    "Lost settlement for ssp {} dsp {}: {}",
                    record.ssp_id, record.dsp_id, e
                );
            }
        })
    }

    async fn write(sink: &dyn SettlementSink, record: &SettlementRecord) -> Result<(), SettlementError> {
        let result = sink.write(record).await;

        let status = if result.is_ok() { "written" } else { "failed" };
        SETTLEMENTS_TOTAL.add(1, &[KeyValue::new("status", status)]);

        if result.is_ok() {
            debug!(
                "Settled {} -> {} at {} over floor {}",
                record.ssp_id, record.dsp_id, record.clearing_price, record.publisher_floor
            );
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct MemorySink {
        records: Mutex<Vec<SettlementRecord>>,
    }

    #[async_trait]
    impl SettlementSink for MemorySink {
        async fn write(&self, record: &SettlementRecord) -> Result<(), SettlementError> {
            self.records.lock().push(record.clone());
            Ok(())
        }
    }

    struct BrokenSink;

    #[async_trait]
    impl SettlementSink for BrokenSink {
        async fn write(&self, _record: &SettlementRecord) -> Result<(), SettlementError> {
            Err(SettlementError::Write("table gone".into()))
        }
    }

    #[tokio::test]
    async fn test_record_writes_all_fields() {
        let sink = Arc::new(MemorySink::default());
        let recorder = SettlementRecorder::new(sink.clone());

        recorder
            .record("ssp", "dsp-b", Decimal::new(1000, 2), Decimal::new(125, 1), Decimal::new(2, 1))
            .await
            .unwrap();

        let records = sink.records.lock();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ssp_id, "ssp");
        assert_eq!(records[0].dsp_id, "dsp-b");
        assert_eq!(records[0].publisher_floor, Decimal::new(10, 0));
        assert_eq!(records[0].clearing_price, Decimal::new(125, 1));
        assert_eq!(records[0].commission, Decimal::new(2, 1));
        assert_eq!(records[0].margin(), Decimal::new(25, 1));
    }

    #[tokio::test]
    async fn test_record_surfaces_write_error() {
        let recorder = SettlementRecorder::new(Arc::new(BrokenSink));

        let err = recorder
            .record("ssp", "dsp", Decimal::ONE, Decimal::TWO, Decimal::ZERO)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("table gone"));
    }

    #[tokio::test]
    async fn test_submit_swallows_write_error() {
        let recorder = SettlementRecorder::new(Arc::new(BrokenSink));

        let handle = recorder.submit("ssp", "dsp", Decimal::ONE, Decimal::TWO, Decimal::ZERO);

        assert!(handle.await.is_ok(), "task must not panic on sink failure");
    }

    #[tokio::test]
    async fn test_submit_writes_in_background() {
        let sink = Arc::new(MemorySink::default());
        let recorder = SettlementRecorder::new(sink.clone());

        recorder
            .submit("ssp", "dsp", Decimal::ONE, Decimal::TWO, Decimal::ZERO)
            .await
            .unwrap();

        assert_eq!(sink.records.lock().len(), 1);
    }
}
