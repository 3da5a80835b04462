use crate::core::models::settlement::SettlementRecord;
use crate::core::settlement::sink::{SettlementError, SettlementSink};
use async_trait::async_trait;
use tracing::info;

/// Local development sink which emits each settlement
/// as a structured log event instead of persisting it
pub struct LogSettlementSink;

#[async_trait]
impl SettlementSink for LogSettlementSink {
    async fn write(&self, record: &SettlementRecord) -> Result<(), SettlementError> {
        info!(
            ssp_id = %record.ssp_id,
            dsp_id = %record.dsp_id,
            ssp_bidfloor = %record.publisher_floor,
            dsp_price = %record.clearing_price,
            commission = %record.commission,
            margin = %record.margin(),
            timestamp = %record.timestamp,
            "settlement"
        );

        Ok(())
    }
}
