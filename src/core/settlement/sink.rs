use crate::core::models::settlement::SettlementRecord;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("settlement write failed: {0}")]
    Write(String),
}

/// Append-only destination for settlement records
#[async_trait]
pub trait SettlementSink: Send + Sync {
    async fn write(&self, record: &SettlementRecord) -> Result<(), SettlementError>;
}
