use crate::core::models::agreement::AgreementRecord;
use async_trait::async_trait;

/// The authoritative source of agreements. An empty result
/// is a valid answer, an error means the store could not be read.
#[async_trait]
pub trait AgreementStore: Send + Sync {
    async fn agreements(&self, ssp_id: &str) -> Result<Vec<AgreementRecord>, anyhow::Error>;
}
