use crate::core::models::settlement::SettlementRecord;
use crate::core::settlement::sink::{SettlementError, SettlementSink};
use async_trait::async_trait;
use firestore::FirestoreDb;
use std::sync::Arc;
use tracing::debug;

/// Writes one document per settlement under a fresh id,
/// never updating an existing document
pub struct FirestoreSettlementSink {
    db: Arc<FirestoreDb>,
    collection: String,
}

impl FirestoreSettlementSink {
    pub fn new(db: Arc<FirestoreDb>, collection: impl Into<String>) -> Self {
        Self {
            db,
            collection: collection.into(),
        }
    }
}

#[async_trait]
impl SettlementSink for FirestoreSettlementSink {
    async fn write(&self, record: &SettlementRecord) -> Result<(), SettlementError> {
        let doc_id = uuid::Uuid::new_v4().to_string();

        let _: SettlementRecord = self
            .db
            .fluent()
            .insert()
            .into(self.collection.as_str())
            .document_id(&doc_id)
            .object(record)
            .execute()
            .await
            .map_err(|e| SettlementError::Write(e.to_string()))?;

        debug!("Wrote settlement {} to {}", doc_id, self.collection);

        Ok(())
    }
}
