use crate::core::directory::store::AgreementStore;
use crate::core::models::agreement::AgreementRecord;
use anyhow::Error;
use async_trait::async_trait;
use firestore::FirestoreDb;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Agreements held in a Firestore collection, one document
/// per ssp and dsp pair
pub struct FirestoreAgreementStore {
    db: Arc<FirestoreDb>,
    collection: String,
}

impl FirestoreAgreementStore {
    pub fn new(db: Arc<FirestoreDb>, collection: impl Into<String>) -> Self {
        Self {
            db,
            collection: collection.into(),
        }
    }
}

#[async_trait]
impl AgreementStore for FirestoreAgreementStore {
    async fn agreements(&self, ssp_id: &str) -> Result<Vec<AgreementRecord>, Error> {
        let docs = self
            .db
            .fluent()
            .select()
            .from(self.collection.as_str())
            .filter(|q| q.for_all([q.field("ssp_id").eq(ssp_id)]))
            .query()
            .await
            .map_err(|e| {
                error!(
                    "Firestore agreement query failed for ssp {} in {}: {}",
                    ssp_id, self.collection, e
                );
                e
            })?;

        let mut records = Vec::with_capacity(docs.len());

        for doc in docs {
            match FirestoreDb::deserialize_doc_to::<AgreementRecord>(&doc) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping unreadable agreement {}: {}", doc.name, e),
            }
        }

        debug!(
            "Loaded {} agreements for ssp {} from {}",
            records.len(),
            ssp_id,
            self.collection
        );

        Ok(records)
    }
}
