use crate::app::context::StartupContext;
use crate::core::directory::{
    AgreementStore, ConfigAgreementStore, FirestoreAgreementStore, LocalAgreementCache,
    PartnerDirectory,
};
use crate::core::pipeline::BlockingTask;
use anyhow::{Error, anyhow};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Builds the partner directory over firestore when connected,
/// otherwise over the agreements listed in config
pub struct PartnerDirectoryTask;

impl BlockingTask<StartupContext, Error> for PartnerDirectoryTask {
    #[instrument(skip_all, name = "partner_directory_task")]
    fn run(&self, context: &StartupContext) -> Result<(), Error> {
        let config = context
            .config
            .get()
            .ok_or_else(|| anyhow!("Config not set before partner directory"))?;

        let firestore = context
            .firestore
            .get()
            .ok_or_else(|| anyhow!("Firestore task must run before partner directory"))?;

        let store: Arc<dyn AgreementStore> = match firestore {
            Some(db) => {
                if !config.agreements.is_empty() {
                    warn!(
                        "Ignoring {} config agreements, firestore is configured",
                        config.agreements.len()
                    );
                }

                info!("Agreements from firestore collection {}", config.directory.collection);
                Arc::new(FirestoreAgreementStore::new(
                    db.clone(),
                    config.directory.collection.clone(),
                ))
            }
            None => {
                info!("Agreements from config, {} records", config.agreements.len());
                Arc::new(ConfigAgreementStore::new(config.agreements.clone()))
            }
        };

        let cache = Arc::new(LocalAgreementCache::new(config.directory.cache_capacity));
        let directory = PartnerDirectory::new(store, cache, config.directory.cache_ttl);

        context
            .directory
            .set(Arc::new(directory))
            .map_err(|_| anyhow!("Partner directory already set on startup context"))
    }
}
