use crate::app::context::StartupContext;
use crate::core::firestore::create_client;
use crate::core::pipeline::AsyncTask;
use anyhow::{Error, anyhow};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

pub struct FirestoreTask;

#[async_trait]
impl AsyncTask<StartupContext, Error> for FirestoreTask {
    #[instrument(skip_all, name = "firestore_task")]
    async fn run(&self, context: &StartupContext) -> Result<(), Error> {
        let config = context
            .config
            .get()
            .ok_or(anyhow!("Config not set on startup context"))?;

        let firestore = match &config.firestore {
            Some(fs_config) => {
                let client = create_client(fs_config)
                    .await
                    .map_err(|e| anyhow!("Failed to connect to Firestore: {:#}", e))?;

                Some(Arc::new(client))
            }
            None => {
                info!("Firestore not configured, using config agreements and log settlements");
                None
            }
        };

        context
            .firestore
            .set(firestore)
            .map_err(|_| anyhow!("Failed to set firestore on startup context"))
    }
}
