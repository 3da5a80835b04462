use crate::app::context::StartupContext;
use crate::core::pipeline::BlockingTask;
use crate::core::settlement::{
    FirestoreSettlementSink, LogSettlementSink, SettlementRecorder, SettlementSink,
};
use anyhow::{Error, anyhow};
use std::sync::Arc;
use tracing::{info, instrument};

pub struct SettlementRecorderTask;

impl BlockingTask<StartupContext, Error> for SettlementRecorderTask {
    #[instrument(skip_all, name = "settlement_recorder_task")]
    fn run(&self, context: &StartupContext) -> Result<(), Error> {
        let config = context
            .config
            .get()
            .ok_or_else(|| anyhow!("Config not set before settlement recorder"))?;

        let firestore = context
            .firestore
            .get()
            .ok_or_else(|| anyhow!("Firestore task must run before settlement recorder"))?;

        let sink: Arc<dyn SettlementSink> = match firestore {
            Some(db) => {
                info!("Settlements to firestore collection {}", config.settlement.collection);
                Arc::new(FirestoreSettlementSink::new(
                    db.clone(),
                    config.settlement.collection.clone(),
                ))
            }
            None => {
                info!("Settlements to log");
                Arc::new(LogSettlementSink)
            }
        };

        context
            .settlement
            .set(Arc::new(SettlementRecorder::new(sink)))
            .map_err(|_| anyhow!("Settlement recorder already set on startup context"))
    }
}
