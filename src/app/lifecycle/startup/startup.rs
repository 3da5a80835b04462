use crate::app::lifecycle::context::StartupContext;
use crate::app::startup::tasks::auction_pipeline::BuildAuctionPipelineTask;
use crate::app::startup::tasks::config_load::ConfigLoadTask;
use crate::app::startup::tasks::firestore::FirestoreTask;
use crate::app::startup::tasks::observability::ConfigureObservabilityTask;
use crate::app::startup::tasks::partner_directory::PartnerDirectoryTask;
use crate::app::startup::tasks::settlement::SettlementRecorderTask;
use crate::app::startup::tasks::start_server::StartServerTask;
use crate::core::config_manager::ConfigManager;
use crate::core::pipeline::{Pipeline, PipelineBuilder};
use std::path::PathBuf;

/// Tasks which bring the exchange up, in dependency order.
/// Ends with the http listener accepting requests.
pub fn build_start_pipeline(cfg_path: PathBuf) -> Pipeline<StartupContext, anyhow::Error> {
    let cfg_manager = ConfigManager::new(cfg_path);

    PipelineBuilder::new()
        .with_blocking(Box::new(ConfigLoadTask::new(cfg_manager)))
        .with_blocking(Box::new(ConfigureObservabilityTask))
        .with_async(Box::new(FirestoreTask))
        .with_blocking(Box::new(PartnerDirectoryTask))
        .with_blocking(Box::new(SettlementRecorderTask))
        .with_blocking(Box::new(BuildAuctionPipelineTask))
        .with_async(Box::new(StartServerTask))
        .build()
        .expect("Startup pipeline should have tasks!")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ortb::{BidRequestBuilder, ImpBuilder};
    use crate::app::pipeline::ortb::AuctionContext;
    use crate::core::ortb::ResponseState;

    /// Everything short of logging and the listener, both of
    /// which install process wide state
    fn build_core_pipeline(cfg_path: PathBuf) -> Pipeline<StartupContext, anyhow::Error> {
        PipelineBuilder::new()
            .with_blocking(Box::new(ConfigLoadTask::new(ConfigManager::new(cfg_path))))
            .with_async(Box::new(FirestoreTask))
            .with_blocking(Box::new(PartnerDirectoryTask))
            .with_blocking(Box::new(SettlementRecorderTask))
            .with_blocking(Box::new(BuildAuctionPipelineTask))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_local_startup_builds_working_pipeline() {
        let path = std::env::temp_dir().join(format!("adx-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"
agreements:
  - ssp_id: ssp-1
    dsp_id: unreachable
    commission: 0.1
    dsp_url: http://127.0.0.1:9/bid
"#,
        )
        .unwrap();

        let ctx = StartupContext::default();
        build_core_pipeline(path.clone()).run(&ctx).await.unwrap();
        let _ = std::fs::remove_file(path);

        assert!(ctx.firestore.get().unwrap().is_none());
        assert!(ctx.directory.get().is_some());

        let auction = AuctionContext::new(
            "ssp-1".into(),
            BidRequestBuilder::default()
                .id("r")
                .imp(vec![ImpBuilder::default().bidfloor(1.0).build().unwrap()])
                .build()
                .unwrap(),
        );
        ctx.auction_pipeline.get().unwrap().run(&auction).await.unwrap();

        // the only partner refuses connections
        assert!(matches!(auction.res.get(), Some(ResponseState::NoFill { .. })));
    }

    #[tokio::test]
    async fn test_missing_config_aborts_startup() {
        let ctx = StartupContext::default();

        let result = build_core_pipeline(PathBuf::from("/nonexistent/adx.yaml"))
            .run(&ctx)
            .await;

        assert!(result.is_err());
        assert!(ctx.directory.get().is_none());
    }
}
