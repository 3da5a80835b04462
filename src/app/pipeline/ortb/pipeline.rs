use crate::app::context::StartupContext;
use crate::app::pipeline::ortb::{AuctionContext, tasks};
use crate::core::auction::AuctionCoordinator;
use crate::core::demand::DemandClient;
use crate::core::directory::PartnerDirectory;
use crate::core::pipeline::{Pipeline, PipelineBuilder};
use anyhow::{Error, anyhow};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::info;

/// Assemble the request pipeline from its parts
///
/// # Behavior
/// * Stages run in order: rate limit (when configured), validation,
///   partner lookup, auction, response
/// * Every rejecting stage attaches a [`ResponseState`] to the context
///   before returning its error, which aborts the remaining stages
/// * A successful run always leaves a response state on the context
///
/// [`ResponseState`]: crate::core::ortb::ResponseState
pub fn assemble_pipeline(
    rate_limit: Option<NonZeroU32>,
    directory: Arc<PartnerDirectory>,
    coordinator: AuctionCoordinator,
) -> Pipeline<AuctionContext, Error> {
    let mut builder = PipelineBuilder::new();

    if let Some(per_second) = rate_limit {
        info!("Inbound rate limit: {} req/s", per_second);
        builder.add_blocking(Box::new(tasks::RateLimitTask::new(per_second)));
    }

    builder
        .with_blocking(Box::new(tasks::ValidateRequestTask))
        .with_async(Box::new(tasks::PartnerLookupTask::new(directory)))
        .with_async(Box::new(tasks::AuctionTask::new(coordinator)))
        .with_blocking(Box::new(tasks::ResponseTask))
        .build()
        .expect("Auction pipeline should have tasks")
}

/// Builds the auction pipeline from the shared parts
/// on the startup context
pub fn build_auction_pipeline(
    context: &StartupContext,
) -> Result<Pipeline<AuctionContext, Error>, Error> {
    let config = context
        .config
        .get()
        .ok_or_else(|| anyhow!("Config not set when building auction pipeline"))?;

    let directory = context
        .directory
        .get()
        .ok_or_else(|| anyhow!("No partner directory?! Cant build auction pipeline"))?;

    let recorder = context
        .settlement
        .get()
        .ok_or_else(|| anyhow!("No settlement recorder?! Cant build auction pipeline"))?;

    let demand_client = DemandClient::new(&config.auction.demand_client())
        .map_err(|e| anyhow!("Auction pipeline client failed: {}", e))?;

    let coordinator = AuctionCoordinator::new(
        Arc::new(demand_client),
        recorder.clone(),
        config.auction.bidding_window,
    );

    let rate_limit = config.server.rate_limit_rps.and_then(NonZeroU32::new);

    Ok(assemble_pipeline(rate_limit, directory.clone(), coordinator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::demand::{BidSolicitor, SolicitationError};
    use crate::core::directory::{AgreementStore, ConfigAgreementStore, LocalAgreementCache};
    use crate::core::models::agreement::{AgreementRecord, AgreementRecordBuilder};
    use crate::core::models::settlement::SettlementRecord;
    use crate::core::ortb::{
        Bid, BidBuilder, BidRequest, BidRequestBuilder, ImpBuilder, RejectReason, ResponseState,
    };
    use crate::core::settlement::{SettlementError, SettlementRecorder, SettlementSink};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use rust_decimal::Decimal;
    use std::time::Duration;

    /// Every partner bids its own floor plus a fixed amount
    struct FloorPlus(f64);

    #[async_trait]
    impl BidSolicitor for FloorPlus {
        async fn solicit(
            &self,
            partner: &AgreementRecord,
            req: &BidRequest,
        ) -> Result<Bid, SolicitationError> {
            Ok(BidBuilder::default()
                .id(partner.dsp_id.clone())
                .impid("1")
                .price(req.imp[0].bidfloor + self.0)
                .build()
                .unwrap())
        }
    }

    #[derive(Default)]
    struct MemorySink(Mutex<Vec<SettlementRecord>>);

    #[async_trait]
    impl SettlementSink for MemorySink {
        async fn write(&self, record: &SettlementRecord) -> Result<(), SettlementError> {
            self.0.lock().push(record.clone());
            Ok(())
        }
    }

    struct DownStore;

    #[async_trait]
    impl AgreementStore for DownStore {
        async fn agreements(&self, _ssp_id: &str) -> Result<Vec<AgreementRecord>, Error> {
            anyhow::bail!("deadline exceeded")
        }
    }

    fn agreement(dsp_id: &str, commission: Decimal) -> AgreementRecord {
        AgreementRecordBuilder::default()
            .ssp_id("ssp-1")
            .dsp_id(dsp_id)
            .commission(commission)
            .dsp_url(format!("http://{dsp_id}.local"))
            .build()
            .unwrap()
    }

    fn pipeline(
        store: Arc<dyn AgreementStore>,
        rate_limit: Option<NonZeroU32>,
        sink: Arc<MemorySink>,
    ) -> Pipeline<AuctionContext, Error> {
        let directory = Arc::new(PartnerDirectory::new(
            store,
            Arc::new(LocalAgreementCache::new(16)),
            Duration::from_secs(60),
        ));
        let coordinator = AuctionCoordinator::new(
            Arc::new(FloorPlus(0.5)),
            Arc::new(SettlementRecorder::new(sink)),
            Duration::from_millis(120),
        );

        assemble_pipeline(rate_limit, directory, coordinator)
    }

    fn request(floor: f64) -> BidRequest {
        BidRequestBuilder::default()
            .id("req-1")
            .imp(vec![ImpBuilder::default().id("1").bidfloor(floor).build().unwrap()])
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_win_flows_to_bid_response_at_floor() {
        let store = Arc::new(ConfigAgreementStore::new(vec![
            agreement("a", Decimal::new(1, 1)),
            agreement("b", Decimal::new(3, 1)),
        ]));
        let sink = Arc::new(MemorySink::default());
        let pipeline = pipeline(store, None, sink.clone());

        let ctx = AuctionContext::new("ssp-1".into(), request(10.0));
        pipeline.run(&ctx).await.unwrap();

        let res = match ctx.res.get() {
            Some(ResponseState::Bid(res)) => res,
            other => panic!("expected a bid, got {other:?}"),
        };
        assert_eq!(res.id, "req-1");
        // b has the higher floor so bids 13.5, the publisher still sees 10
        assert_eq!(res.first_bid().unwrap().id, "b");
        assert_eq!(res.first_bid().unwrap().price, 10.0);

        tokio::time::sleep(Duration::from_millis(20)).await;
        let settled = sink.0.lock();
        assert_eq!(settled.len(), 1);
        assert_eq!(settled[0].clearing_price, Decimal::new(135, 1));
    }

    #[tokio::test]
    async fn test_unknown_ssp_is_no_fill() {
        let pipeline = pipeline(
            Arc::new(ConfigAgreementStore::new(vec![])),
            None,
            Arc::new(MemorySink::default()),
        );

        let ctx = AuctionContext::new("nobody".into(), request(1.0));
        pipeline.run(&ctx).await.unwrap();

        assert!(matches!(ctx.res.get(), Some(ResponseState::NoFill { .. })));
    }

    #[tokio::test]
    async fn test_directory_outage_rejects_request() {
        let pipeline = pipeline(Arc::new(DownStore), None, Arc::new(MemorySink::default()));

        let ctx = AuctionContext::new("ssp-1".into(), request(1.0));
        assert!(pipeline.run(&ctx).await.is_err());

        match ctx.res.get() {
            Some(ResponseState::Rejected { reason, desc }) => {
                assert_eq!(*reason, RejectReason::DirectoryUnavailable);
                assert!(desc.contains("deadline exceeded"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert!(ctx.outcome.get().is_none());
    }

    #[tokio::test]
    async fn test_rate_limit_runs_first() {
        let pipeline = pipeline(
            Arc::new(DownStore),
            NonZeroU32::new(1),
            Arc::new(MemorySink::default()),
        );

        let first = AuctionContext::new("ssp-1".into(), request(1.0));
        let _ = pipeline.run(&first).await;
        let second = AuctionContext::new("ssp-1".into(), request(1.0));
        let _ = pipeline.run(&second).await;

        assert!(matches!(
            second.res.get(),
            Some(ResponseState::Rejected {
                reason: RejectReason::RateLimited,
                ..
            })
        ));
    }
}
