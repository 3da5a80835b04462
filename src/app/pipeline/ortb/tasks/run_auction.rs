use crate::app::pipeline::ortb::AuctionContext;
use crate::child_span_info;
use crate::core::auction::AuctionCoordinator;
use crate::core::pipeline::AsyncTask;
use anyhow::{Error, anyhow};
use async_trait::async_trait;
use opentelemetry::metrics::Counter;
use opentelemetry::{KeyValue, global};
use std::sync::LazyLock;
use tracing::{Instrument, Span};

static AUCTIONS_TOTAL: LazyLock<Counter<u64>> = LazyLock::new(|| {
    global::meter("adx")
        .u64_counter("auctions")
        .with_description("Completed auctions by outcome")
        .with_unit("1")
        .build()
});

pub struct AuctionTask {
    coordinator: AuctionCoordinator,
}

impl AuctionTask {
    pub fn new(coordinator: AuctionCoordinator) -> Self {
        Self { coordinator }
    }

    async fn run0(&self, context: &AuctionContext) -> Result<(), Error> {
        let partners = context
            .partners
            .get()
            .ok_or_else(|| anyhow!("Auction started before partner lookup"))?;

        let outcome = self
            .coordinator
            .run(&context.ssp_id, &context.req, partners)
            .await;

        Span::current().record("outcome", outcome.label());
        AUCTIONS_TOTAL.add(1, &[KeyValue::new("outcome", outcome.label())]);

        context
            .outcome
            .set(outcome)
            .map_err(|_| anyhow!("Auction outcome already set on ctx?"))
    }
}

#[async_trait]
impl AsyncTask<AuctionContext, Error> for AuctionTask {
    async fn run(&self, context: &AuctionContext) -> Result<(), Error> {
        let span = child_span_info!("auction_task", outcome = tracing::field::Empty);

        self.run0(context).instrument(span).await
    }
}
