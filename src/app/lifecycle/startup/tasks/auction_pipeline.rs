use crate::app::context::StartupContext;
use crate::app::pipeline::ortb::build_auction_pipeline;
use crate::app::span::WrappedPipelineTask;
use crate::core::pipeline::{BlockingTask, PipelineBuilder};
use crate::sample_or_attach_root_span;
use anyhow::{Error, anyhow};
use std::sync::Arc;
use tracing::{info, instrument};

pub struct BuildAuctionPipelineTask;

impl BlockingTask<StartupContext, Error> for BuildAuctionPipelineTask {
    #[instrument(skip_all, name = "build_auction_pipeline_task")]
    fn run(&self, context: &StartupContext) -> Result<(), Error> {
        let sample_percent = context
            .config
            .get()
            .ok_or_else(|| anyhow!("Config not set before auction pipeline"))?
            .logging
            .span_sample_rate;

        let auction_pipeline = build_auction_pipeline(context)?;

        info!("Auction pipeline built with {} tasks", auction_pipeline.len());

        let observed = WrappedPipelineTask::new(auction_pipeline, move || {
            sample_or_attach_root_span!(sample_percent, "auction_pipeline")
        });

        let observed_pipeline = PipelineBuilder::new()
            .with_async(Box::new(observed))
            .build()
            .ok_or_else(|| anyhow!("Failed to build observed auction pipeline"))?;

        context
            .auction_pipeline
            .set(Arc::new(observed_pipeline))
            .map_err(|_| anyhow!("auction_pipeline already assigned!"))
    }
}
