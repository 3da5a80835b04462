use crate::app::lifecycle::context::StartupContext;
use crate::app::shutdown::tasks::observability::ObservabilityShutdownTask;
use crate::app::shutdown::tasks::stop_server::StopServerTask;
use crate::app::span::WrappedPipelineTask;
use crate::core::pipeline::{Pipeline, PipelineBuilder};
use tracing::info_span;

/// Builds the shutdown pipeline over the `StartupContext` produced
/// at startup. Draining the listener comes first so in flight
/// auctions still log and export.
pub fn build_shutdown_pipeline() -> Pipeline<StartupContext, anyhow::Error> {
    let shutdown_pipeline = PipelineBuilder::new()
        .with_async(Box::new(StopServerTask))
        .with_blocking(Box::new(ObservabilityShutdownTask))
        .build()
        .expect("Shutdown pipeline should have tasks!");

    let observed_pipeline =
        WrappedPipelineTask::new(shutdown_pipeline, || info_span!("shutdown_pipeline"));

    PipelineBuilder::new()
        .with_async(Box::new(observed_pipeline))
        .build()
        .expect("Shutdown pipeline should have tasks!")
}
