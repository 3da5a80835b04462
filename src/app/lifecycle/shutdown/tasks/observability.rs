use crate::app::context::StartupContext;
use crate::core::observability;
use crate::core::pipeline::BlockingTask;
use anyhow::Error;
use tracing::{info, instrument};

pub struct ObservabilityShutdownTask;

impl BlockingTask<StartupContext, Error> for ObservabilityShutdownTask {
    #[instrument(skip_all, name = "observability_shutdown_task")]
    fn run(&self, context: &StartupContext) -> Result<(), Error> {
        if let Some(telemetry) = context.observability.get() {
            // last log line which still reaches the exporter
            info!("Shutting down observability");
            observability::shutdown(telemetry)?;
        }

        Ok(())
    }
}
