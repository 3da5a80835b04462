use crate::app::context::StartupContext;
use crate::core::observability;
use crate::core::pipeline::BlockingTask;
use anyhow::{Error, anyhow};
use tracing::info;

pub struct ConfigureObservabilityTask;

impl BlockingTask<StartupContext, Error> for ConfigureObservabilityTask {
    fn run(&self, context: &StartupContext) -> Result<(), Error> {
        let config = context
            .config
            .get()
            .ok_or_else(|| anyhow!("Config not loaded before observability initialization"))?;

        // providers are only returned when otel export is configured,
        // local sinks need no shutdown
        if let Some(telemetry) = observability::init(&config.logging)? {
            context
                .observability
                .set(telemetry)
                .map_err(|_| anyhow!("Observability context already initialized"))?;
        }

        info!(
            "Observability configured, level {} sampling {}",
            config.logging.level, config.logging.span_sample_rate
        );

        Ok(())
    }
}
