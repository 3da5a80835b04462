use crate::app::context::StartupContext;
use crate::core::config_manager::ConfigManager;
use crate::core::pipeline::BlockingTask;
use anyhow::{Error, anyhow};

pub(crate) struct ConfigLoadTask {
    manager: ConfigManager,
}

impl ConfigLoadTask {
    pub fn new(manager: ConfigManager) -> Self {
        Self { manager }
    }
}

impl BlockingTask<StartupContext, Error> for ConfigLoadTask {
    fn run(&self, context: &StartupContext) -> Result<(), Error> {
        // runs before observability, errors surface through the pipeline result
        self.manager.start()?;

        context
            .config
            .set(self.manager.get().clone())
            .map_err(|_| anyhow!("Config already loaded on startup context"))
    }
}
