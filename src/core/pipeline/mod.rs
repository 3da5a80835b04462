use async_trait::async_trait;

/// A synchronous unit of work executed against a shared context
pub trait BlockingTask<C, E>: Send + Sync {
    fn run(&self, context: &C) -> Result<(), E>;
}

/// An async unit of work executed against a shared context
#[async_trait]
pub trait AsyncTask<C: Sync, E>: Send + Sync {
    async fn run(&self, context: &C) -> Result<(), E>;
}

enum Stage<C, E> {
    Blocking(Box<dyn BlockingTask<C, E>>),
    Async(Box<dyn AsyncTask<C, E>>),
}

/// An ordered list of tasks run one after another over the same
/// context. The first task to return an error aborts the remainder
/// of the pipeline and its error is returned to the caller.
pub struct Pipeline<C, E> {
    stages: Vec<Stage<C, E>>,
}

impl<C: Send + Sync, E> Pipeline<C, E> {
    pub async fn run(&self, context: &C) -> Result<(), E> {
        for stage in &self.stages {
            match stage {
                Stage::Blocking(task) => task.run(context)?,
                Stage::Async(task) => task.run(context).await?,
            }
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

pub struct PipelineBuilder<C, E> {
    stages: Vec<Stage<C, E>>,
}

impl<C: Send + Sync, E> PipelineBuilder<C, E> {
    pub fn new() -> Self {
        PipelineBuilder { stages: Vec::new() }
    }

    pub fn with_blocking(mut self, task: Box<dyn BlockingTask<C, E>>) -> Self {
        self.add_blocking(task);
        self
    }

    pub fn with_async(mut self, task: Box<dyn AsyncTask<C, E>>) -> Self {
        self.add_async(task);
        self
    }

    pub fn add_blocking(&mut self, task: Box<dyn BlockingTask<C, E>>) {
        self.stages.push(Stage::Blocking(task));
    }

    pub fn add_async(&mut self, task: Box<dyn AsyncTask<C, E>>) {
        self.stages.push(Stage::Async(task));
    }

    /// Returns `None` when no tasks were registered
    pub fn build(self) -> Option<Pipeline<C, E>> {
        if self.stages.is_empty() {
            return None;
        }

        Some(Pipeline {
            stages: self.stages,
        })
    }
}

impl<C: Send + Sync, E> Default for PipelineBuilder<C, E> {
    fn default() -> Self {
        Self::new()
    }
}
