use crate::core::pipeline::{AsyncTask, Pipeline};
use anyhow::Error;
use async_trait::async_trait;
use tracing::{Instrument, Span};

/// Runs a whole pipeline as one task under a span created fresh for
/// every run, so a root span can be sampled per request with
/// [`sample_or_attach_root_span!`](crate::sample_or_attach_root_span)
pub struct WrappedPipelineTask<T: Send + Sync> {
    pipeline: Pipeline<T, Error>,
    span_provider: Box<dyn Fn() -> Span + Send + Sync>,
}

impl<T: Send + Sync> WrappedPipelineTask<T> {
    pub fn new<F>(pipeline: Pipeline<T, Error>, span_provider: F) -> Self
    where
        F: Fn() -> Span + Send + Sync + 'static,
    {
        WrappedPipelineTask {
            pipeline,
            span_provider: Box::new(span_provider),
        }
    }
}

#[async_trait]
impl<T: Send + Sync> AsyncTask<T, Error> for WrappedPipelineTask<T> {
    async fn run(&self, context: &T) -> Result<(), Error> {
        let span = (self.span_provider)();

        self.pipeline.run(context).instrument(span).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::{BlockingTask, PipelineBuilder};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Count;

    impl BlockingTask<AtomicUsize, Error> for Count {
        fn run(&self, context: &AtomicUsize) -> Result<(), Error> {
            context.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_wrapped_pipeline_runs_inner_tasks_per_call() {
        let inner = PipelineBuilder::new()
            .with_blocking(Box::new(Count))
            .with_blocking(Box::new(Count))
            .build()
            .unwrap();

        let spans = std::sync::Arc::new(AtomicUsize::new(0));
        let spans_seen = spans.clone();

        let wrapped = WrappedPipelineTask::new(inner, move || {
            spans_seen.fetch_add(1, Ordering::SeqCst);
            Span::none()
        });

        let counter = AtomicUsize::new(0);
        wrapped.run(&counter).await.unwrap();
        wrapped.run(&counter).await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 4);
        assert_eq!(spans.load(Ordering::SeqCst), 2);
    }
}
