use crate::app::pipeline::ortb::AuctionContext;
use crate::child_span_info;
use crate::core::ortb::RejectReason;
use crate::core::pipeline::BlockingTask;
use anyhow::Error;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use tracing::debug;

/// Global inbound quota shared by every publisher
pub struct RateLimitTask {
    limiter: DefaultDirectRateLimiter,
}

impl RateLimitTask {
    pub fn new(per_second: NonZeroU32) -> Self {
        Self {
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
        }
    }
}

impl BlockingTask<AuctionContext, Error> for RateLimitTask {
    fn run(&self, context: &AuctionContext) -> Result<(), Error> {
        let span = child_span_info!("rate_limit_task", passed = tracing::field::Empty).entered();

        if self.limiter.check().is_err() {
            span.record("passed", false);
            debug!("Rate limited request from ssp {}", context.ssp_id);

            return Err(context.reject(RejectReason::RateLimited, "Too many requests"));
        }

        span.record("passed", true);

        Ok(())
    }
}
