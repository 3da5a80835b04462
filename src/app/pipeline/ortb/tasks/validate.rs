use crate::app::pipeline::ortb::AuctionContext;
use crate::child_span_info;
use crate::core::ortb::RejectReason;
use crate::core::pipeline::BlockingTask;
use anyhow::Error;
use tracing::debug;

/// Cheap structural checks before any lookup is paid for. A request
/// without impressions is let through, the auction treats it as no fill.
pub struct ValidateRequestTask;

impl BlockingTask<AuctionContext, Error> for ValidateRequestTask {
    fn run(&self, context: &AuctionContext) -> Result<(), Error> {
        let span = child_span_info!(
            "request_validate_task",
            invalid_reason = tracing::field::Empty
        )
        .entered();

        if context.ssp_id.trim().is_empty() {
            span.record("invalid_reason", "missing_ssp_id");
            return Err(context.reject(RejectReason::InvalidRequest, "Missing ssp id"));
        }

        if let Some(floor) = context.req.first_floor() {
            if !floor.is_finite() || floor < 0.0 {
                span.record("invalid_reason", "bad_floor");
                return Err(context.reject(
                    RejectReason::InvalidRequest,
                    format!("Invalid bid floor {floor}"),
                ));
            }
        }

        debug!("Request {} from ssp {} passed validation", context.req.id, context.ssp_id);
        span.record("invalid_reason", "none");

        Ok(())
    }
}
