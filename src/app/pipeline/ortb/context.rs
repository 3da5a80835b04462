use crate::core::auction::AuctionOutcome;
use crate::core::models::agreement::AgreementRecord;
use crate::core::ortb::{BidRequest, RejectReason, ResponseState};
use anyhow::{Error, anyhow};
use std::sync::{Arc, OnceLock};

/// Per request state threaded through the auction pipeline.
/// Each stage fills in its slot exactly once.
pub struct AuctionContext {
    pub ssp_id: String,
    pub req: BidRequest,
    /// Agreements resolved for `ssp_id`, in auction order
    pub partners: OnceLock<Vec<Arc<AgreementRecord>>>,
    pub outcome: OnceLock<AuctionOutcome>,
    /// What the publisher receives, set by the last task
    /// to run, whether it completed or rejected the request
    pub res: OnceLock<ResponseState>,
}

impl AuctionContext {
    pub fn new(ssp_id: String, req: BidRequest) -> AuctionContext {
        AuctionContext {
            ssp_id,
            req,
            partners: OnceLock::new(),
            outcome: OnceLock::new(),
            res: OnceLock::new(),
        }
    }

    /// Attach a rejection and return the error
    /// which aborts the rest of the pipeline
    pub fn reject(&self, reason: RejectReason, desc: impl Into<String>) -> Error {
        let desc = desc.into();
        let err = anyhow!("{}: {}", reason, desc);

        if self
            .res
            .set(ResponseState::Rejected { reason, desc })
            .is_err()
        {
            return anyhow!("response state already assigned, {}", err);
        }

        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_sets_state_once() {
        let ctx = AuctionContext::new("ssp".into(), BidRequest::default());

        let err = ctx.reject(RejectReason::RateLimited, "slow down");
        assert!(err.to_string().contains("rate_limited"));
        assert_eq!(
            ctx.res.get(),
            Some(&ResponseState::Rejected {
                reason: RejectReason::RateLimited,
                desc: "slow down".into()
            })
        );

        let err = ctx.reject(RejectReason::InvalidRequest, "again");
        assert!(err.to_string().contains("already assigned"));
    }
}
