use crate::core::ortb::BidResponse;
use strum::{Display, IntoStaticStr};

/// Why an inbound request was turned away before an auction could run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum RejectReason {
    /// Inbound quota exceeded
    RateLimited,
    /// Request failed validation, e.g. missing ssp id
    InvalidRequest,
    /// Agreement records could not be resolved from the persistent store
    DirectoryUnavailable,
}

impl RejectReason {
    pub fn status_code(&self) -> u16 {
        match self {
            RejectReason::RateLimited => 429,
            RejectReason::InvalidRequest => 400,
            RejectReason::DirectoryUnavailable => 500,
        }
    }
}

/// The final state of an inbound request which the
/// http layer translates into a publisher response
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseState {
    /// A winning bid, priced at the publisher floor
    Bid(BidResponse),
    /// Successful auction without a qualifying bid
    NoFill { desc: &'static str },
    /// The request was refused, see [`RejectReason`]
    Rejected { reason: RejectReason, desc: String },
}

impl ResponseState {
    /// Short label used for metrics and span fields
    pub fn outcome(&self) -> &'static str {
        match self {
            ResponseState::Bid(_) => "bid",
            ResponseState::NoFill { .. } => "no_fill",
            ResponseState::Rejected { reason, .. } => reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_status_codes() {
        assert_eq!(RejectReason::RateLimited.status_code(), 429);
        assert_eq!(RejectReason::InvalidRequest.status_code(), 400);
        assert_eq!(RejectReason::DirectoryUnavailable.status_code(), 500);
    }

    #[test]
    fn test_outcome_labels() {
        let rejected = ResponseState::Rejected {
            reason: RejectReason::DirectoryUnavailable,
            desc: "down".into(),
        };

        assert_eq!(rejected.outcome(), "directory_unavailable");
        assert_eq!(ResponseState::NoFill { desc: "x" }.outcome(), "no_fill");
        assert_eq!(ResponseState::Bid(BidResponse::default()).outcome(), "bid");
    }
}
