use crate::app::pipeline::ortb::AuctionContext;
use crate::core::auction::{AuctionOutcome, build_bid_response};
use crate::core::ortb::ResponseState;
use crate::core::pipeline::BlockingTask;
use anyhow::{Error, anyhow};

/// Turns the auction outcome into the publisher response
pub struct ResponseTask;

impl BlockingTask<AuctionContext, Error> for ResponseTask {
    fn run(&self, context: &AuctionContext) -> Result<(), Error> {
        let outcome = context
            .outcome
            .get()
            .ok_or_else(|| anyhow!("No auction outcome to respond with"))?;

        let state = match outcome {
            AuctionOutcome::Win(win) => ResponseState::Bid(build_bid_response(&context.req, win)?),
            AuctionOutcome::NoFill => ResponseState::NoFill {
                desc: "No qualifying bid",
            },
        };

        context
            .res
            .set(state)
            .map_err(|_| anyhow!("Response state already set on ctx?"))
    }
}
