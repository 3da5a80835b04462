mod rate_limit;
pub use rate_limit::RateLimitTask;

mod validate;
pub use validate::ValidateRequestTask;

mod partner_lookup;
pub use partner_lookup::PartnerLookupTask;

mod run_auction;
pub use run_auction::AuctionTask;

mod response;
pub use response::ResponseTask;
