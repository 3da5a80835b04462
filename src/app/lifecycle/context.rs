use crate::app::config::AdxConfig;
use crate::app::pipeline::ortb::AuctionContext;
use crate::core::directory::PartnerDirectory;
use crate::core::observability::Telemetry;
use crate::core::pipeline::Pipeline;
use crate::core::settlement::SettlementRecorder;
use actix_web::dev::ServerHandle;
use anyhow::Error;
use firestore::FirestoreDb;
use std::sync::{Arc, OnceLock};

/// Shared state assembled by the startup pipeline and
/// consumed again by the shutdown pipeline
#[derive(Default)]
pub struct StartupContext {
    pub config: OnceLock<AdxConfig>,
    /// Only set when an otel sink is configured
    pub observability: OnceLock<Telemetry>,
    /// `None` when running from local config
    pub firestore: OnceLock<Option<Arc<FirestoreDb>>>,

    pub directory: OnceLock<Arc<PartnerDirectory>>,
    pub settlement: OnceLock<Arc<SettlementRecorder>>,

    /// Full handling of an inbound openrtb request
    pub auction_pipeline: OnceLock<Arc<Pipeline<AuctionContext, Error>>>,

    pub server: OnceLock<ServerHandle>,
}
