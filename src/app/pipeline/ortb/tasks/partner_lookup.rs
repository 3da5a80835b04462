use crate::app::pipeline::ortb::AuctionContext;
use crate::child_span_info;
use crate::core::directory::PartnerDirectory;
use crate::core::ortb::RejectReason;
use crate::core::pipeline::AsyncTask;
use anyhow::{Error, anyhow};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{Instrument, Span, debug, error};

/// Resolves the publisher's partners. A directory failure
/// is the only lookup outcome which fails the request.
pub struct PartnerLookupTask {
    directory: Arc<PartnerDirectory>,
}

impl PartnerLookupTask {
    pub fn new(directory: Arc<PartnerDirectory>) -> Self {
        Self { directory }
    }

    async fn run0(&self, context: &AuctionContext) -> Result<(), Error> {
        let partners = match self.directory.lookup(&context.ssp_id).await {
            Ok(partners) => partners,
            Err(e) => {
                error!("Partner lookup failed for ssp {}: {}", context.ssp_id, e);
                return Err(context.reject(RejectReason::DirectoryUnavailable, e.to_string()));
            }
        };

        Span::current().record("partners", partners.len());
        debug!("Found {} partners for ssp {}", partners.len(), context.ssp_id);

        context
            .partners
            .set(partners)
            .map_err(|_| anyhow!("Partners already set on ctx?"))
    }
}

#[async_trait]
impl AsyncTask<AuctionContext, Error> for PartnerLookupTask {
    async fn run(&self, context: &AuctionContext) -> Result<(), Error> {
        let span = child_span_info!(
            "partner_lookup_task",
            ssp_id = %context.ssp_id,
            partners = tracing::field::Empty
        );

        self.run0(context).instrument(span).await
    }
}
