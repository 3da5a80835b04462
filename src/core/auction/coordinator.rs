use crate::child_span_info;
use crate::core::auction::money::{from_wire, partner_floor, to_wire};
use crate::core::auction::outcome::AuctionOutcome;
use crate::core::auction::selection::{Candidate, select_winner};
use crate::core::demand::{BidSolicitor, SolicitationError};
use crate::core::models::agreement::AgreementRecord;
use crate::core::ortb::BidRequest;
use crate::core::settlement::SettlementRecorder;
use futures_util::future::join_all;
use opentelemetry::metrics::Counter;
use opentelemetry::{KeyValue, global};
use rust_decimal::Decimal;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::{Instrument, Span, debug, warn};

static SOLICITATIONS_TOTAL: LazyLock<Counter<u64>> = LazyLock::new(|| {
    global::meter("adx")
        .u64_counter("partner_solicitations")
        .with_description("Partner bid solicitations by result")
        .with_unit("1")
        .build()
});

/// Runs a single impression auction across a publisher's partners.
///
/// # Behavior
/// * Every partner is solicited concurrently with its own floor, the
///   publisher floor marked up by that partner's commission
/// * The bidding window is the hard cutoff: a partner which has not
///   answered by then is dropped exactly like a failed solicitation,
///   and its in-flight call is cancelled
/// * Selection runs over the completed responses in partner order,
///   see [`select_winner`]
/// * A win is handed to the [`SettlementRecorder`] without waiting
///   on the write
pub struct AuctionCoordinator {
    solicitor: Arc<dyn BidSolicitor>,
    recorder: Arc<SettlementRecorder>,
    bidding_window: Duration,
}

impl AuctionCoordinator {
    pub fn new(
        solicitor: Arc<dyn BidSolicitor>,
        recorder: Arc<SettlementRecorder>,
        bidding_window: Duration,
    ) -> Self {
        Self {
            solicitor,
            recorder,
            bidding_window,
        }
    }

    pub async fn run(
        &self,
        ssp_id: &str,
        req: &BidRequest,
        partners: &[Arc<AgreementRecord>],
    ) -> AuctionOutcome {
        let wire_floor = match req.first_floor() {
            Some(floor) => floor,
            None => {
                debug!("Request {} has no impressions, skipping auction", req.id);
                return AuctionOutcome::NoFill;
            }
        };

        let publisher_floor = match from_wire(wire_floor) {
            Some(floor) if floor >= Decimal::ZERO => floor,
            _ => {
                warn!("Request {} carries unusable floor {}", req.id, wire_floor);
                return AuctionOutcome::NoFill;
            }
        };

        if partners.is_empty() {
            debug!("No partners for ssp {}", ssp_id);
            return AuctionOutcome::NoFill;
        }

        let deadline = Instant::now() + self.bidding_window;

        let callouts = partners
            .iter()
            .map(|partner| self.solicit(partner.clone(), publisher_floor, req, deadline));

        // join_all preserves partner order, which selection relies on for tie breaks
        let candidates = join_all(callouts).await.into_iter().flatten();

        let outcome = match select_winner(candidates) {
            Some(winner) => AuctionOutcome::Win(winner.into_win(publisher_floor)),
            None => AuctionOutcome::NoFill,
        };

        if let AuctionOutcome::Win(win) = &outcome {
            debug!(
                "Partner {} wins at {} over floor {}",
                win.partner.dsp_id, win.clearing_price, publisher_floor
            );

            self.recorder.submit(
                ssp_id,
                &win.partner.dsp_id,
                publisher_floor,
                win.clearing_price,
                win.partner.commission,
            );
        }

        outcome
    }

    async fn solicit(
        &self,
        partner: Arc<AgreementRecord>,
        publisher_floor: Decimal,
        req: &BidRequest,
        deadline: Instant,
    ) -> Option<Candidate> {
        let Some(floor) = partner_floor(publisher_floor, partner.commission) else {
            let e = SolicitationError::Malformed(format!(
                "floor {} with commission {} is out of range",
                publisher_floor, partner.commission
            ));
            debug!("Partner {} excluded: {}", partner.dsp_id, e);
            record_solicitation(&Span::none(), e.label());
            return None;
        };
        let partner_req = req.with_first_floor(to_wire(floor));

        let span = child_span_info!(
            "partner_solicitation",
            dsp_id = %partner.dsp_id,
            floor = %floor,
            result = tracing::field::Empty
        );

        let result = async {
            match timeout_at(deadline, self.solicitor.solicit(&partner, &partner_req)).await {
                Ok(result) => result,
                Err(_) => Err(SolicitationError::Timeout),
            }
        }
        .instrument(span.clone())
        .await;

        let candidate = result.and_then(|bid| match from_wire(bid.price) {
            Some(price) => Ok(Candidate {
                partner: partner.clone(),
                floor,
                price,
                bid,
            }),
            None => Err(SolicitationError::Malformed(format!(
                "unusable price {}",
                bid.price
            ))),
        });

        let label = match &candidate {
            Ok(_) => "bid",
            Err(e) => {
                debug!("Partner {} excluded: {}", partner.dsp_id, e);
                e.label()
            }
        };

        record_solicitation(&span, label);

        candidate.ok()
    }
}

fn record_solicitation(span: &Span, label: &'static str) {
    if !span.is_disabled() {
        span.record("result", label);
    }

    SOLICITATIONS_TOTAL.add(1, &[KeyValue::new("result", label)]);
}
