use crate::core::auction::outcome::Win;
use crate::core::models::agreement::AgreementRecord;
use crate::core::ortb::Bid;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::trace;

/// A completed solicitation, before qualification
#[derive(Debug, Clone)]
pub struct Candidate {
    pub partner: Arc<AgreementRecord>,
    /// The floor this partner was asked to beat
    pub floor: Decimal,
    pub price: Decimal,
    pub bid: Bid,
}

impl Candidate {
    pub fn into_win(self, publisher_floor: Decimal) -> Win {
        Win {
            partner: self.partner,
            clearing_price: self.price,
            publisher_floor,
            bid: self.bid,
        }
    }
}

/// Reduce completed solicitations, in partner order, to at most one
/// winner. A candidate qualifies only when its price is strictly above
/// its own floor and strictly above the best price seen so far, so the
/// earlier of two equal prices keeps the win.
pub fn select_winner<I>(candidates: I) -> Option<Candidate>
where
    I: IntoIterator<Item = Candidate>,
{
    let mut best: Option<Candidate> = None;

    for candidate in candidates {
        if candidate.price <= candidate.floor {
            trace!(
                "{} bid {} does not clear floor {}",
                candidate.partner.dsp_id, candidate.price, candidate.floor
            );
            continue;
        }

        if let Some(incumbent) = &best {
            if candidate.price <= incumbent.price {
                trace!(
                    "{} bid {} does not beat {} at {}",
                    candidate.partner.dsp_id,
                    candidate.price,
                    incumbent.partner.dsp_id,
                    incumbent.price
                );
                continue;
            }
        }

        best = Some(candidate);
    }

    best
}
