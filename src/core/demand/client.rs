use crate::core::demand::solicitor::{BidSolicitor, SolicitationError};
use crate::core::models::agreement::AgreementRecord;
use crate::core::ortb::{Bid, BidRequest, BidResponse};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Client, StatusCode, redirect, retry};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace};

/// Network limits applied to every partner callout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandClientConfig {
    /// Upper bound on a single partner round trip
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
}

impl Default for DemandClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(100),
            connect_timeout: Duration::from_millis(50),
        }
    }
}

/// Http client used to solicit bids from demand partners
pub struct DemandClient {
    client: Client,
}

impl DemandClient {
    /// Eagerly builds the underlying pooled client so that
    /// misconfiguration fails at startup, not on first auction
    pub fn new(config: &DemandClientConfig) -> Result<Self, anyhow::Error> {
        let client = reqwest::ClientBuilder::new()
            .user_agent("adx-client")
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .pool_max_idle_per_host(128)
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .tcp_keepalive(Some(Duration::from_secs(20)))
            .tcp_nodelay(true)
            .retry(retry::never())
            .referer(false)
            .redirect(redirect::Policy::none())
            .http2_adaptive_window(true)
            .gzip(true)
            .deflate(true)
            .hickory_dns(true)
            .build()?;

        Ok(DemandClient { client })
    }

    fn map_send_error(partner: &AgreementRecord, e: reqwest::Error) -> SolicitationError {
        if e.is_timeout() {
            return SolicitationError::Timeout;
        }

        SolicitationError::Transport(format!("{}: {}", partner.dsp_id, e))
    }
}

#[async_trait]
impl BidSolicitor for DemandClient {
    /// Posts the bid request as json. Any non 200 status is
    /// returned without reading the body, a 204 is treated as
    /// an explicit no bid.
    async fn solicit(
        &self,
        partner: &AgreementRecord,
        req: &BidRequest,
    ) -> Result<Bid, SolicitationError> {
        let body = serde_json::to_vec(req).map_err(|e| SolicitationError::Encode(e.to_string()))?;

        if tracing::event_enabled!(tracing::Level::TRACE) {
            trace!("{} <- {}", partner.dsp_id, String::from_utf8_lossy(&body));
        }

        let res = self
            .client
            .post(&partner.dsp_url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body)
            .send()
            .await
            .map_err(|e| Self::map_send_error(partner, e))?;

        let status = res.status();

        if status == StatusCode::NO_CONTENT {
            return Err(SolicitationError::NoBid);
        }

        if status != StatusCode::OK {
            debug!("Partner {} returned http {}", partner.dsp_id, status);
            return Err(SolicitationError::Status(status.as_u16()));
        }

        let bytes = res
            .bytes()
            .await
            .map_err(|e| Self::map_send_error(partner, e))?;

        let bid_response: BidResponse = serde_json::from_slice(&bytes)
            .map_err(|e| SolicitationError::Malformed(e.to_string()))?;

        let bid = bid_response
            .first_bid()
            .cloned()
            .ok_or(SolicitationError::NoBid)?;

        if !bid.price.is_finite() {
            return Err(SolicitationError::Malformed(format!(
                "non finite price from {}",
                partner.dsp_id
            )));
        }

        Ok(bid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::agreement::AgreementRecordBuilder;
    use crate::core::ortb::{BidRequestBuilder, ImpBuilder};
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use rust_decimal::Decimal;
    use serde_json::json;

    fn partner(url: String) -> AgreementRecord {
        AgreementRecordBuilder::default()
            .ssp_id("1")
            .dsp_id("dsp-a")
            .commission(Decimal::new(1, 1))
            .dsp_url(url)
            .build()
            .unwrap()
    }

    fn request() -> BidRequest {
        BidRequestBuilder::default()
            .id("req-1")
            .imp(vec![ImpBuilder::default().id("1").bidfloor(11.0).build().unwrap()])
            .build()
            .unwrap()
    }

    fn client() -> DemandClient {
        DemandClient::new(&DemandClientConfig {
            timeout: Duration::from_millis(200),
            connect_timeout: Duration::from_millis(100),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_returns_first_bid_of_first_seat() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/bid")
                    .header("content-type", "application/json")
                    .body_contains("\"bidfloor\":11.0");
                then.status(200).json_body(json!({
                    "id": "req-1",
                    "seatbid": [{"bid": [{"id": "b1", "impid": "1", "price": 12.5}, {"id": "b2", "price": 30.0}]}]
                }));
            })
            .await;

        let bid = client()
            .solicit(&partner(server.url("/bid")), &request())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(bid.id, "b1");
        assert_eq!(bid.price, 12.5);
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/bid");
                then.status(500);
            })
            .await;

        let err = client()
            .solicit(&partner(server.url("/bid")), &request())
            .await
            .unwrap_err();

        assert!(matches!(err, SolicitationError::Status(500)));
    }

    #[tokio::test]
    async fn test_no_content_is_no_bid() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/bid");
                then.status(204);
            })
            .await;

        let err = client()
            .solicit(&partner(server.url("/bid")), &request())
            .await
            .unwrap_err();

        assert!(matches!(err, SolicitationError::NoBid));
    }

    #[tokio::test]
    async fn test_empty_bid_list_is_no_bid() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/bid");
                then.status(200).json_body(json!({"id": "req-1", "seatbid": []}));
            })
            .await;

        let err = client()
            .solicit(&partner(server.url("/bid")), &request())
            .await
            .unwrap_err();

        assert_eq!(err.label(), "no_bid");
    }

    #[tokio::test]
    async fn test_garbage_body_is_malformed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/bid");
                then.status(200).body("<html>oops</html>");
            })
            .await;

        let err = client()
            .solicit(&partner(server.url("/bid")), &request())
            .await
            .unwrap_err();

        assert!(matches!(err, SolicitationError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_slow_partner_times_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/bid");
                then.status(200)
                    .delay(Duration::from_millis(800))
                    .json_body(json!({"id": "req-1", "seatbid": [{"bid": [{"price": 1.0}]}]}));
            })
            .await;

        let err = client()
            .solicit(&partner(server.url("/bid")), &request())
            .await
            .unwrap_err();

        assert!(matches!(err, SolicitationError::Timeout));
    }

    #[tokio::test]
    async fn test_unreachable_partner_is_transport_error() {
        let err = client()
            .solicit(&partner("http://127.0.0.1:9/bid".into()), &request())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SolicitationError::Transport(_) | SolicitationError::Timeout
        ));
    }
}
