//! HTTP market-status feed.
//!
//! Polls the fantasy platform's public status endpoint and maps its numeric
//! wire codes onto [`MarketStatus`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::domain::market::{MarketSnapshot, MarketStatus};
use crate::error::{Error, Result};
use crate::port::feed::MarketFeed;

/// Raw status payload as the feed serves it.
#[derive(Debug, Deserialize)]
struct StatusResponse {
    status_mercado: i32,
    rodada_atual: u32,
    temporada: u16,
    #[serde(default)]
    game_over: bool,
}

/// HTTP client for the market status endpoint.
pub struct HttpMarketFeed {
    client: Client,
    status_url: Url,
}

impl HttpMarketFeed {
    pub fn new(status_url: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Feed(e.to_string()))?;
        Ok(Self { client, status_url })
    }

    fn decode(response: StatusResponse) -> Result<MarketSnapshot> {
        // Some deployments flag season end out-of-band instead of code 6.
        let status = if response.game_over {
            MarketStatus::SeasonEnded
        } else {
            MarketStatus::from_wire(response.status_mercado).ok_or_else(|| {
                Error::Feed(format!(
                    "unsupported market status code {}",
                    response.status_mercado
                ))
            })?
        };

        Ok(MarketSnapshot {
            status,
            round_number: response.rodada_atual,
            season: response.temporada,
        })
    }
}

#[async_trait]
impl MarketFeed for HttpMarketFeed {
    async fn fetch_snapshot(&self) -> Result<MarketSnapshot> {
        let response: StatusResponse = self
            .client
            .get(self.status_url.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let snapshot = Self::decode(response)?;
        debug!(
            status = snapshot.status.label(),
            round = snapshot.round_number,
            "fetched market snapshot"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: i32, game_over: bool) -> StatusResponse {
        StatusResponse {
            status_mercado: status,
            rodada_atual: 11,
            temporada: 2025,
            game_over,
        }
    }

    #[test]
    fn decodes_known_wire_codes() {
        let snapshot = HttpMarketFeed::decode(response(2, false)).unwrap();
        assert_eq!(snapshot.status, MarketStatus::Closed);
        assert_eq!(snapshot.round_number, 11);
        assert_eq!(snapshot.season, 2025);
    }

    #[test]
    fn rejects_maintenance_codes() {
        for code in [3, 5, 0, 99] {
            assert!(HttpMarketFeed::decode(response(code, false)).is_err());
        }
    }

    #[test]
    fn game_over_flag_overrides_status_code() {
        let snapshot = HttpMarketFeed::decode(response(1, true)).unwrap();
        assert_eq!(snapshot.status, MarketStatus::SeasonEnded);
    }

    #[test]
    fn payload_deserializes_without_game_over() {
        let parsed: StatusResponse = serde_json::from_str(
            r#"{"status_mercado": 1, "rodada_atual": 12, "temporada": 2025}"#,
        )
        .unwrap();
        assert!(!parsed.game_over);
    }
}
