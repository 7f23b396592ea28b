//! openexchangerates.org rate source.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use fxdesk_common::{constants, Currency};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{FxError, FxResult};
use crate::provider::RateSource;
use crate::snapshot::SpotRates;

const DEFAULT_ENDPOINT: &str = "https://openexchangerates.org/api/latest.json";

/// Body of `latest.json`. Only `rates` is required.
#[derive(Debug, Deserialize)]
struct LatestResponse {
    base: Option<String>,
    timestamp: Option<i64>,
    rates: Option<HashMap<String, f64>>,
}

/// Spot rates from openexchangerates.org.
pub struct OpenExchangeRatesSource {
    client: Client,
    app_id: String,
    endpoint: String,
}

impl OpenExchangeRatesSource {
    /// Create a source authenticated with `app_id`.
    pub fn new(app_id: impl Into<String>) -> Self {
        Self::with_timeout(app_id, constants::rate_fetch_timeout())
    }

    /// Create a source whose HTTP client gives up after `timeout`.
    pub fn with_timeout(app_id: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                Client::new()
            });

        Self {
            client,
            app_id: app_id.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Point the source at another endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn symbols_param(symbols: &[Currency]) -> String {
        symbols
            .iter()
            .map(Currency::code)
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[async_trait]
impl RateSource for OpenExchangeRatesSource {
    fn name(&self) -> &str {
        "openexchangerates"
    }

    async fn fetch(&self, base: Currency, symbols: &[Currency]) -> FxResult<SpotRates> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("app_id", self.app_id.as_str()),
                ("symbols", Self::symbols_param(symbols).as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FxError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        parse_latest(&body, base, symbols)
    }
}

/// Decode a `latest.json` body, keeping only `symbols`.
///
/// Codes outside the supported set are skipped. A payload quoted against
/// another base is rejected since the free plan cannot rebase.
pub fn parse_latest(body: &str, base: Currency, symbols: &[Currency]) -> FxResult<SpotRates> {
    let payload: LatestResponse =
        serde_json::from_str(body).map_err(|e| FxError::MalformedPayload(e.to_string()))?;

    let rates = payload
        .rates
        .ok_or_else(|| FxError::MalformedPayload("missing `rates` field".to_string()))?;

    if let Some(code) = payload.base.as_deref() {
        if !code.eq_ignore_ascii_case(base.code()) {
            return Err(FxError::MalformedPayload(format!(
                "expected base {base}, got {code}"
            )));
        }
    }

    let selected: Vec<(Currency, f64)> = rates
        .iter()
        .filter_map(|(code, rate)| code.parse::<Currency>().ok().map(|c| (c, *rate)))
        .filter(|(currency, _)| symbols.contains(currency))
        .collect();

    debug!(
        base = %base,
        timestamp = ?payload.timestamp,
        received = rates.len(),
        kept = selected.len(),
        "Decoded latest rates"
    );

    Ok(SpotRates::new(base, selected))
}
