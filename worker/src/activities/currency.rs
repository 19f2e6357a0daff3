use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use temporalio_sdk::ActivityError;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConvertRequest {
    pub amount: f64,
    pub base_currency: String,
    pub target_currency: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConvertResponse {
    pub amount: f64,
}

/// Converts amounts using a public exchange-rate feed laid out as
/// `<endpoint>/<base>/<target>.json` with the rate under the `<target>` key.
pub struct CurrencyConversionActivities {
    client: reqwest::Client,
    endpoint: String,
}

impl CurrencyConversionActivities {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("kuflow-samples-worker")
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn convert(&self, request: ConvertRequest) -> Result<ConvertResponse, ActivityError> {
        self.convert_amount(&request)
            .await
            .map(|amount| ConvertResponse { amount })
            .map_err(ActivityError::from)
    }

    async fn convert_amount(&self, request: &ConvertRequest) -> Result<f64> {
        let base = request.base_currency.trim().to_lowercase();
        let target = request.target_currency.trim().to_lowercase();

        if base == target {
            return Ok(request.amount);
        }

        let rate = self.fetch_rate(&base, &target).await?;
        tracing::debug!(%base, %target, rate, "Fetched exchange rate");

        Ok(request.amount * rate)
    }

    async fn fetch_rate(&self, base: &str, target: &str) -> Result<f64> {
        let url = format!("{}/{}/{}.json", self.endpoint, base, target);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Exchange rate request to {} failed", url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Exchange rate request to {} returned {}",
                url,
                response.status()
            ));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .with_context(|| format!("Exchange rate response from {} is not JSON", url))?;

        body.get(target)
            .and_then(serde_json::Value::as_f64)
            .ok_or_else(|| anyhow!("Exchange rate for {} not found in response", target))
    }
}
