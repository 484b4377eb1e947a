use crate::error::RivalsApiError;
use reqwest::{Client, Url};
use rivals_core::config::{AppConfig, HttpConfig};
use rivals_core::types::{records_under_key, MatchRecord};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

const MATCH_HISTORY_PATH: &str = "/getPlayerMatchHistory";

#[derive(Debug, Clone)]
pub struct RivalsRestClient {
    http: Client,
    base_url: String,
    list_key: String,
}

impl RivalsRestClient {
    pub fn from_config(config: &AppConfig) -> Result<Self, RivalsApiError> {
        Self::from_http_config(&config.http)
    }

    pub fn from_http_config(config: &HttpConfig) -> Result<Self, RivalsApiError> {
        Self::with_options(&config.base_url, &config.list_key, config.timeout())
    }

    pub fn new(base_url: impl Into<String>) -> Result<Self, RivalsApiError> {
        let defaults = HttpConfig::default();
        Self::with_options(base_url, &defaults.list_key, defaults.timeout())
    }

    pub fn with_options(
        base_url: impl Into<String>,
        list_key: &str,
        timeout: Duration,
    ) -> Result<Self, RivalsApiError> {
        let base_url = base_url.into();
        Url::parse(&base_url).map_err(|err| RivalsApiError::InvalidBaseUrl {
            url: base_url.clone(),
            reason: err.to_string(),
        })?;

        let http = Client::builder()
            .user_agent("rivals-export/0.1")
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            list_key: list_key.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch and map the match history, surfacing every failure to the caller.
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn get_player_match_history(
        &self,
        username: &str,
    ) -> Result<Vec<MatchRecord>, RivalsApiError> {
        let url = format!("{}{MATCH_HISTORY_PATH}", self.base_url);
        info!(%url, "requesting match history");

        let response = self
            .http
            .get(&url)
            .query(&[("username", username)])
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            return Err(RivalsApiError::HttpStatusWithBody { status, body });
        }

        let body = response.text().await?;
        let payload: Value = serde_json::from_str(&body)?;
        debug!("decoded match history body");

        Ok(self.map_payload(&payload))
    }

    /// Same as [`get_player_match_history`](Self::get_player_match_history) but
    /// never fails: errors are logged and turned into an empty history.
    pub async fn fetch_match_history(&self, username: &str) -> Vec<MatchRecord> {
        match self.get_player_match_history(username).await {
            Ok(records) => records,
            Err(err) if err.is_network() => {
                error!(%err, "error fetching data from the match history server");
                error!(
                    base_url = %self.base_url,
                    username,
                    "make sure the Marvel Rivals server is running and reachable"
                );
                Vec::new()
            }
            Err(err @ RivalsApiError::Deserialize(_)) => {
                error!(%err, "server did not return valid JSON");
                Vec::new()
            }
            Err(err) => {
                error!(%err, "unexpected error while processing match history");
                Vec::new()
            }
        }
    }

    fn map_payload(&self, payload: &Value) -> Vec<MatchRecord> {
        match records_under_key(payload, &self.list_key) {
            Some(records) if !records.is_empty() => {
                info!(count = records.len(), "fetched match history");
                records
            }
            _ => {
                warn!(
                    key = %self.list_key,
                    "no '{}' list in the response or it is empty; inspect the raw JSON and adjust RIVALS_HTTP_LIST_KEY",
                    self.list_key
                );
                Vec::new()
            }
        }
    }
}
