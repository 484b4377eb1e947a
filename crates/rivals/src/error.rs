use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RivalsApiError {
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("unexpected http status {status}: {body}")]
    HttpStatusWithBody { status: StatusCode, body: String },
    #[error("response body is not valid JSON: {0}")]
    Deserialize(#[from] serde_json::Error),
    #[error("invalid base url {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl RivalsApiError {
    /// Transport and status failures, as opposed to a body we could not parse.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            RivalsApiError::HttpClient(_) | RivalsApiError::HttpStatusWithBody { .. }
        )
    }
}
