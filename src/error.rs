use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatesError {
    #[error("no network connection")]
    NoConnection,

    #[error("request failed: {0}")]
    Http(reqwest::Error),

    #[error("LMS API error {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to parse LMS response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for DatesError {
    fn from(err: reqwest::Error) -> Self {
        // DNS/connect failures and timeouts are surfaced as "no connection",
        // everything else stays a transport error.
        if err.is_connect() || err.is_timeout() {
            DatesError::NoConnection
        } else {
            DatesError::Http(err)
        }
    }
}

impl DatesError {
    pub fn is_connectivity(&self) -> bool {
        matches!(self, DatesError::NoConnection)
    }
}
