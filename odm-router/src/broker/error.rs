use thiserror::Error;

/// Maximum response body length kept in error messages.
const BODY_TRUNCATE: usize = 500;

/// Errors raised by the broker exchange.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("broker request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("broker request timed out")]
    Timeout,

    #[error("broker returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse broker response: {message}; body: {body}")]
    Parse { message: String, body: String },
}

impl BrokerError {
    pub fn status(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            body: truncate(body),
        }
    }

    pub fn parse(err: &serde_json::Error, body: &str) -> Self {
        Self::Parse {
            message: err.to_string(),
            body: truncate(body),
        }
    }
}

impl From<reqwest::Error> for BrokerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

fn truncate(body: &str) -> String {
    if body.len() > BODY_TRUNCATE {
        let mut end = BODY_TRUNCATE;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_owned()
    }
}
