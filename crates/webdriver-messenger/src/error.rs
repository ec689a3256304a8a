use thiserror::Error;

pub type Result<T> = std::result::Result<T, WebDriverError>;

#[derive(Debug, Error)]
pub enum WebDriverError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("WebDriver error (status {status}) {error}: {message}")]
    Command {
        status: u16,
        error: String,
        message: String,
    },

    #[error("Unexpected WebDriver response: {0}")]
    Protocol(String),
}

impl WebDriverError {
    /// True for the W3C `no such element` error, which lookups treat as "not found".
    pub fn is_no_such_element(&self) -> bool {
        matches!(self, WebDriverError::Command { error, .. } if error == "no such element")
    }
}

impl From<reqwest::Error> for WebDriverError {
    fn from(err: reqwest::Error) -> Self {
        WebDriverError::Network(err.to_string())
    }
}
