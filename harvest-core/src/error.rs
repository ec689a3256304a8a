use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Session error: {0}")]
    Session(String),
}

pub type Result<T> = std::result::Result<T, HarvestError>;
