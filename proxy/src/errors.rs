use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Upstream responded {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned no readings")]
    EmptyReadings,

    #[error("Missing required configuration: {0}")]
    MissingConfig(&'static str),

    #[error("Invalid value {value:?} for {key}")]
    InvalidConfig { key: &'static str, value: String },

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
