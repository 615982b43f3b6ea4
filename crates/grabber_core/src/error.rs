use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamsError {
    #[error("no site selected")]
    MissingSite,
    #[error("worker count must be at least 1")]
    NoWorkers,
    #[error("poll interval must be a positive number of seconds, got {0}")]
    BadInterval(f64),
    #[error("price range is inverted: min {min} > max {max}")]
    InvertedPriceRange { min: u64, max: u64 },
    #[error("malformed grab parameters: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StartError {
    #[error("invalid parameters: {0}")]
    InvalidParams(#[from] ParamsError),
    #[error("grabbing is already running")]
    AlreadyRunning,
}
