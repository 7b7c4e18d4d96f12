use thiserror::Error;

pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The report code, fight or source cannot form a report URL.
    #[error("invalid report target: {0}")]
    InvalidTarget(String),

    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} while fetching {url}")]
    Status { status: u16, url: String },

    #[error("failed to parse HTML from {url}: {message}")]
    Parse { url: String, message: String },

    /// Output could not be written; the run's data is lost if this is swallowed.
    #[error("failed to write {path}: {message}")]
    Serialization { path: String, message: String },

    #[error("invalid config {path}: {message}")]
    Config { path: String, message: String },
}
