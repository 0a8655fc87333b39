use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    /// Reading or replacing the run-state document failed.
    #[error("run state I/O error at {path}: {source}")]
    StateIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize run state: {0}")]
    StateSerialize(#[from] serde_json::Error),

    /// The backend did not accept a record.
    #[error("submission failed: {0}")]
    Submission(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("page driver error: {0}")]
    Driver(#[from] pricefeed_scraper::ScraperError),
}
