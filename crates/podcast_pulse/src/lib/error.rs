use podcast_datastore::TransitionError;

/// Failures surfaced by ingestion and episode processing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Required identifiers were missing or malformed; nothing was touched.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The scrape target did not answer successfully.
    #[error("Failed to fetch {url}: {reason}")]
    UpstreamFetch { url: String, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The completion endpoint answered with a non-success status.
    #[error("AI API error: {status} - {body}")]
    UpstreamAi { status: u16, body: String },

    #[error("Parse error: {0}")]
    ParseError(&'static str),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl Error {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Error::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
