use thiserror::Error;

/// Error taxonomy shared by every source adapter and the aggregation layer.
///
/// An empty search result is `Ok(vec![])`, never an error; `NotFound` is
/// reserved for upstream 404-equivalents and `Upstream` for transport
/// failures, timeouts, and unparseable responses.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("resource not found upstream")]
    NotFound,

    #[error("upstream error: {0}")]
    Upstream(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.status() == Some(reqwest::StatusCode::NOT_FOUND) {
            SourceError::NotFound
        } else {
            SourceError::Upstream(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Upstream(format!("unparseable response: {}", err))
    }
}

pub type SourceResult<T> = Result<T, SourceError>;
