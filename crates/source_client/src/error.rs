use thiserror::Error;

/// Everything that can go wrong talking to a remote service.
///
/// Every variant aborts a paginated fetch. Whether it aborts the whole
/// run is the caller's decision (sub-fetches are per-record).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("cannot reach {url}: {message}")]
    Connection { url: String, message: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("malformed response from {url}: {message}")]
    Parse { url: String, message: String },

    #[error("response from {url} has no '{field}'")]
    MissingField { url: String, field: String },

    #[error("no results returned from {url}")]
    EmptyResult { url: String },

    #[error("empty page in the middle of a result set at {url}")]
    EmptyPage { url: String },

    #[error("pagination loops back to {url}")]
    PaginationStuck { url: String },

    #[error("malformed CSV from {url}: {message}")]
    Csv { url: String, message: String },
}

impl FetchError {
    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout { url: url.to_string() }
        } else if err.is_decode() {
            FetchError::Parse { url: url.to_string(), message: err.to_string() }
        } else {
            FetchError::Connection { url: url.to_string(), message: err.to_string() }
        }
    }

    /// Connection-level failure, as opposed to a bad response.
    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::Connection { .. } | FetchError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_url() {
        let err = FetchError::Http { status: 503, url: "https://search.example.edu/api".into() };
        assert_eq!(err.to_string(), "HTTP 503 from https://search.example.edu/api");
        assert!(!err.is_network());
        assert!(FetchError::Timeout { url: "x".into() }.is_network());
    }
}
