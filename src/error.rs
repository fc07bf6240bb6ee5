//! Error types surfaced to callers
//!
//! Only fetch failures are reported as errors. Malformed records, layout misses
//! and degenerate scales are recovered locally and logged as warnings.

#[derive(Debug)]
pub enum DataFetchError {
    Http(reqwest::Error),
    Api(String),
    InvalidDate(String),
    MissingApiKey,
    Io(std::io::Error),
    Serialization(serde_json::Error),
}

impl From<reqwest::Error> for DataFetchError {
    fn from(err: reqwest::Error) -> Self {
        DataFetchError::Http(err)
    }
}

impl From<std::io::Error> for DataFetchError {
    fn from(err: std::io::Error) -> Self {
        DataFetchError::Io(err)
    }
}

impl From<serde_json::Error> for DataFetchError {
    fn from(err: serde_json::Error) -> Self {
        DataFetchError::Serialization(err)
    }
}

impl std::fmt::Display for DataFetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataFetchError::Http(e) => write!(f, "HTTP error: {}", e),
            DataFetchError::Api(msg) => write!(f, "Explorer API error: {}", msg),
            DataFetchError::InvalidDate(date) => write!(
                f,
                "Invalid date format: '{}'. Expected 'YYYY-MM-DD' or 'YYYY-MM-DD HH:MM:SS'.",
                date
            ),
            DataFetchError::MissingApiKey => {
                write!(f, "API key is required for the selected network.")
            }
            DataFetchError::Io(e) => write!(f, "IO error: {}", e),
            DataFetchError::Serialization(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl std::error::Error for DataFetchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_human_readable() {
        let err = DataFetchError::InvalidDate("yesterday".to_string());
        assert!(err.to_string().contains("'yesterday'"));

        let err = DataFetchError::Api("Max rate limit reached".to_string());
        assert_eq!(err.to_string(), "Explorer API error: Max rate limit reached");
    }
}
