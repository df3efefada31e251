use thiserror::Error;

/// Why a single page could not be fetched
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_url() {
        let err = FetchError::Status {
            url: "https://api.ipfs-search.com/v1/search?q=ovpn&type=file&page=4".to_string(),
            status: 429,
        };
        assert_eq!(
            err.to_string(),
            "https://api.ipfs-search.com/v1/search?q=ovpn&type=file&page=4 answered with HTTP 429"
        );

        let err = FetchError::Decode {
            url: "u".to_string(),
            reason: "expected value at line 1 column 1".to_string(),
        };
        assert!(err.to_string().starts_with("malformed response from u"));
    }
}
