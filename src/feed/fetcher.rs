use thiserror::Error;

/// Response bodies above this size are rejected outright; no real feed
/// comes anywhere close. (10 MB)
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024;

/// Errors that can occur while retrieving a feed document.
///
/// The pipeline collapses all of them to "this fetch produced nothing";
/// the variants exist so the warning says what actually went wrong.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, timeout)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
}

/// Fetches one feed document as raw bytes.
///
/// One GET per feed per run, no retries: the next scheduled run is the
/// retry policy. The client's own timeout bounds the whole request, so a
/// stalled feed cannot hold up the run indefinitely.
pub async fn fetch_feed(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, FetchError> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    // Fast path: Content-Length already rules the body out
    if let Some(len) = response.content_length() {
        if len as usize > MAX_FEED_SIZE {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let bytes = response.bytes().await?;
    if bytes.len() > MAX_FEED_SIZE {
        return Err(FetchError::ResponseTooLarge);
    }

    Ok(bytes.to_vec())
}
