use thiserror::Error;

/// Every way a call to a remote service can fail.
///
/// Callers are expected to treat all of these the same way; the variants
/// only exist so logs say something useful.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Malformed payload: {0}")]
    InvalidPayload(String),

    #[error("Image search is not configured")]
    NotConfigured,
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Turn a response into a typed payload, folding non-2xx statuses into errors.
pub(crate) async fn read_body(response: reqwest::Response) -> Result<String> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::RequestFailed(format!("Status {}: {}", status, body)));
    }
    Ok(response.text().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> reqwest::Response {
        reqwest::Response::from(
            http::Response::builder()
                .status(status)
                .body(body.to_string())
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_non_success_status_is_request_failed() {
        let result = read_body(response(502, "upstream down")).await;
        match result {
            Err(ApiError::RequestFailed(msg)) => {
                assert!(msg.contains("502"));
                assert!(msg.contains("upstream down"));
            }
            other => panic!("expected RequestFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_success_status_returns_body() {
        let body = read_body(response(200, r#"{"articles":[]}"#)).await.unwrap();
        assert_eq!(body, r#"{"articles":[]}"#);
    }
}
