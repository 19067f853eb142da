// Third-party image search, used to put a picture next to search results
use tracing::debug;

use crate::error::read_body;
use crate::schema::ImageSearchResponse;
use crate::{ApiError, Result};

pub const DEFAULT_IMAGE_ENDPOINT: &str = "https://api.unsplash.com/search/photos";

pub struct ImageSearchClient {
    client: reqwest::Client,
    endpoint: String,
    access_key: Option<String>,
    per_page: u32,
}

impl ImageSearchClient {
    pub fn new(endpoint: impl Into<String>, access_key: Option<String>) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            endpoint: endpoint.into(),
            access_key: access_key.filter(|k| !k.trim().is_empty()),
            per_page: 1,
        })
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    pub fn is_configured(&self) -> bool {
        self.access_key.is_some()
    }

    /// Landscape photo search; returns the first hit's `regular` url, or
    /// `None` when the search came back empty.
    pub async fn search(&self, query: &str) -> Result<Option<String>> {
        let key = self.access_key.as_ref().ok_or(ApiError::NotConfigured)?;
        debug!("Image search for {:?}", query);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("query", query.to_string()),
                ("orientation", "landscape".to_string()),
                ("per_page", self.per_page.to_string()),
            ])
            .header(reqwest::header::AUTHORIZATION, format!("Client-ID {}", key))
            .send()
            .await?;

        let body = read_body(response).await?;
        first_image_url(&body)
    }
}

fn first_image_url(body: &str) -> Result<Option<String>> {
    let parsed: ImageSearchResponse = serde_json::from_str(body)?;
    Ok(parsed
        .results
        .into_iter()
        .map(|r| r.urls.regular)
        .find(|url| !url.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_image_url() {
        let body = r#"{"total": 2, "results": [
            {"id": "a", "urls": {"raw": "r", "regular": "https://img.example/a.jpg"}},
            {"id": "b", "urls": {"regular": "https://img.example/b.jpg"}}
        ]}"#;
        assert_eq!(
            first_image_url(body).unwrap().as_deref(),
            Some("https://img.example/a.jpg")
        );
    }

    #[test]
    fn test_no_results() {
        assert_eq!(first_image_url(r#"{"results": []}"#).unwrap(), None);
        assert!(first_image_url(r#"{"results": [{"urls": {}}]}"#).is_err());
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let client = ImageSearchClient::new(DEFAULT_IMAGE_ENDPOINT, Some("  ".into())).unwrap();
        assert!(!client.is_configured());

        let result = client.search("harbor").await;
        assert!(matches!(result, Err(ApiError::NotConfigured)));
    }
}
