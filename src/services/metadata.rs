//! Book metadata lookup by ISBN

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::book::BookMetadata,
};

/// Source of descriptive data for a book
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    async fn lookup(&self, isbn: &str) -> AppResult<Option<BookMetadata>>;
}

/// Google Books volumes API client
pub struct GoogleBooksLookup {
    url: String,
    client: reqwest::Client,
}

impl GoogleBooksLookup {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl MetadataLookup for GoogleBooksLookup {
    async fn lookup(&self, isbn: &str) -> AppResult<Option<BookMetadata>> {
        let body: Value = self
            .client
            .get(&self.url)
            .query(&[("q", format!("isbn:{}", isbn))])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::Internal(format!("Metadata request failed: {}", e)))?
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to parse metadata response: {}", e)))?;

        Ok(parse_volumes(&body))
    }
}

/// Extract the first volume of a Google Books search response
pub fn parse_volumes(body: &Value) -> Option<BookMetadata> {
    let info = body.get("items")?.get(0)?.get("volumeInfo")?;
    let text = |v: Option<&Value>| v.and_then(Value::as_str).map(str::to_string);

    let metadata = BookMetadata {
        details: text(info.get("description")),
        image: text(info.get("imageLinks").and_then(|l| l.get("thumbnail"))),
    };

    (metadata != BookMetadata::default()).then_some(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_first_volume() {
        let body = json!({
            "totalItems": 2,
            "items": [
                {
                    "volumeInfo": {
                        "title": "Dune",
                        "description": "A desert planet.",
                        "imageLinks": { "thumbnail": "http://books.google.com/dune.jpg" }
                    }
                },
                { "volumeInfo": { "title": "Other" } }
            ]
        });

        let meta = parse_volumes(&body).unwrap();
        assert_eq!(meta.details.as_deref(), Some("A desert planet."));
        assert_eq!(meta.image.as_deref(), Some("http://books.google.com/dune.jpg"));
    }

    #[test]
    fn test_parse_partial_and_empty() {
        let meta = parse_volumes(&json!({ "items": [{ "volumeInfo": { "description": "x" } }] })).unwrap();
        assert_eq!(meta.image, None);
        assert_eq!(meta.details.as_deref(), Some("x"));

        assert!(parse_volumes(&json!({ "totalItems": 0 })).is_none());
        assert!(parse_volumes(&json!({ "items": [{ "volumeInfo": {} }] })).is_none());
        assert!(parse_volumes(&json!({ "items": [{ "volumeInfo": { "title": "Dune" } }] })).is_none());
    }
}
