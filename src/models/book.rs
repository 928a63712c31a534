//! Book (catalog entry) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Book record from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    #[serde(rename = "ISBN")]
    pub isbn: String,
    pub details: Option<String>,
    pub image: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Book with its categories and rating summary, as served to clients
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookProfile {
    #[serde(flatten)]
    pub book: Book,
    pub categories: Vec<String>,
    /// Average rating, absent until the book is rated
    pub rating: Option<f64>,
    pub ratings_count: i64,
}

/// Create book request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBook {
    pub title: String,
    pub author: String,
    #[serde(rename = "ISBN")]
    pub isbn: String,
    pub details: Option<String>,
    pub image: Option<String>,
}

/// Update book request. The ISBN is immutable; absent fields keep their value.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub author: Option<String>,
    pub details: Option<String>,
    pub image: Option<String>,
    /// Re-run the external metadata lookup for missing details/image
    #[serde(default)]
    pub refresh_metadata: bool,
}

impl UpdateBook {
    /// The ISBN identifies a book and is never rewritten.
    pub fn check_shape(body: &serde_json::Value) -> AppResult<()> {
        if body.get("ISBN").is_some() || body.get("isbn").is_some() {
            return Err(AppError::Authorization("ISBN cannot be changed".to_string()));
        }
        Ok(())
    }
}

/// Values written by a book update
#[derive(Debug, Clone)]
pub struct BookChanges {
    pub title: String,
    pub author: String,
    pub details: Option<String>,
    pub image: Option<String>,
}

impl BookChanges {
    pub fn merge(current: &Book, update: &UpdateBook) -> Self {
        Self {
            title: update.title.clone().unwrap_or_else(|| current.title.clone()),
            author: update.author.clone().unwrap_or_else(|| current.author.clone()),
            details: update.details.clone().or_else(|| current.details.clone()),
            image: update.image.clone().or_else(|| current.image.clone()),
        }
    }
}

/// Gap-filling data from the external catalog. Titles are never taken from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookMetadata {
    pub details: Option<String>,
    pub image: Option<String>,
}

/// Full-text search request
#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchBooks {
    pub search: String,
}

/// Category membership row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CategoryMembership {
    pub id: Uuid,
    pub category_name: String,
    pub book_id: Uuid,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Add/remove category request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CategoryRequest {
    pub category_name: String,
}
