//! Rating model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Rating at or above which a rating counts as a "like"
pub const LIKE_THRESHOLD: i16 = 3;

/// Rating record from database, unique per (user, book)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Rating {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub rating: i16,
    pub review: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Create or update rating request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RateBook {
    pub rating: i16,
    #[serde(default)]
    pub review: String,
}

/// Rating average for a book
#[derive(Debug, Clone, Default, FromRow)]
pub struct RatingSummary {
    pub average: Option<f64>,
    pub count: i64,
}
