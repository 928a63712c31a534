//! Ratings repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::rating::{Rating, RatingSummary},
};

#[derive(Clone)]
pub struct RatingsRepository {
    pool: Pool<Postgres>,
}

impl RatingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Rating given by a user to a book
    pub async fn find(&self, user_id: Uuid, book_id: Uuid) -> AppResult<Option<Rating>> {
        let rating = sqlx::query_as::<_, Rating>(
            "SELECT * FROM ratings WHERE user_id = $1 AND book_id = $2",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rating)
    }

    /// Insert or overwrite the rating of a (user, book) pair
    pub async fn upsert(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        rating: i16,
        review: &str,
    ) -> AppResult<Rating> {
        let now = Utc::now();

        let saved = sqlx::query_as::<_, Rating>(
            r#"
            INSERT INTO ratings (id, user_id, book_id, rating, review, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ON CONFLICT (user_id, book_id)
            DO UPDATE SET rating = EXCLUDED.rating, review = EXCLUDED.review, updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(book_id)
        .bind(rating)
        .bind(review)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }

    /// Ratings of a book, most recently updated first
    pub async fn list_by_book(&self, book_id: Uuid) -> AppResult<Vec<Rating>> {
        let ratings = sqlx::query_as::<_, Rating>(
            "SELECT * FROM ratings WHERE book_id = $1 ORDER BY updated_at DESC",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ratings)
    }

    /// Ratings given by a user, most recently updated first
    pub async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<Rating>> {
        let ratings = sqlx::query_as::<_, Rating>(
            "SELECT * FROM ratings WHERE user_id = $1 ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ratings)
    }

    /// Average and count of the ratings of a book
    pub async fn summary(&self, book_id: Uuid) -> AppResult<RatingSummary> {
        let summary = sqlx::query_as::<_, RatingSummary>(
            r#"
            SELECT AVG(rating)::FLOAT8 AS average, COUNT(*) AS count
            FROM ratings
            WHERE book_id = $1
            "#,
        )
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(summary)
    }
}
