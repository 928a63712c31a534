//! Bookings repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::booking::{Booking, BookingChanges, BookingStatus, SalesTotal},
};

#[derive(Clone)]
pub struct BookingsRepository {
    pool: Pool<Postgres>,
}

impl BookingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get booking by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("booking does not exist".to_string()))
    }

    /// Create a pending booking
    pub async fn create(&self, user_id: Uuid, book_id: Uuid, quantity: i32) -> AppResult<Uuid> {
        let now = Utc::now();

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO bookings (id, user_id, book_id, quantity, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(book_id)
        .bind(quantity)
        .bind(BookingStatus::Pending)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Apply `changes` only while the booking is still pending.
    ///
    /// Returns `None` when no row matched, i.e. the booking vanished or
    /// reached a terminal state since it was read.
    pub async fn update_if_pending(
        &self,
        id: Uuid,
        changes: &BookingChanges,
    ) -> AppResult<Option<Uuid>> {
        let updated = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE bookings
            SET quantity = $1, status = $2, updated_at = $3
            WHERE id = $4 AND status = $5
            RETURNING id
            "#,
        )
        .bind(changes.quantity)
        .bind(changes.status)
        .bind(Utc::now())
        .bind(id)
        .bind(BookingStatus::Pending)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    /// All bookings, most recently updated first
    pub async fn list_all(&self) -> AppResult<Vec<Booking>> {
        let bookings =
            sqlx::query_as::<_, Booking>("SELECT * FROM bookings ORDER BY updated_at DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(bookings)
    }

    /// Bookings with a status, most recently updated first
    pub async fn list_by_status(&self, status: BookingStatus) -> AppResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE status = $1 ORDER BY updated_at DESC",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(bookings)
    }

    /// Bookings made by a user, most recently updated first
    pub async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE user_id = $1 ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(bookings)
    }

    /// Bookings of a book, optionally restricted to one user
    pub async fn list_by_book(&self, book_id: Uuid, user_id: Option<Uuid>) -> AppResult<Vec<Booking>> {
        let bookings = if let Some(user_id) = user_id {
            sqlx::query_as::<_, Booking>(
                r#"
                SELECT * FROM bookings
                WHERE book_id = $1 AND user_id = $2
                ORDER BY updated_at DESC
                "#,
            )
            .bind(book_id)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, Booking>(
                "SELECT * FROM bookings WHERE book_id = $1 ORDER BY updated_at DESC",
            )
            .bind(book_id)
            .fetch_all(&self.pool)
            .await?
        };
        Ok(bookings)
    }

    /// Booked quantity per book for bookings created in `[start, end]`,
    /// largest first
    pub async fn sales_totals(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<SalesTotal>> {
        let totals = sqlx::query_as::<_, SalesTotal>(
            r#"
            SELECT book_id, SUM(quantity)::BIGINT AS count
            FROM bookings
            WHERE created_at >= $1 AND created_at <= $2
            GROUP BY book_id
            ORDER BY count DESC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(totals)
    }
}
