//! Ratings and recommendations

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    auth::Session,
    error::{AppError, AppResult},
    models::{book::BookProfile, rating::{RateBook, Rating}},
    repository::Repository,
    services::{
        catalog::CatalogService,
        recommender::{dispatch_detached, Recommender, Signal},
    },
};

/// Recommendations returned when no count is asked for
pub const DEFAULT_RECOMMENDATIONS: usize = 10;
/// Upper bound on the recommendations returned at once
pub const MAX_RECOMMENDATIONS: usize = 50;

#[derive(Clone)]
pub struct RatingsService {
    repository: Repository,
    catalog: CatalogService,
    recommender: Arc<dyn Recommender>,
}

impl RatingsService {
    pub fn new(repository: Repository, catalog: CatalogService, recommender: Arc<dyn Recommender>) -> Self {
        Self {
            repository,
            catalog,
            recommender,
        }
    }

    /// Create or replace the caller's rating of a book and notify the
    /// recommender in the background
    pub async fn rate(&self, caller: &Session, book_id: Uuid, rate: RateBook) -> AppResult<Uuid> {
        self.catalog.ensure_exists(book_id).await?;

        let previous = self.repository.ratings.find(caller.user_id, book_id).await?;
        let saved = self
            .repository
            .ratings
            .upsert(caller.user_id, book_id, rate.rating, &rate.review)
            .await?;

        let signals = Signal::transition(previous.map(|r| r.rating), saved.rating);
        dispatch_detached(self.recommender.clone(), caller.user_id, book_id, signals);

        tracing::info!(rating_id = %saved.id, %book_id, rating = saved.rating, "book rated");
        Ok(saved.id)
    }

    pub async fn list_by_book(&self, book_id: Uuid) -> AppResult<Vec<Rating>> {
        self.catalog.ensure_exists(book_id).await?;
        self.repository.ratings.list_by_book(book_id).await
    }

    pub async fn list_by_user(&self, caller: &Session) -> AppResult<Vec<Rating>> {
        self.repository.ratings.list_by_user(caller.user_id).await
    }

    /// The caller's rating of a book
    pub async fn get_mine(&self, caller: &Session, book_id: Uuid) -> AppResult<Rating> {
        self.catalog.ensure_exists(book_id).await?;
        self.repository
            .ratings
            .find(caller.user_id, book_id)
            .await?
            .ok_or_else(|| AppError::NotFound("rating does not exist".to_string()))
    }

    /// Books recommended for the caller. An unreachable engine yields no
    /// recommendations rather than an error.
    pub async fn recommendations(&self, caller: &Session, count: Option<usize>) -> AppResult<Vec<BookProfile>> {
        let count = clamp_count(count);

        let ids = match self.recommender.recommend(caller.user_id, count).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(user_id = %caller.user_id, "recommendations unavailable: {}", e);
                return Ok(Vec::new());
            }
        };

        self.catalog.profiles_by_ids(&ids).await
    }
}

fn clamp_count(count: Option<usize>) -> usize {
    count
        .unwrap_or(DEFAULT_RECOMMENDATIONS)
        .clamp(1, MAX_RECOMMENDATIONS)
}
