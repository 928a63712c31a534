//! Recommendation engine client and rating signals

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::rating::LIKE_THRESHOLD,
};

/// Preference signal sent to the recommendation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Liked,
    Unliked,
    Disliked,
    Undisliked,
}

impl Signal {
    /// Signal carried by a rating value
    pub fn for_rating(rating: i16) -> Self {
        if rating >= LIKE_THRESHOLD {
            Signal::Liked
        } else {
            Signal::Disliked
        }
    }

    /// Signal undoing this one
    pub fn retraction(self) -> Self {
        match self {
            Signal::Liked | Signal::Unliked => Signal::Unliked,
            Signal::Disliked | Signal::Undisliked => Signal::Undisliked,
        }
    }

    /// Signals to send, in order, when a rating goes from `previous` to
    /// `current`. The old preference is retracted before the new one is sent.
    pub fn transition(previous: Option<i16>, current: i16) -> Vec<Signal> {
        let mut signals = Vec::with_capacity(2);
        if let Some(previous) = previous {
            signals.push(Signal::for_rating(previous).retraction());
        }
        signals.push(Signal::for_rating(current));
        signals
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Liked => "liked",
            Signal::Unliked => "unliked",
            Signal::Disliked => "disliked",
            Signal::Undisliked => "undisliked",
        }
    }
}

/// Collaborative-filtering engine fed with rating signals
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Recommender: Send + Sync {
    /// Record a preference of `user_id` for `book_id`
    async fn send(&self, signal: Signal, user_id: Uuid, book_id: Uuid) -> AppResult<()>;

    /// Up to `count` book ids recommended for `user_id`, best first
    async fn recommend(&self, user_id: Uuid, count: usize) -> AppResult<Vec<Uuid>>;
}

/// Send `signals` one after the other, stopping at the first failure.
/// Failures are logged and swallowed.
pub async fn dispatch(recommender: &dyn Recommender, user_id: Uuid, book_id: Uuid, signals: &[Signal]) {
    for signal in signals {
        if let Err(e) = recommender.send(*signal, user_id, book_id).await {
            tracing::warn!(
                signal = signal.as_str(),
                %user_id,
                %book_id,
                "recommender signal dropped: {}",
                e
            );
            return;
        }
    }
}

/// Run [`dispatch`] in the background
pub fn dispatch_detached(recommender: Arc<dyn Recommender>, user_id: Uuid, book_id: Uuid, signals: Vec<Signal>) {
    tokio::spawn(async move {
        dispatch(recommender.as_ref(), user_id, book_id, &signals).await;
    });
}

#[derive(Serialize)]
struct SignalEvent<'a> {
    event: &'a str,
    user: Uuid,
    item: Uuid,
}

#[derive(Deserialize)]
struct RecommendationsResponse {
    items: Vec<Uuid>,
}

/// Recommendation engine reached over HTTP
pub struct HttpRecommender {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRecommender {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

fn engine_error(e: reqwest::Error) -> AppError {
    AppError::Internal(format!("Recommender request failed: {}", e))
}

#[async_trait]
impl Recommender for HttpRecommender {
    async fn send(&self, signal: Signal, user_id: Uuid, book_id: Uuid) -> AppResult<()> {
        let response = self
            .client
            .post(format!("{}/events", self.base_url))
            .json(&SignalEvent {
                event: signal.as_str(),
                user: user_id,
                item: book_id,
            })
            .send()
            .await
            .map_err(engine_error)?;

        response.error_for_status().map_err(engine_error)?;
        Ok(())
    }

    async fn recommend(&self, user_id: Uuid, count: usize) -> AppResult<Vec<Uuid>> {
        let response = self
            .client
            .get(format!("{}/recommendations/{}", self.base_url, user_id))
            .query(&[("count", count)])
            .send()
            .await
            .map_err(engine_error)?
            .error_for_status()
            .map_err(engine_error)?;

        let body: RecommendationsResponse = response.json().await.map_err(engine_error)?;
        Ok(body.items.into_iter().take(count).collect())
    }
}

/// Used when no engine is configured
pub struct NoopRecommender;

#[async_trait]
impl Recommender for NoopRecommender {
    async fn send(&self, signal: Signal, user_id: Uuid, book_id: Uuid) -> AppResult<()> {
        tracing::debug!(signal = signal.as_str(), %user_id, %book_id, "recommender disabled");
        Ok(())
    }

    async fn recommend(&self, _user_id: Uuid, _count: usize) -> AppResult<Vec<Uuid>> {
        Ok(Vec::new())
    }
}
