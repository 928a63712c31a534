//! Rating and recommendation endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::rating::{RateBook, Rating},
    validation::{self, rules},
    AppState,
};

use super::{books::BooksResponse, Authenticated, JsonBody};

#[derive(Serialize, ToSchema)]
pub struct RatingIdResponse {
    pub message: String,
    pub rating: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct RatingResponse {
    pub message: String,
    pub rating: Rating,
}

#[derive(Serialize, ToSchema)]
pub struct RatingsResponse {
    pub message: String,
    pub ratings: Vec<Rating>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RecommendationsQuery {
    /// Number of books wanted (default 10, at most 50)
    pub count: Option<usize>,
}

/// Create or replace the caller's rating of a book
#[utoipa::path(
    put,
    path = "/books/{id}/ratings",
    tag = "ratings",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    request_body = RateBook,
    responses(
        (status = 200, description = "Rating saved", body = RatingIdResponse),
        (status = 404, description = "Book not found"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn rate_book(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> AppResult<Json<RatingIdResponse>> {
    let book_id = validation::parse_id(&id)?;
    let rate: RateBook = validation::validated(&[rules::rating(), rules::review()], body)?;

    let id = state.services.ratings.rate(&session, book_id, rate).await?;

    Ok(Json(RatingIdResponse {
        message: "successfully created/updated rating".to_string(),
        rating: id,
    }))
}

/// Ratings of a book
#[utoipa::path(
    get,
    path = "/books/{id}/ratings",
    tag = "ratings",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Ratings of the book", body = RatingsResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn book_ratings(
    State(state): State<AppState>,
    Authenticated(_session): Authenticated,
    Path(id): Path<String>,
) -> AppResult<Json<RatingsResponse>> {
    let book_id = validation::parse_id(&id)?;

    let ratings = state.services.ratings.list_by_book(book_id).await?;
    Ok(Json(RatingsResponse {
        message: "succesfully retrieved user ratings for book".to_string(),
        ratings,
    }))
}

/// The caller's rating of a book
#[utoipa::path(
    get,
    path = "/books/{id}/ratings/me",
    tag = "ratings",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Caller rating", body = RatingResponse),
        (status = 404, description = "Book or rating not found")
    )
)]
pub async fn my_book_rating(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Path(id): Path<String>,
) -> AppResult<Json<RatingResponse>> {
    let book_id = validation::parse_id(&id)?;

    let rating = state.services.ratings.get_mine(&session, book_id).await?;
    Ok(Json(RatingResponse {
        message: "succesfully retrieved user ratings for book".to_string(),
        rating,
    }))
}

/// Ratings given by the caller
#[utoipa::path(
    get,
    path = "/users/me/ratings",
    tag = "ratings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller ratings", body = RatingsResponse)
    )
)]
pub async fn my_ratings(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
) -> AppResult<Json<RatingsResponse>> {
    let ratings = state.services.ratings.list_by_user(&session).await?;
    Ok(Json(RatingsResponse {
        message: "succesfully retrieved user ratings".to_string(),
        ratings,
    }))
}

/// Books recommended for the caller
#[utoipa::path(
    get,
    path = "/users/me/recommendations",
    tag = "ratings",
    security(("bearer_auth" = [])),
    params(RecommendationsQuery),
    responses(
        (status = 200, description = "Recommended book profiles", body = BooksResponse)
    )
)]
pub async fn my_recommendations(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Query(query): Query<RecommendationsQuery>,
) -> AppResult<Json<BooksResponse>> {
    let books = state
        .services
        .ratings
        .recommendations(&session, query.count)
        .await?;

    Ok(Json(BooksResponse {
        message: "successfully retrieved recommendations".to_string(),
        books,
    }))
}
