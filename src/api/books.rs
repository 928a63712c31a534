//! Book catalog endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::book::{BookProfile, CreateBook, SearchBooks, UpdateBook},
    validation::{self, rules, FieldRule},
    AppState,
};

use super::{Authenticated, JsonBody};

/// Response carrying the id of the created or updated book
#[derive(Serialize, ToSchema)]
pub struct BookIdResponse {
    pub message: String,
    pub book: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct BookResponse {
    pub message: String,
    pub book: BookProfile,
}

#[derive(Serialize, ToSchema)]
pub struct BooksResponse {
    pub message: String,
    pub books: Vec<BookProfile>,
}

/// List all books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All book profiles", body = BooksResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Authenticated(_session): Authenticated,
) -> AppResult<Json<BooksResponse>> {
    let books = state.services.catalog.list().await?;
    Ok(Json(BooksResponse {
        message: "books retrieved successfully".to_string(),
        books,
    }))
}

/// Get one book profile
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book profile", body = BookResponse),
        (status = 404, description = "Book not found"),
        (status = 422, description = "Malformed ID")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Authenticated(_session): Authenticated,
    Path(id): Path<String>,
) -> AppResult<Json<BookResponse>> {
    let id = validation::parse_id(&id)?;

    let book = state.services.catalog.get(id).await?;
    Ok(Json(BookResponse {
        message: "successfully retrieved book".to_string(),
        book,
    }))
}

/// Add a book to the collection
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 200, description = "Book added", body = BookIdResponse),
        (status = 403, description = "Moderators only"),
        (status = 409, description = "ISBN already in collection"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    JsonBody(body): JsonBody,
) -> AppResult<Json<BookIdResponse>> {
    session.require_moderator()?;

    let book: CreateBook = validation::validated(
        &[
            rules::title(),
            rules::author(),
            rules::isbn(),
            rules::details(),
            rules::image(),
        ],
        body,
    )?;

    let id = state.services.catalog.create(book).await?;
    Ok(Json(BookIdResponse {
        message: "book successfully added".to_string(),
        book: id,
    }))
}

/// Update a book. The ISBN cannot be changed.
#[utoipa::path(
    patch,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = BookIdResponse),
        (status = 403, description = "ISBN change or not a moderator"),
        (status = 404, description = "Book not found"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> AppResult<Json<BookIdResponse>> {
    session.require_moderator()?;
    UpdateBook::check_shape(&body)?;
    let id = validation::parse_id(&id)?;

    let update: UpdateBook = validation::validated(
        &[
            rules::title().optional(),
            rules::author().optional(),
            rules::details(),
            rules::image(),
            FieldRule::body("refresh_metadata").optional().boolean(),
        ],
        body,
    )?;

    let id = state.services.catalog.update(id, update).await?;
    Ok(Json(BookIdResponse {
        message: "book updated successfully".to_string(),
        book: id,
    }))
}

/// Full-text search over title, author and ISBN
#[utoipa::path(
    post,
    path = "/books/search",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = SearchBooks,
    responses(
        (status = 200, description = "Matching book profiles", body = BooksResponse),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn search_books(
    State(state): State<AppState>,
    Authenticated(_session): Authenticated,
    JsonBody(body): JsonBody,
) -> AppResult<Json<BooksResponse>> {
    let search: SearchBooks = validation::validated(&[rules::search()], body)?;

    let books = state.services.catalog.search(&search.search).await?;
    Ok(Json(BooksResponse {
        message: "search results".to_string(),
        books,
    }))
}
