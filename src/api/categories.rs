//! Category endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::book::{CategoryMembership, CategoryRequest},
    validation::{self, rules},
    AppState,
};

use super::{books::BooksResponse, Authenticated, JsonBody, MessageResponse};

#[derive(Serialize, ToSchema)]
pub struct CategoryResponse {
    pub message: String,
    pub category: CategoryMembership,
}

#[derive(Serialize, ToSchema)]
pub struct CategoryNamesResponse {
    pub message: String,
    pub categories: Vec<String>,
}

/// Add a book to a category
#[utoipa::path(
    post,
    path = "/books/{id}/category",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Book added to category", body = CategoryResponse),
        (status = 403, description = "Moderators only"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book already in this category")
    )
)]
pub async fn add_category(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> AppResult<Json<CategoryResponse>> {
    session.require_moderator()?;
    let id = validation::parse_id(&id)?;
    let request: CategoryRequest = validation::validated(&[rules::category_name()], body)?;

    let category = state
        .services
        .catalog
        .add_category(id, &request.category_name)
        .await?;

    Ok(Json(CategoryResponse {
        message: "successfully added book to category".to_string(),
        category,
    }))
}

/// Remove a book from a category
#[utoipa::path(
    delete,
    path = "/books/{id}/category",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Book removed from category", body = MessageResponse),
        (status = 403, description = "Moderators only"),
        (status = 404, description = "Book not found or not in this category")
    )
)]
pub async fn remove_category(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> AppResult<Json<MessageResponse>> {
    session.require_moderator()?;
    let id = validation::parse_id(&id)?;
    let request: CategoryRequest = validation::validated(&[rules::category_name()], body)?;

    state
        .services
        .catalog
        .remove_category(id, &request.category_name)
        .await?;

    Ok(MessageResponse::new("successfully removed book from category"))
}

/// Distinct category names
#[utoipa::path(
    get,
    path = "/books/category/names",
    tag = "categories",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Category names", body = CategoryNamesResponse)
    )
)]
pub async fn category_names(
    State(state): State<AppState>,
    Authenticated(_session): Authenticated,
) -> AppResult<Json<CategoryNamesResponse>> {
    let categories = state.services.catalog.category_names().await?;
    Ok(Json(CategoryNamesResponse {
        message: "successfully retrieved category names".to_string(),
        categories,
    }))
}

/// Books of a category
#[utoipa::path(
    get,
    path = "/books/category/{category_name}",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(
        ("category_name" = String, Path, description = "Category name")
    ),
    responses(
        (status = 200, description = "Book profiles in the category", body = BooksResponse)
    )
)]
pub async fn books_in_category(
    State(state): State<AppState>,
    Authenticated(_session): Authenticated,
    Path(category_name): Path<String>,
) -> AppResult<Json<BooksResponse>> {
    let name = validation::escape(category_name.trim());

    let books = state.services.catalog.in_category(&name).await?;
    Ok(Json(BooksResponse {
        message: "successfully retrieved books of given category".to_string(),
        books,
    }))
}
