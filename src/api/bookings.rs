//! Booking endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::booking::{Booking, BookingStatus, CreateBooking, SalesEntry, SalesReportQuery, UpdateBooking},
    validation::{self, rules},
    AppState,
};

use super::{Authenticated, JsonBody};

/// Response carrying the id of the created or updated booking
#[derive(Serialize, ToSchema)]
pub struct BookingIdResponse {
    pub message: String,
    pub booking: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct BookingsResponse {
    pub message: String,
    pub bookings: Vec<Booking>,
}

#[derive(Serialize, ToSchema)]
pub struct SalesReportResponse {
    pub message: String,
    pub books: Vec<SalesEntry>,
}

fn bookings_response(message: &str, bookings: Vec<Booking>) -> Json<BookingsResponse> {
    Json(BookingsResponse {
        message: message.to_string(),
        bookings,
    })
}

/// Book copies of a book. The booking always starts pending.
#[utoipa::path(
    post,
    path = "/books/{id}/bookings",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    request_body = CreateBooking,
    responses(
        (status = 200, description = "Booking created", body = BookingIdResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Book not found"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn create_booking(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> AppResult<Json<BookingIdResponse>> {
    let book_id = validation::parse_id(&id)?;
    let booking: CreateBooking = validation::validated(&[rules::quantity()], body)?;

    let id = state
        .services
        .bookings
        .create(&session, book_id, booking)
        .await?;

    Ok(Json(BookingIdResponse {
        message: "successfully completed booking".to_string(),
        booking: id,
    }))
}

/// Change the quantity or the status of a pending booking
#[utoipa::path(
    patch,
    path = "/books/bookings/{id}",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Booking ID")
    ),
    request_body = UpdateBooking,
    responses(
        (status = 200, description = "Booking updated", body = BookingIdResponse),
        (status = 403, description = "Forbidden change or booking no longer pending"),
        (status = 404, description = "Booking not found"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn update_booking(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> AppResult<Json<BookingIdResponse>> {
    UpdateBooking::check_shape(&body)?;
    let id = validation::parse_id(&id)?;

    let update: UpdateBooking = validation::validated(
        &[rules::quantity().optional(), rules::status().optional()],
        body,
    )?;

    let id = state.services.bookings.update(&session, id, update).await?;

    Ok(Json(BookingIdResponse {
        message: "successfully updated booking".to_string(),
        booking: id,
    }))
}

/// All bookings
#[utoipa::path(
    get,
    path = "/books/bookings",
    tag = "bookings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All bookings", body = BookingsResponse),
        (status = 403, description = "Moderators only")
    )
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
) -> AppResult<Json<BookingsResponse>> {
    let bookings = state.services.bookings.list_all(&session).await?;
    Ok(bookings_response("succesfully retrieved bookings", bookings))
}

/// Bookings with a given status
#[utoipa::path(
    get,
    path = "/books/bookings/{status}",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("status" = String, Path, description = "pending, approved or cancelled")
    ),
    responses(
        (status = 200, description = "Bookings with the status", body = BookingsResponse),
        (status = 403, description = "Moderators only"),
        (status = 422, description = "Unknown status")
    )
)]
pub async fn list_bookings_by_status(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Path(status): Path<String>,
) -> AppResult<Json<BookingsResponse>> {
    let status: BookingStatus = validation::parse_status(&status)?
        .parse()
        .map_err(AppError::Validation)?;

    let bookings = state
        .services
        .bookings
        .list_by_status(&session, status)
        .await?;
    Ok(bookings_response("succesfully retrieved bookings", bookings))
}

/// Bookings of the caller
#[utoipa::path(
    get,
    path = "/users/me/bookings",
    tag = "bookings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller bookings", body = BookingsResponse)
    )
)]
pub async fn my_bookings(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
) -> AppResult<Json<BookingsResponse>> {
    let bookings = state
        .services
        .bookings
        .list_by_user(&session, session.user_id)
        .await?;
    Ok(bookings_response("succesfully retrieved user bookings", bookings))
}

/// Bookings of a user
#[utoipa::path(
    get,
    path = "/users/{id}/bookings",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User bookings", body = BookingsResponse),
        (status = 403, description = "Not the user nor a moderator")
    )
)]
pub async fn user_bookings(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Path(id): Path<String>,
) -> AppResult<Json<BookingsResponse>> {
    let user_id = validation::parse_id(&id)?;

    let bookings = state
        .services
        .bookings
        .list_by_user(&session, user_id)
        .await?;
    Ok(bookings_response("succesfully retrieved user bookings", bookings))
}

/// Bookings of a book: all for moderators, the caller's own otherwise
#[utoipa::path(
    get,
    path = "/books/{id}/bookings",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Bookings of the book", body = BookingsResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn book_bookings(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Path(id): Path<String>,
) -> AppResult<Json<BookingsResponse>> {
    let book_id = validation::parse_id(&id)?;

    let bookings = state
        .services
        .bookings
        .list_by_book(&session, book_id)
        .await?;
    Ok(bookings_response("succesfully retrieved user bookings for book", bookings))
}

/// The caller's bookings of a book
#[utoipa::path(
    get,
    path = "/books/{id}/bookings/me",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Caller bookings of the book", body = BookingsResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn my_book_bookings(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Path(id): Path<String>,
) -> AppResult<Json<BookingsResponse>> {
    let book_id = validation::parse_id(&id)?;

    let bookings = state
        .services
        .bookings
        .list_mine_by_book(&session, book_id)
        .await?;
    Ok(bookings_response("succesfully retrieved user bookings for book", bookings))
}

/// Booked quantities per book between two dates
#[utoipa::path(
    get,
    path = "/books/report",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(SalesReportQuery),
    responses(
        (status = 200, description = "Sales report", body = SalesReportResponse),
        (status = 403, description = "Administrator only"),
        (status = 422, description = "Missing or invalid dates")
    )
)]
pub async fn sales_report(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Query(query): Query<SalesReportQuery>,
) -> AppResult<Json<SalesReportResponse>> {
    let books = state.services.bookings.sales_report(&session, &query).await?;
    Ok(Json(SalesReportResponse {
        message: "successfully retrieved report".to_string(),
        books,
    }))
}
