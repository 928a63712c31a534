//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, bookings, books, categories, health, ratings, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookshelf API",
        version = "1.0.0",
        description = "Book catalog, bookings and ratings REST API"
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::logout,
        // Users
        users::list_users,
        users::get_me,
        users::get_user,
        users::update_user,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::search_books,
        // Categories
        categories::add_category,
        categories::remove_category,
        categories::category_names,
        categories::books_in_category,
        // Bookings
        bookings::create_booking,
        bookings::update_booking,
        bookings::list_bookings,
        bookings::list_bookings_by_status,
        bookings::my_bookings,
        bookings::user_bookings,
        bookings::book_bookings,
        bookings::my_book_bookings,
        bookings::sales_report,
        // Ratings
        ratings::rate_book,
        ratings::book_ratings,
        ratings::my_book_rating,
        ratings::my_ratings,
        ratings::my_recommendations,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::UserIdResponse,
            // Users
            crate::models::user::Role,
            crate::models::user::User,
            crate::models::user::RegisterUser,
            crate::models::user::UpdateUser,
            users::UserResponse,
            users::UsersResponse,
            // Books
            crate::models::book::Book,
            crate::models::book::BookProfile,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::book::SearchBooks,
            books::BookIdResponse,
            books::BookResponse,
            books::BooksResponse,
            // Categories
            crate::models::book::CategoryMembership,
            crate::models::book::CategoryRequest,
            categories::CategoryResponse,
            categories::CategoryNamesResponse,
            // Bookings
            crate::models::booking::Booking,
            crate::models::booking::BookingStatus,
            crate::models::booking::CreateBooking,
            crate::models::booking::UpdateBooking,
            crate::models::booking::SalesEntry,
            bookings::BookingIdResponse,
            bookings::BookingsResponse,
            bookings::SalesReportResponse,
            // Ratings
            crate::models::rating::Rating,
            crate::models::rating::RateBook,
            ratings::RatingIdResponse,
            ratings::RatingResponse,
            ratings::RatingsResponse,
            // Health
            health::HealthResponse,
            // Common
            crate::api::MessageResponse,
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration and sessions"),
        (name = "users", description = "User profiles"),
        (name = "books", description = "Book catalog"),
        (name = "categories", description = "Book categories"),
        (name = "bookings", description = "Bookings and sales report"),
        (name = "ratings", description = "Ratings and recommendations")
    )
)]
pub struct ApiDoc;

/// Declares the `bearer_auth` scheme referenced by protected paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
