//! Booking persistence tests
//!
//! Run against a migrated Postgres database with:
//! DATABASE_URL=postgres://... cargo test --test booking_store_tests -- --ignored

use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use bookshelf_server::{
    auth::Session,
    error::AppError,
    models::{
        book::CreateBook,
        booking::{BookingChanges, BookingStatus, UpdateBooking},
        user::{RegisterUser, Role},
    },
    repository::Repository,
    services::{bookings::BookingsService, catalog::CatalogService},
};

async fn repository() -> Repository {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    Repository::new(pool)
}

/// Insert a user, a book and a pending booking of 2 copies
async fn pending_booking(repository: &Repository) -> (Uuid, Uuid) {
    let suffix = Uuid::new_v4().simple().to_string();

    let user_id = repository
        .users
        .create(
            &RegisterUser {
                name: "Store Tester".to_string(),
                username: format!("st{}", &suffix[..12]),
                email: format!("st{}@example.com", &suffix[..12]),
                password: String::new(),
            },
            "hash",
        )
        .await
        .unwrap();

    let book_id = repository
        .books
        .create(&CreateBook {
            title: "Booking Store".to_string(),
            author: "Tester".to_string(),
            isbn: suffix[..10].to_string(),
            details: None,
            image: None,
        })
        .await
        .unwrap();

    let booking_id = repository
        .bookings
        .create(user_id, book_id, 2)
        .await
        .unwrap();

    (user_id, booking_id)
}

#[tokio::test]
#[ignore] // Needs DATABASE_URL
async fn test_conditional_update_skips_terminal_booking() {
    let repository = repository().await;
    let (_, booking_id) = pending_booking(&repository).await;

    let approve = BookingChanges {
        quantity: 2,
        status: BookingStatus::Approved,
    };
    let updated = repository
        .bookings
        .update_if_pending(booking_id, &approve)
        .await
        .unwrap();
    assert_eq!(updated, Some(booking_id));

    // A writer that read the booking while it was still pending
    let stale = BookingChanges {
        quantity: 7,
        status: BookingStatus::Pending,
    };
    let updated = repository
        .bookings
        .update_if_pending(booking_id, &stale)
        .await
        .unwrap();
    assert_eq!(updated, None);

    let booking = repository.bookings.get_by_id(booking_id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Approved);
    assert_eq!(booking.quantity, 2);
}

#[tokio::test]
#[ignore] // Needs DATABASE_URL
async fn test_approved_booking_rejects_owner_quantity_change() {
    let repository = repository().await;
    let (user_id, booking_id) = pending_booking(&repository).await;

    let catalog = CatalogService::new(repository.clone(), None);
    let bookings = BookingsService::new(repository.clone(), catalog);

    let owner = Session {
        user_id,
        role: Role::User,
        session_id: Uuid::new_v4(),
    };
    let moderator = Session {
        user_id: Uuid::new_v4(),
        role: Role::Moderator,
        session_id: Uuid::new_v4(),
    };

    bookings
        .update(
            &moderator,
            booking_id,
            UpdateBooking {
                status: Some(BookingStatus::Approved),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let result = bookings
        .update(
            &owner,
            booking_id,
            UpdateBooking {
                quantity: Some(5),
                ..Default::default()
            },
        )
        .await;
    match result {
        Err(AppError::Authorization(msg)) => assert_eq!(msg, "booking is already approved"),
        other => panic!("expected forbidden, got {:?}", other),
    }

    let result = bookings
        .update(
            &moderator,
            booking_id,
            UpdateBooking {
                status: Some(BookingStatus::Cancelled),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::Authorization(_))));

    let booking = repository.bookings.get_by_id(booking_id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Approved);
    assert_eq!(booking.quantity, 2);
}
