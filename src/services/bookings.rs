//! Booking lifecycle and sales reporting

use uuid::Uuid;

use crate::{
    auth::Session,
    error::{AppError, AppResult},
    models::booking::{Booking, BookingStatus, CreateBooking, SalesEntry, SalesReportQuery, UpdateBooking},
    repository::Repository,
    services::catalog::CatalogService,
};

#[derive(Clone)]
pub struct BookingsService {
    repository: Repository,
    catalog: CatalogService,
}

impl BookingsService {
    pub fn new(repository: Repository, catalog: CatalogService) -> Self {
        Self {
            repository,
            catalog,
        }
    }

    /// Book `quantity` copies for the caller. New bookings are always pending.
    pub async fn create(&self, caller: &Session, book_id: Uuid, booking: CreateBooking) -> AppResult<Uuid> {
        self.catalog.ensure_exists(book_id).await?;

        let id = self
            .repository
            .bookings
            .create(caller.user_id, book_id, booking.quantity)
            .await?;

        tracing::info!(booking_id = %id, %book_id, user_id = %caller.user_id, "booking created");
        Ok(id)
    }

    /// Change the quantity or the status of a pending booking
    pub async fn update(&self, caller: &Session, id: Uuid, update: UpdateBooking) -> AppResult<Uuid> {
        let booking = self.repository.bookings.get_by_id(id).await?;
        let changes = booking.plan_update(caller.actor(), &update)?;

        match self.repository.bookings.update_if_pending(id, &changes).await? {
            Some(id) => {
                tracing::info!(booking_id = %id, status = %changes.status, "booking updated");
                Ok(id)
            }
            None => {
                // Lost a race against another update
                let current = self.repository.bookings.get_by_id(id).await?;
                Err(AppError::Authorization(format!(
                    "booking is already {}",
                    current.status
                )))
            }
        }
    }

    pub async fn list_all(&self, caller: &Session) -> AppResult<Vec<Booking>> {
        caller.require_moderator()?;
        self.repository.bookings.list_all().await
    }

    pub async fn list_by_status(&self, caller: &Session, status: BookingStatus) -> AppResult<Vec<Booking>> {
        caller.require_moderator()?;
        self.repository.bookings.list_by_status(status).await
    }

    pub async fn list_by_user(&self, caller: &Session, user_id: Uuid) -> AppResult<Vec<Booking>> {
        caller.require_owner_or_moderator(user_id)?;
        self.repository.bookings.list_by_user(user_id).await
    }

    /// Bookings of a book: all of them for moderators, the caller's own otherwise
    pub async fn list_by_book(&self, caller: &Session, book_id: Uuid) -> AppResult<Vec<Booking>> {
        self.catalog.ensure_exists(book_id).await?;
        let owner = (!caller.is_moderator()).then_some(caller.user_id);
        self.repository.bookings.list_by_book(book_id, owner).await
    }

    /// The caller's own bookings of a book
    pub async fn list_mine_by_book(&self, caller: &Session, book_id: Uuid) -> AppResult<Vec<Booking>> {
        self.catalog.ensure_exists(book_id).await?;
        self.repository
            .bookings
            .list_by_book(book_id, Some(caller.user_id))
            .await
    }

    /// Booked quantities per book over a creation window, largest first
    pub async fn sales_report(&self, caller: &Session, query: &SalesReportQuery) -> AppResult<Vec<SalesEntry>> {
        caller.require_admin()?;
        let (start, end) = query.range()?;

        let totals = self.repository.bookings.sales_totals(start, end).await?;

        let mut entries = Vec::with_capacity(totals.len());
        for total in totals {
            entries.push(SalesEntry {
                book: self.catalog.get(total.book_id).await?,
                count: total.count,
            });
        }

        Ok(entries)
    }
}
