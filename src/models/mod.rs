//! Data models for Bookshelf

pub mod book;
pub mod booking;
pub mod rating;
pub mod session;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookProfile, CategoryMembership};
pub use booking::{Booking, BookingStatus};
pub use rating::Rating;
pub use session::SessionToken;
pub use user::{Role, User, UserClaims};
