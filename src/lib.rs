//! Bookshelf Server
//!
//! REST JSON API for a book catalog: user accounts and login sessions,
//! books and categories, a booking workflow with moderation, ratings feeding
//! a recommendation engine, and sales reporting.

use std::sync::Arc;

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod validation;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
