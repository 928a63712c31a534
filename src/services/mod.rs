//! Business logic services

pub mod bookings;
pub mod catalog;
pub mod metadata;
pub mod ratings;
pub mod recommender;
pub mod redis;
pub mod users;

use std::sync::Arc;

use crate::{config::AppConfig, error::AppResult, repository::Repository};

use self::{
    metadata::{GoogleBooksLookup, MetadataLookup},
    recommender::{HttpRecommender, NoopRecommender, Recommender},
    redis::SessionStore,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub catalog: catalog::CatalogService,
    pub bookings: bookings::BookingsService,
    pub ratings: ratings::RatingsService,
    pub sessions: Arc<dyn SessionStore>,
    repository: Repository,
}

impl Services {
    /// Wire all services on top of the repository and the session store
    pub fn new(repository: Repository, config: &AppConfig, sessions: Arc<dyn SessionStore>) -> Self {
        let recommender: Arc<dyn Recommender> = if config.recommender.enabled {
            tracing::info!(url = %config.recommender.url, "recommender enabled");
            Arc::new(HttpRecommender::new(&config.recommender.url))
        } else {
            Arc::new(NoopRecommender)
        };

        let metadata: Option<Arc<dyn MetadataLookup>> = if config.metadata.enabled {
            tracing::info!(url = %config.metadata.url, "metadata lookup enabled");
            Some(Arc::new(GoogleBooksLookup::new(&config.metadata.url)))
        } else {
            None
        };

        let catalog = catalog::CatalogService::new(repository.clone(), metadata);

        Self {
            users: users::UsersService::new(repository.clone(), config.auth.clone(), sessions.clone()),
            bookings: bookings::BookingsService::new(repository.clone(), catalog.clone()),
            ratings: ratings::RatingsService::new(repository.clone(), catalog.clone(), recommender),
            catalog,
            sessions,
            repository,
        }
    }

    /// Check that the database and the session store answer
    pub async fn ready(&self) -> AppResult<()> {
        self.repository.ping().await?;
        self.sessions.ping().await
    }
}
