//! API handlers for the Bookshelf REST endpoints

pub mod auth;
pub mod bookings;
pub mod books;
pub mod categories;
pub mod health;
pub mod openapi;
pub mod ratings;
pub mod users;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::{
    auth::{resolve_identity, Identity, Session},
    error::{AppError, AppResult},
    AppState,
};

/// Identity of the caller, anonymous or not
pub struct CurrentIdentity(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for CurrentIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let bearer = TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .ok();
        let token = bearer.as_ref().map(|TypedHeader(auth)| auth.token());

        let identity = resolve_identity(
            token,
            state.services.sessions.as_ref(),
            &state.config.auth,
        )
        .await?;

        Ok(CurrentIdentity(identity))
    }
}

/// Session of a logged-in caller; rejects anonymous requests with 401
pub struct Authenticated(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentIdentity(identity) = CurrentIdentity::from_request_parts(parts, state).await?;
        identity.require_authenticated().map(Authenticated)
    }
}

/// Rejects logged-in callers with 403
pub struct Anonymous;

#[async_trait]
impl FromRequestParts<AppState> for Anonymous {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentIdentity(identity) = CurrentIdentity::from_request_parts(parts, state).await?;
        identity.require_anonymous().map(|_| Anonymous)
    }
}

/// Raw JSON request body, validated later by the handler's rule table.
/// Unreadable bodies are rejected with a `{ message }` 400.
pub struct JsonBody(pub Value);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(JsonBody(value))
    }
}

/// Body of responses that carry nothing but a message
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

/// Fallback for unmatched routes
pub async fn route_not_found() -> AppResult<()> {
    Err(AppError::NotFound("route not found".to_string()))
}
