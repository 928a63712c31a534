//! Registration, login and logout endpoints

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::user::RegisterUser,
    validation::{self, rules, FieldRule},
    AppState,
};

use super::{Anonymous, Authenticated, JsonBody, MessageResponse};

/// Login request
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    /// Bearer token to send in the `Authorization` header
    pub token: String,
}

/// Response carrying the id of the created or updated user
#[derive(Serialize, ToSchema)]
pub struct UserIdResponse {
    pub message: String,
    pub user: Uuid,
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/register",
    tag = "auth",
    request_body = RegisterUser,
    responses(
        (status = 200, description = "User registered", body = UserIdResponse),
        (status = 403, description = "Already logged in"),
        (status = 409, description = "Username or email already in use"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    _: Anonymous,
    JsonBody(body): JsonBody,
) -> AppResult<Json<UserIdResponse>> {
    let user: RegisterUser = validation::validated(
        &[rules::name(), rules::username(), rules::email(), rules::password()],
        body,
    )?;

    let id = state.services.users.register(user).await?;

    Ok(Json(UserIdResponse {
        message: "user registered successfully".to_string(),
        user: id,
    }))
}

/// Log in with username and password
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Incorrect password"),
        (status = 403, description = "Already logged in"),
        (status = 404, description = "Unknown username"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    _: Anonymous,
    JsonBody(body): JsonBody,
) -> AppResult<Json<LoginResponse>> {
    let request: LoginRequest = validation::validated(
        &[
            FieldRule::body("username").exists().not_empty().trim(),
            FieldRule::body("password").exists().not_empty(),
        ],
        body,
    )?;

    let token = state
        .services
        .users
        .login(&request.username, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        message: "Logged In".to_string(),
        token,
    }))
}

/// Close the current session
#[utoipa::path(
    post,
    path = "/logout",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
) -> AppResult<Json<MessageResponse>> {
    state.services.users.logout(&session).await?;
    Ok(MessageResponse::new("Logged Out"))
}
