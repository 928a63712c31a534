//! User profile endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::user::{UpdateUser, User},
    validation::{self, rules},
    AppState,
};

use super::{auth::UserIdResponse, Authenticated, CurrentIdentity, JsonBody};

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub message: String,
    pub user: User,
}

#[derive(Serialize, ToSchema)]
pub struct UsersResponse {
    pub message: String,
    pub users: Vec<User>,
}

/// List all users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All users", body = UsersResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Moderators only")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
) -> AppResult<Json<UsersResponse>> {
    session.require_moderator()?;

    let users = state.services.users.list().await?;
    Ok(Json(UsersResponse {
        message: "successfully retrieved users".to_string(),
        users,
    }))
}

/// Profile of the caller
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller profile", body = UserResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_me(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
) -> AppResult<Json<UserResponse>> {
    let user = state.services.users.get_by_id(session.user_id).await?;
    Ok(Json(UserResponse {
        message: "successfully retrieved user".to_string(),
        user,
    }))
}

/// Get a user profile
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 403, description = "Not the user nor a moderator"),
        (status = 404, description = "User not found"),
        (status = 422, description = "Malformed ID")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Path(id): Path<String>,
) -> AppResult<Json<UserResponse>> {
    let id = validation::parse_id(&id)?;
    session.require_owner_or_moderator(id)?;

    let user = state.services.users.get_by_id(id).await?;
    Ok(Json(UserResponse {
        message: "successfully retrieved user".to_string(),
        user,
    }))
}

/// Update a user profile. Usernames cannot be changed.
#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "User ID")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = UserIdResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Username change or not permitted"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already in use"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> AppResult<Json<UserIdResponse>> {
    // Refused before authentication so anonymous callers get 403 too
    UpdateUser::check_shape(&body)?;
    let session = identity.require_authenticated()?;
    let id = validation::parse_id(&id)?;

    let update: UpdateUser = validation::validated(
        &[
            rules::name().optional(),
            rules::email().optional(),
            rules::password().optional(),
            rules::is_moderator().optional(),
        ],
        body,
    )?;

    let id = state.services.users.update(&session, id, update).await?;

    Ok(Json(UserIdResponse {
        message: "user updated successfully".to_string(),
        user: id,
    }))
}
