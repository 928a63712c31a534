//! User model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Role resolved once at login and carried in the session claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Moderator,
    /// The single account whose email matches the configured admin address
    Admin,
}

impl Role {
    /// Resolve the role of `user` against the configured admin address
    pub fn resolve(user: &User, admin_email: &str) -> Self {
        if user.email.eq_ignore_ascii_case(admin_email) {
            Role::Admin
        } else if user.is_moderator {
            Role::Moderator
        } else {
            Role::User
        }
    }

    /// Admins are implicitly moderators
    pub fn is_moderator(&self) -> bool {
        matches!(self, Role::Moderator | Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User record from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(rename = "isModerator")]
    pub is_moderator: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Registration request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Profile update request. Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "isModerator")]
    pub is_moderator: Option<bool>,
}

impl UpdateUser {
    /// Usernames are permanent; any body naming one is refused.
    pub fn check_shape(body: &serde_json::Value) -> AppResult<()> {
        if body.get("username").is_some() {
            return Err(AppError::Authorization(
                "username cannot be changed".to_string(),
            ));
        }
        Ok(())
    }
}

/// Values actually written by a profile update
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub name: String,
    pub email: String,
    pub password: String,
    pub is_moderator: bool,
}

impl UserChanges {
    /// Merge an update onto the stored user; `password_hash` replaces the hash when set
    pub fn merge(current: &User, update: &UpdateUser, password_hash: Option<String>) -> Self {
        Self {
            name: update.name.clone().unwrap_or_else(|| current.name.clone()),
            email: update.email.clone().unwrap_or_else(|| current.email.clone()),
            password: password_hash.unwrap_or_else(|| current.password.clone()),
            is_moderator: update.is_moderator.unwrap_or(current.is_moderator),
        }
    }
}

/// JWT claims for a login session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: Uuid,
    pub role: Role,
    /// Session identifier in the session store
    pub jti: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse and verify a JWT token; expired tokens are rejected
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let mut validation = Validation::default();
        validation.leeway = 0;
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )?;
        Ok(token_data.claims)
    }
}
