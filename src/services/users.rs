//! Registration, login sessions and user profiles

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    auth::Session,
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        user::{RegisterUser, Role, UpdateUser, User, UserChanges, UserClaims},
        SessionToken,
    },
    repository::Repository,
    services::redis::SessionStore,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
    sessions: Arc<dyn SessionStore>,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            repository,
            config,
            sessions,
        }
    }

    /// Create an account. Nothing is written when the username or the
    /// email is taken.
    pub async fn register(&self, user: RegisterUser) -> AppResult<Uuid> {
        if self.repository.users.username_exists(&user.username).await? {
            return Err(AppError::Conflict("username already in use".to_string()));
        }
        if self.repository.users.email_exists(&user.email, None).await? {
            return Err(AppError::Conflict("email already in use".to_string()));
        }

        let hash = hash_password(&user.password)?;
        let id = self.repository.users.create(&user, &hash).await?;

        tracing::info!(user_id = %id, username = %user.username, "user registered");
        Ok(id)
    }

    /// Check credentials, open a session and return its bearer token
    pub async fn login(&self, username: &str, password: &str) -> AppResult<String> {
        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound("user does not exist".to_string()))?;

        if !verify_password(&user.password, password)? {
            return Err(AppError::Authentication("incorrect password".to_string()));
        }

        let role = Role::resolve(&user, &self.config.admin_email);
        let ttl = Duration::minutes(self.config.token_ttl_minutes as i64);
        let now = Utc::now();
        let expires_at = now + ttl;

        let claims = UserClaims {
            sub: user.username.clone(),
            user_id: user.id,
            role,
            jti: Uuid::new_v4(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        let session = SessionToken {
            id: claims.jti,
            user_id: user.id,
            token: token.clone(),
            created_at: now,
            expires_at,
        };
        self.sessions
            .save(&session, self.config.token_ttl_minutes * 60)
            .await?;

        tracing::info!(user_id = %user.id, role = %role, "user logged in");
        Ok(token)
    }

    /// Close the caller's session
    pub async fn logout(&self, session: &Session) -> AppResult<()> {
        self.sessions.remove(session.session_id).await?;
        tracing::info!(user_id = %session.user_id, "user logged out");
        Ok(())
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        self.repository.users.list().await
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Apply a profile update on behalf of `caller`
    pub async fn update(&self, caller: &Session, id: Uuid, update: UpdateUser) -> AppResult<Uuid> {
        caller.require_owner_or_moderator(id)?;

        if update.is_moderator.is_some() && !caller.is_admin() {
            return Err(AppError::Authorization(
                "only the administrator can change moderator status".to_string(),
            ));
        }

        let current = self.repository.users.get_by_id(id).await?;

        if let Some(ref email) = update.email {
            if self.repository.users.email_exists(email, Some(id)).await? {
                return Err(AppError::Conflict("email already in use".to_string()));
            }
        }

        let hash = update.password.as_deref().map(hash_password).transpose()?;
        let changes = UserChanges::merge(&current, &update, hash);

        self.repository.users.update(id, &changes).await
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Check a password against a stored Argon2 hash
pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
