//! Request identity and authorization guards

use uuid::Uuid;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{booking::Actor, Role, UserClaims},
    services::redis::SessionStore,
};

/// An authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub role: Role,
    /// Session store key, used by logout
    pub session_id: Uuid,
}

/// Who is calling, resolved once per request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    Authenticated(Session),
}

impl Identity {
    pub fn session(&self) -> Option<&Session> {
        match self {
            Identity::Authenticated(session) => Some(session),
            Identity::Anonymous => None,
        }
    }

    pub fn require_authenticated(self) -> AppResult<Session> {
        match self {
            Identity::Authenticated(session) => Ok(session),
            Identity::Anonymous => Err(AppError::Authentication("user not logged in".to_string())),
        }
    }

    pub fn require_anonymous(&self) -> AppResult<()> {
        match self {
            Identity::Anonymous => Ok(()),
            Identity::Authenticated(_) => Err(AppError::Authorization(
                "user already logged in".to_string(),
            )),
        }
    }
}

impl Session {
    pub fn is_moderator(&self) -> bool {
        self.role.is_moderator()
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn require_moderator(&self) -> AppResult<()> {
        if self.is_moderator() {
            Ok(())
        } else {
            Err(AppError::forbidden())
        }
    }

    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden())
        }
    }

    pub fn require_owner_or_moderator(&self, owner_id: Uuid) -> AppResult<()> {
        if self.user_id == owner_id || self.is_moderator() {
            Ok(())
        } else {
            Err(AppError::forbidden())
        }
    }

    /// View of this caller for the booking rules
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user_id,
            is_moderator: self.is_moderator(),
        }
    }
}

/// Turn an optional bearer token into an [`Identity`].
///
/// Tokens that fail verification, or whose session was deleted or has
/// expired, resolve to `Anonymous`. Only a session store failure is an error.
/// The token `exp` bounds the session; the store TTL matches it and is never
/// extended.
pub async fn resolve_identity(
    token: Option<&str>,
    store: &dyn SessionStore,
    auth: &AuthConfig,
) -> AppResult<Identity> {
    let Some(token) = token else {
        return Ok(Identity::Anonymous);
    };

    let claims = match UserClaims::from_token(token, &auth.jwt_secret) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("rejected bearer token: {}", e);
            return Ok(Identity::Anonymous);
        }
    };

    let stored = match store.load(claims.jti).await? {
        Some(stored) if stored.token == token && stored.user_id == claims.user_id => stored,
        _ => {
            tracing::debug!(session_id = %claims.jti, "no active session for token");
            return Ok(Identity::Anonymous);
        }
    };

    Ok(Identity::Authenticated(Session {
        user_id: claims.user_id,
        role: claims.role,
        session_id: stored.id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::SessionToken, services::redis::MockSessionStore};
    use chrono::{Duration, Utc};
    use mockall::predicate::eq;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".to_string(),
            token_ttl_minutes: 60,
            admin_email: "admin@x.com".to_string(),
        }
    }

    fn issue(role: Role, exp_offset: i64) -> (UserClaims, String) {
        let now = Utc::now().timestamp();
        let claims = UserClaims {
            sub: "alice".to_string(),
            user_id: Uuid::new_v4(),
            role,
            jti: Uuid::new_v4(),
            exp: now + exp_offset,
            iat: now,
        };
        let token = claims.create_token("test-secret").unwrap();
        (claims, token)
    }

    fn stored(claims: &UserClaims, token: &str) -> SessionToken {
        SessionToken {
            id: claims.jti,
            user_id: claims.user_id,
            token: token.to_string(),
            created_at: Utc::now(),
            expires_at: Utc::now() + Duration::minutes(60),
        }
    }

    #[tokio::test]
    async fn test_no_token_is_anonymous() {
        let store = MockSessionStore::new();
        let identity = tokio_test::assert_ok!(resolve_identity(None, &store, &config()).await);
        assert_eq!(identity, Identity::Anonymous);
    }

    #[tokio::test]
    async fn test_invalid_or_expired_token_is_anonymous() {
        let store = MockSessionStore::new();

        let identity = resolve_identity(Some("not-a-jwt"), &store, &config()).await.unwrap();
        assert_eq!(identity, Identity::Anonymous);

        let (_, expired) = issue(Role::User, -30);
        let identity = resolve_identity(Some(&expired), &store, &config()).await.unwrap();
        assert_eq!(identity, Identity::Anonymous);
    }

    #[tokio::test]
    async fn test_logged_out_session_is_anonymous() {
        let (claims, token) = issue(Role::User, 600);
        let mut store = MockSessionStore::new();
        store
            .expect_load()
            .with(eq(claims.jti))
            .times(1)
            .returning(|_| Ok(None));

        let identity = resolve_identity(Some(&token), &store, &config()).await.unwrap();
        assert_eq!(identity, Identity::Anonymous);
    }

    #[tokio::test]
    async fn test_mismatched_stored_token_is_anonymous() {
        let (claims, token) = issue(Role::User, 600);
        let other = stored(&claims, "another-token");
        let mut store = MockSessionStore::new();
        store.expect_load().returning(move |_| Ok(Some(other.clone())));

        let identity = resolve_identity(Some(&token), &store, &config()).await.unwrap();
        assert_eq!(identity, Identity::Anonymous);
    }

    #[tokio::test]
    async fn test_active_session_is_authenticated() {
        let (claims, token) = issue(Role::Moderator, 600);
        let session = stored(&claims, &token);
        let mut store = MockSessionStore::new();
        store
            .expect_load()
            .with(eq(claims.jti))
            .times(1)
            .returning(move |_| Ok(Some(session.clone())));

        let identity = resolve_identity(Some(&token), &store, &config()).await.unwrap();
        let session = identity.require_authenticated().unwrap();
        assert_eq!(session.user_id, claims.user_id);
        assert_eq!(session.session_id, claims.jti);
        assert!(session.is_moderator());
        assert!(!session.is_admin());
    }

    #[tokio::test]
    async fn test_expired_token_with_live_session_is_anonymous() {
        let (claims, token) = issue(Role::User, -30);
        let session = stored(&claims, &token);
        let mut store = MockSessionStore::new();
        store
            .expect_load()
            .times(0)
            .returning(move |_| Ok(Some(session.clone())));

        let identity = resolve_identity(Some(&token), &store, &config()).await.unwrap();
        assert_eq!(identity, Identity::Anonymous);
    }

    #[tokio::test]
    async fn test_store_failure_is_internal_error() {
        let (_, token) = issue(Role::User, 600);
        let mut store = MockSessionStore::new();
        store
            .expect_load()
            .returning(|_| Err(AppError::Internal("connection refused".to_string())));

        let result = resolve_identity(Some(&token), &store, &config()).await;
        assert!(matches!(tokio_test::assert_err!(result), AppError::Internal(_)));
    }

    #[test]
    fn test_guards() {
        let owner = Uuid::new_v4();
        let user = Session {
            user_id: owner,
            role: Role::User,
            session_id: Uuid::new_v4(),
        };
        let moderator = Session {
            role: Role::Moderator,
            user_id: Uuid::new_v4(),
            ..user
        };
        let admin = Session {
            role: Role::Admin,
            ..moderator
        };

        assert!(user.require_owner_or_moderator(owner).is_ok());
        assert!(user.require_owner_or_moderator(Uuid::new_v4()).is_err());
        assert!(moderator.require_owner_or_moderator(owner).is_ok());
        assert!(user.require_moderator().is_err());
        assert!(admin.require_moderator().is_ok());
        assert!(moderator.require_admin().is_err());
        assert!(admin.require_admin().is_ok());

        assert!(Identity::Anonymous.require_anonymous().is_ok());
        assert!(Identity::Authenticated(user).require_anonymous().is_err());
        assert!(matches!(
            Identity::Anonymous.require_authenticated(),
            Err(AppError::Authentication(_))
        ));
    }
}
