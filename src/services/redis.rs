//! Redis-backed store for login sessions

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::SessionToken,
};

/// Storage for active login sessions, keyed by session id
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a session that expires after `ttl_seconds`
    async fn save(&self, session: &SessionToken, ttl_seconds: u64) -> AppResult<()>;

    /// Fetch a session, `None` once deleted or expired
    async fn load(&self, id: Uuid) -> AppResult<Option<SessionToken>>;

    /// Delete a session
    async fn remove(&self, id: Uuid) -> AppResult<()>;

    /// Round-trip to the backing store
    async fn ping(&self) -> AppResult<()>;
}

#[derive(Clone)]
pub struct RedisService {
    conn: ConnectionManager,
}

fn session_key(id: Uuid) -> String {
    format!("session:{}", id)
}

fn redis_error(action: &str, e: redis::RedisError) -> AppError {
    AppError::Internal(format!("Failed to {} in Redis: {}", action, e))
}

impl RedisService {
    /// Connect to Redis and check the connection
    pub async fn new(url: &str) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        let service = Self { conn };
        service.ping().await?;
        Ok(service)
    }
}

#[async_trait]
impl SessionStore for RedisService {
    async fn save(&self, session: &SessionToken, ttl_seconds: u64) -> AppResult<()> {
        let payload = serde_json::to_string(session)
            .map_err(|e| AppError::Internal(format!("Failed to serialize session: {}", e)))?;

        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(session_key(session.id), payload, ttl_seconds)
            .await
            .map_err(|e| redis_error("store session", e))
    }

    async fn load(&self, id: Uuid) -> AppResult<Option<SessionToken>> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn
            .get(session_key(id))
            .await
            .map_err(|e| redis_error("read session", e))?;

        match payload {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| AppError::Internal(format!("Corrupted session {}: {}", id, e))),
            None => Ok(None),
        }
    }

    async fn remove(&self, id: Uuid) -> AppResult<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(session_key(id))
            .await
            .map_err(|e| redis_error("delete session", e))
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;
        Ok(())
    }
}
