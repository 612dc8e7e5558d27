//! User records and session tokens
//!
//! Users live in a single `users` table with plaintext passwords. A user has
//! at most one active session: logging in while a session is active is
//! rejected until the user logs out, or until the session outlives the
//! optional TTL.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Row of the `users` table
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub session_token: Option<String>,
    pub session_created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Whether the user holds a session that still blocks a new login
    fn has_active_session(&self, now: DateTime<Utc>, ttl: Option<Duration>) -> bool {
        match (&self.session_token, self.session_created_at, ttl) {
            (None, _, _) => false,
            (Some(_), Some(created), Some(ttl)) => now - created < ttl,
            (Some(_), _, _) => true,
        }
    }
}

/// Issued session, returned by a successful login
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub username: String,
    pub token: String,
}

/// SQLite-backed user store
#[derive(Debug, Clone)]
pub struct UserStore {
    pool: SqlitePool,
    session_ttl: Option<Duration>,
}

impl UserStore {
    /// Connect to the database and create the users table if needed
    pub async fn connect(database_url: &str, session_ttl: Option<Duration>) -> Result<Self> {
        info!("Connecting to database: {}", database_url);

        // An in-memory database exists per connection, so it must not be pooled wider
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        let store = Self { pool, session_ttl };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                session_token TEXT,
                session_created_at TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_users_session_token ON users(session_token)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, session_token, session_created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Insert a new user
    pub async fn create_user(&self, username: &str, password: &str) -> Result<i64> {
        let result = sqlx::query("INSERT INTO users (username, password) VALUES (?, ?)")
            .bind(username)
            .bind(password)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => {
                info!(username, "user created");
                Ok(done.last_insert_rowid())
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(Error::UserExists(username.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check credentials and issue a new session token
    ///
    /// The token is stored with a conditional update that only succeeds if
    /// the session seen during the check is still the current one, so two
    /// concurrent logins for the same user cannot both succeed.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let user = match self.find_by_username(username).await? {
            Some(user) if user.password == password => user,
            _ => {
                warn!(username, "login rejected");
                return Err(Error::InvalidCredentials);
            }
        };

        let now = Utc::now();
        if user.has_active_session(now, self.session_ttl) {
            return Err(Error::AlreadyLoggedIn(user.username));
        }

        let token = Uuid::new_v4().simple().to_string();
        let updated = sqlx::query(
            r#"
            UPDATE users
            SET session_token = ?, session_created_at = ?
            WHERE id = ? AND session_token IS ?
            "#,
        )
        .bind(&token)
        .bind(now)
        .bind(user.id)
        .bind(&user.session_token)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(Error::AlreadyLoggedIn(user.username));
        }

        info!(username = %user.username, "session issued");
        Ok(Session { username: user.username, token })
    }

    /// Invalidate a session token, returning the user it belonged to
    pub async fn logout(&self, token: &str) -> Result<String> {
        let username: Option<String> = sqlx::query_scalar(
            r#"
            UPDATE users
            SET session_token = NULL, session_created_at = NULL
            WHERE session_token = ?
            RETURNING username
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        let username = username.ok_or(Error::UnknownSession)?;
        info!(username = %username, "session closed");
        Ok(username)
    }
}
