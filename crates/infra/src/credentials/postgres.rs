//! Postgres-backed credential store.
//!
//! Accounts live in a single `users` table. Username and email uniqueness is
//! enforced by the database, so concurrent sign-ups racing on the same name
//! resolve to exactly one insert and one [`StoreError::Conflict`].

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Row};
use tracing::{Span, info, instrument};
use uuid::Uuid;

use custody_auth::{
    CredentialStore, StoreError, UniqueField, User, UserStatus, parse_role_labels, role_labels,
};
use custody_core::UserId;

const USERNAME_CONSTRAINT: &str = "users_username_key";
const EMAIL_CONSTRAINT: &str = "users_email_key";

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id              UUID PRIMARY KEY,
        username        TEXT NOT NULL,
        email           TEXT NOT NULL,
        password_hash   TEXT NOT NULL,
        roles           TEXT[] NOT NULL DEFAULT '{}',
        status          TEXT NOT NULL DEFAULT 'ACTIVE',
        registered_at   TIMESTAMPTZ NOT NULL,
        last_login_at   TIMESTAMPTZ NOT NULL,
        CONSTRAINT users_username_key UNIQUE (username),
        CONSTRAINT users_email_key UNIQUE (email)
    )
"#;

const SELECT_COLUMNS: &str =
    "id, username, email, password_hash, roles, status, registered_at, last_login_at";

/// Credential store over a Postgres connection pool.
#[derive(Debug, Clone)]
pub struct PostgresCredentialStore {
    pool: Arc<PgPool>,
}

impl PostgresCredentialStore {
    /// Wrap an existing pool. The schema is not touched.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        info!("credential store connected");
        Ok(Self::new(pool))
    }

    /// Create the `users` table if it does not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_id", e))?;
        row.map(|row| user_from_row("find_by_id", &row)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM users WHERE username = $1");
        let row = sqlx::query(&sql)
            .bind(username)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_username", e))?;
        row.map(|row| user_from_row("find_by_username", &row))
            .transpose()
    }

    #[instrument(skip(self), err)]
    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1) AS found")
            .bind(username)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("exists_by_username", e))?;
        row.try_get("found")
            .map_err(|e| map_sqlx_error("exists_by_username", e))
    }

    #[instrument(skip(self), err)]
    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1) AS found")
            .bind(email)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("exists_by_email", e))?;
        row.try_get("found")
            .map_err(|e| map_sqlx_error("exists_by_email", e))
    }

    #[instrument(skip(self), err)]
    async fn count(&self) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM users")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count", e))?;
        let total: i64 = row
            .try_get("total")
            .map_err(|e| map_sqlx_error("count", e))?;
        u64::try_from(total).map_err(|_| StoreError::Backend(format!("negative count {total}")))
    }

    #[instrument(skip(self), fields(user_count), err)]
    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM users ORDER BY registered_at ASC, id ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list", e))?;

        let users = rows
            .iter()
            .map(|row| user_from_row("list", row))
            .collect::<Result<Vec<_>, _>>()?;

        Span::current().record("user_count", users.len());
        Ok(users)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id, username = %user.username), err)]
    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, email, password_hash, roles, status, registered_at, last_login_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(*user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(role_labels(&user.roles))
        .bind(user.status.as_str())
        .bind(user.registered_at)
        .bind(user.last_login_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert", e))?;
        Ok(())
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn save(&self, user: &User) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = $2,
                email = $3,
                password_hash = $4,
                roles = $5,
                status = $6,
                last_login_at = $7
            WHERE id = $1
            "#,
        )
        .bind(*user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(role_labels(&user.roles))
        .bind(user.status.as_str())
        .bind(user.last_login_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("save", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Missing(user.id));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET last_login_at = $2 WHERE id = $1")
            .bind(*id.as_uuid())
            .bind(at)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("record_login", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Missing(id));
        }
        Ok(())
    }
}

struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    roles: Vec<String>,
    status: String,
    registered_at: DateTime<Utc>,
    last_login_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            roles: row.try_get("roles")?,
            status: row.try_get("status")?,
            registered_at: row.try_get("registered_at")?,
            last_login_at: row.try_get("last_login_at")?,
        })
    }
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let roles = parse_role_labels(&row.roles)
            .map_err(|e| StoreError::Backend(format!("corrupt roles for {}: {e}", row.id)))?;
        let status = UserStatus::from_str(&row.status)
            .map_err(|e| StoreError::Backend(format!("corrupt status for {}: {e}", row.id)))?;

        Ok(User {
            id: UserId::from_uuid(row.id),
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            roles,
            status,
            registered_at: row.registered_at,
            last_login_at: row.last_login_at,
        })
    }
}

fn user_from_row(operation: &'static str, row: &PgRow) -> Result<User, StoreError> {
    let row = UserRow::from_row(row).map_err(|e| map_sqlx_error(operation, e))?;
    User::try_from(row)
}

/// Map SQLx errors onto store errors.
///
/// Unique violations become [`StoreError::Conflict`], keyed by the violated
/// constraint name.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            match db_err.constraint() {
                Some(USERNAME_CONSTRAINT) => StoreError::Conflict(UniqueField::Username),
                Some(EMAIL_CONSTRAINT) => StoreError::Conflict(UniqueField::Email),
                _ => StoreError::Backend(format!("unique violation in {operation}: {err}")),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}
