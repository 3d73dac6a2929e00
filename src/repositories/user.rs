use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::{error::SqlState, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::user::{NewUser, User},
};

/// Lookup and creation of user records. The relational store behind it is
/// an external collaborator of the session layer.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Finds a user by their ID.
    async fn find_by_id(&self, user_id: &Uuid) -> Result<Option<User>>;

    /// Finds a user by their normalized email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Inserts a user. A duplicate email yields [`AppError::Conflict`].
    async fn create(&self, new_user: NewUser) -> Result<User>;
}

/// A helper function to map a `tokio_postgres::Row` to a `User`.
fn row_to_user(row: &Row) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        password: row.try_get("password")?,
        role: row.try_get("role")?,
        image_url: row.try_get("image_url")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

const USER_COLUMNS: &str =
    "id, full_name, email, password, role, image_url, created_at, updated_at";

/// `UserStore` backed by PostgreSQL.
#[derive(Clone)]
pub struct PgUserStore {
    pool: Pool,
}

impl PgUserStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, user_id: &Uuid) -> Result<Option<User>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                &format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS),
                &[user_id],
            )
            .await?;
        row.map(|r| row_to_user(&r)).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                &format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS),
                &[&email],
            )
            .await?;
        row.map(|r| row_to_user(&r)).transpose()
    }

    async fn create(&self, new_user: NewUser) -> Result<User> {
        let client = self.pool.get().await?;
        let id = Uuid::new_v4();
        let row = client
            .query_one(
                &format!(
                    r#"
                    INSERT INTO users (id, full_name, email, password, role)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING {}
                    "#,
                    USER_COLUMNS
                ),
                &[
                    &id,
                    &new_user.full_name,
                    &new_user.email,
                    &new_user.password_hash,
                    &new_user.role,
                ],
            )
            .await
            .map_err(|e| {
                if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                    AppError::Conflict("Email already exists".to_string())
                } else {
                    AppError::Database(e)
                }
            })?;
        row_to_user(&row)
    }
}
