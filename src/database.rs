// src/database.rs
use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    // bcrypt hash, never sent over the wire
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct DatabaseConfig {
    pub database_path: PathBuf,
    pub pool: Option<SqlitePool>,
}

impl DatabaseConfig {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            database_path,
            pool: None,
        }
    }

    #[cfg(test)]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            database_path: PathBuf::new(),
            pool: Some(pool),
        }
    }

    /// Initialize the database connection pool
    pub async fn init_pool(&mut self) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.database_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create database directory")?;
        }

        let database_url = format!("sqlite:{}?mode=rwc", self.database_path.display());

        let pool = SqlitePool::connect(&database_url)
            .await
            .context("Failed to connect to SQLite database")?;
        self.pool = Some(pool);

        info!("Database connection pool initialized: {}", database_url);
        Ok(())
    }

    /// Get the database pool
    pub fn pool(&self) -> Result<&SqlitePool> {
        self.pool
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Database pool not initialized. Call init_pool() first."))
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        run_migrations(self.pool()?).await
    }
}

/// Create the users schema if it is not there yet
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_users_email
        ON users(email);
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database migrations completed successfully");
    Ok(())
}

pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user with a bcrypt-hashed password
    pub async fn create(&self, name: &str, email: &str, password: &str) -> Result<User> {
        if name.is_empty() || email.is_empty() || password.is_empty() {
            anyhow::bail!("need values for all fields");
        }

        let hashed = hash(password, DEFAULT_COST).context("Password encryption failed")?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, password, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(&hashed)
        .bind(now)
        .execute(self.pool)
        .await?;

        let user = User {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            email: email.to_string(),
            password: hashed,
            created_at: now,
        };

        info!("Created user: {} <{}>", name, email);
        Ok(user)
    }

    /// Find a user by email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password, created_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Look up by email and check the password against the stored hash.
    /// Unknown email and wrong password both come back as None.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.find_by_email(email).await? else {
            return Ok(None);
        };

        if verify(password, &user.password).context("Password verification failed")? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Fetch a user by id
    pub async fn get(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// List all users
    pub async fn list(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password, created_at
            FROM users
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(users)
    }

    /// Update a user, re-hashing the password
    pub async fn update(&self, id: i64, name: &str, email: &str, password: &str) -> Result<bool> {
        let hashed = hash(password, DEFAULT_COST).context("Password encryption failed")?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = ?, email = ?, password = ?
            WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(&hashed)
        .bind(id)
        .execute(self.pool)
        .await?;

        let updated = result.rows_affected() > 0;
        if updated {
            info!("Updated user id {}", id);
        }

        Ok(updated)
    }

    /// Delete a user
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!("Deleted user id {}", id);
        }

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        // A single connection keeps every query on the same in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        run_migrations(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn test_create_and_get_roundtrip() {
        let pool = test_pool().await;
        let repo = UserRepository::new(&pool);

        let created = repo
            .create("demo", "demo@example.com", "hunter2")
            .await
            .unwrap();
        assert!(created.id > 0);
        assert_ne!(created.password, "hunter2");

        let fetched = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "demo");
        assert_eq!(fetched.email, "demo@example.com");
    }

    #[tokio::test]
    async fn test_create_rejects_empty_fields() {
        let pool = test_pool().await;
        let repo = UserRepository::new(&pool);

        assert!(repo.create("", "a@b.c", "pw").await.is_err());
        assert!(repo.create("a", "", "pw").await.is_err());
        assert!(repo.create("a", "a@b.c", "").await.is_err());
    }

    #[tokio::test]
    async fn test_verify_credentials() {
        let pool = test_pool().await;
        let repo = UserRepository::new(&pool);

        repo.create("demo", "demo@example.com", "hunter2")
            .await
            .unwrap();

        let ok = repo
            .verify_credentials("demo@example.com", "hunter2")
            .await
            .unwrap();
        assert!(ok.is_some());

        let wrong_password = repo
            .verify_credentials("demo@example.com", "wrong")
            .await
            .unwrap();
        assert!(wrong_password.is_none());

        let unknown_email = repo
            .verify_credentials("nobody@example.com", "hunter2")
            .await
            .unwrap();
        assert!(unknown_email.is_none());
    }

    #[tokio::test]
    async fn test_update_rehashes_password() {
        let pool = test_pool().await;
        let repo = UserRepository::new(&pool);

        let user = repo
            .create("demo", "demo@example.com", "hunter2")
            .await
            .unwrap();

        let updated = repo
            .update(user.id, "demo", "demo@example.com", "swordfish")
            .await
            .unwrap();
        assert!(updated);

        assert!(repo
            .verify_credentials("demo@example.com", "swordfish")
            .await
            .unwrap()
            .is_some());
        assert!(repo
            .verify_credentials("demo@example.com", "hunter2")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_missing_user_reports_no_rows() {
        let pool = test_pool().await;
        let repo = UserRepository::new(&pool);

        let updated = repo
            .update(42, "ghost", "ghost@example.com", "pw")
            .await
            .unwrap();
        assert!(!updated);
    }

    #[tokio::test]
    async fn test_delete_then_get_none() {
        let pool = test_pool().await;
        let repo = UserRepository::new(&pool);

        let user = repo
            .create("demo", "demo@example.com", "hunter2")
            .await
            .unwrap();

        assert!(repo.delete(user.id).await.unwrap());
        assert!(repo.get(user.id).await.unwrap().is_none());
        assert!(!repo.delete(user.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_orders_by_id() {
        let pool = test_pool().await;
        let repo = UserRepository::new(&pool);

        repo.create("a", "a@example.com", "pw").await.unwrap();
        repo.create("b", "b@example.com", "pw").await.unwrap();

        let users = repo.list().await.unwrap();
        assert_eq!(users.len(), 2);
        assert!(users[0].id < users[1].id);
    }
}
