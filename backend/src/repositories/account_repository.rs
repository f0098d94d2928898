//! Database repository for account credentials and refresh tokens.
//!
//! Each account owns a single refresh-token slot. Rotation is a
//! compare-and-swap on the current value so that a consumed token can never
//! be presented twice.

use crate::database::models::{Account, AccountKind, CreateAccount};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

const ACCOUNT_COLUMNS: &str = "id, kind, login, password_hash, refresh_token, \
     refresh_token_expires_at, created_at, updated_at";

/// Repository for account database operations.
pub struct AccountRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> AccountRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a new account together with its first refresh token.
    ///
    /// Fails with a unique-constraint violation when the login is already
    /// taken within the account kind; see [`is_unique_violation`].
    pub async fn create_account(&self, account: CreateAccount) -> Result<Account> {
        let now = Utc::now();
        let account = sqlx::query_as::<_, Account>(&format!(
            "INSERT INTO accounts
             (id, kind, login, password_hash, refresh_token, refresh_token_expires_at, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(&account.id)
        .bind(account.kind)
        .bind(&account.login)
        .bind(&account.password_hash)
        .bind(&account.refresh_token)
        .bind(account.refresh_token_expires_at)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(account)
    }

    /// Retrieves an account by its login within one kind.
    ///
    /// # Returns
    /// `Some(Account)` if found, `None` otherwise
    pub async fn get_account_by_login(
        &self,
        kind: AccountKind,
        login: &str,
    ) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE kind = ? AND login = ?"
        ))
        .bind(kind)
        .bind(login)
        .fetch_optional(self.pool)
        .await?;

        Ok(account)
    }

    /// Retrieves the account currently holding the given refresh token.
    pub async fn get_account_by_refresh_token(
        &self,
        kind: AccountKind,
        refresh_token: &str,
    ) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE kind = ? AND refresh_token = ?"
        ))
        .bind(kind)
        .bind(refresh_token)
        .fetch_optional(self.pool)
        .await?;

        Ok(account)
    }

    /// Replaces whatever refresh token the account holds.
    pub async fn set_refresh_token(
        &self,
        account_id: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE accounts
             SET refresh_token = ?, refresh_token_expires_at = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(refresh_token)
        .bind(expires_at)
        .bind(Utc::now())
        .bind(account_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Swaps `old_token` for `new_token` only if `old_token` is still current.
    ///
    /// # Returns
    /// `true` if the swap happened, `false` if another caller consumed the
    /// token first
    pub async fn rotate_refresh_token(
        &self,
        account_id: &str,
        old_token: &str,
        new_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE accounts
             SET refresh_token = ?, refresh_token_expires_at = ?, updated_at = ?
             WHERE id = ? AND refresh_token = ?",
        )
        .bind(new_token)
        .bind(expires_at)
        .bind(Utc::now())
        .bind(account_id)
        .bind(old_token)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Stores a new password hash and a fresh refresh token in one statement.
    pub async fn update_password(
        &self,
        account_id: &str,
        password_hash: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE accounts
             SET password_hash = ?, refresh_token = ?, refresh_token_expires_at = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(password_hash)
        .bind(refresh_token)
        .bind(expires_at)
        .bind(Utc::now())
        .bind(account_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Checks if a login already exists within one kind.
    pub async fn login_exists(&self, kind: AccountKind, login: &str) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE kind = ? AND login = ?")
                .bind(kind)
                .bind(login)
                .fetch_one(self.pool)
                .await?;

        Ok(count > 0)
    }
}

/// Tells whether a repository error came from a UNIQUE constraint.
pub fn is_unique_violation(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|e| e.is_unique_violation())
}
