use super::Database;
use crate::models::User;
use anyhow::{anyhow, Result};
use sqlx::Row;

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        username: row.get("username"),
        password: row.get("password"),
        role: row.get("role"),
        is_premium: row.get::<i64, _>("is_premium") != 0,
        score: row.get("score"),
        is_active: row.get::<i64, _>("is_active") != 0,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const USER_COLUMNS: &str =
    "id, email, username, password, role, is_premium, score, is_active, created_at, updated_at";

impl Database {
    /// Insert a new account. `password` must already be hashed.
    pub async fn create_user(
        &self,
        email: &str,
        username: &str,
        password: &str,
        role: &str,
    ) -> Result<User> {
        let result = sqlx::query(
            "INSERT INTO users (email, username, password, role) VALUES (?, ?, ?, ?)",
        )
        .bind(email)
        .bind(username)
        .bind(password)
        .bind(role)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_user_by_id(id)
            .await?
            .ok_or_else(|| anyhow!("failed to retrieve created user"))
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ? AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_user))
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ? AND deleted_at IS NULL"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_user))
    }

    pub async fn username_taken(&self, username: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    pub async fn update_email(&self, user_id: i64, email: &str) -> Result<()> {
        sqlx::query("UPDATE users SET email = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(email)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Used when a legacy plain-text password row is upgraded to a hash.
    pub async fn update_password(&self, user_id: i64, password: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(password)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_premium(&self, user_id: i64, is_premium: bool) -> Result<()> {
        sqlx::query(
            "UPDATE users SET is_premium = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(is_premium as i64)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Soft delete: the row stays, lookups skip it.
    pub async fn delete_user(&self, user_id: i64) -> Result<()> {
        sqlx::query(
            "UPDATE users SET is_active = 0, deleted_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        sqlx::query("UPDATE user_info SET deleted_at = CURRENT_TIMESTAMP WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn count_users(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }
}
