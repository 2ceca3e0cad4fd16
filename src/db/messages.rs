use super::Database;
use crate::models::ChatMessage;
use anyhow::Result;
use sqlx::Row;

impl Database {
    pub async fn insert_message(&self, user_id: i64, is_ai: bool, body: &str) -> Result<i64> {
        let result = sqlx::query("INSERT INTO messages (user_id, is_ai, body) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(is_ai as i64)
            .bind(body)
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    /// Chat history for a user, oldest first.
    pub async fn get_messages(&self, user_id: i64) -> Result<Vec<ChatMessage>> {
        let rows = sqlx::query(
            "SELECT id, user_id, is_ai, body, created_at
             FROM messages WHERE user_id = ? ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ChatMessage {
                id: row.get("id"),
                user_id: row.get("user_id"),
                is_ai: row.get::<i64, _>("is_ai") != 0,
                text: row.get("body"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    pub async fn count_messages(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM messages")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }
}
