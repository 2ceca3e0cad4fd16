use super::Database;
use crate::models::UserProfile;
use anyhow::Result;
use sqlx::Row;

impl Database {
    /// Insert or replace the profile for a user.
    pub async fn upsert_profile(&self, user_id: i64, profile: &UserProfile) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_info (user_id, firstname, lastname, skin_color, skin_type, gender, birth)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                firstname = excluded.firstname,
                lastname = excluded.lastname,
                skin_color = excluded.skin_color,
                skin_type = excluded.skin_type,
                gender = excluded.gender,
                birth = excluded.birth,
                updated_at = CURRENT_TIMESTAMP,
                deleted_at = NULL
            "#,
        )
        .bind(user_id)
        .bind(&profile.firstname)
        .bind(&profile.lastname)
        .bind(profile.skin_color)
        .bind(profile.skin_type)
        .bind(&profile.gender)
        .bind(&profile.birth)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_profile(&self, user_id: i64) -> Result<Option<UserProfile>> {
        let row = sqlx::query(
            "SELECT id, user_id, firstname, lastname, skin_color, skin_type, gender, birth
             FROM user_info WHERE user_id = ? AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| UserProfile {
            id: row.get("id"),
            user_id: row.get("user_id"),
            firstname: row.get("firstname"),
            lastname: row.get("lastname"),
            skin_color: row.get("skin_color"),
            skin_type: row.get("skin_type"),
            gender: row.get("gender"),
            birth: row.get("birth"),
        }))
    }
}
