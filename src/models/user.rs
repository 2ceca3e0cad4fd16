use serde::{Deserialize, Serialize};

/// A registered account row. The password field always holds a bcrypt hash
/// except for legacy rows, which are upgraded on first successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: String,
    pub is_premium: bool,
    pub score: i64,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Skin profile filled in after registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub user_id: i64,
    pub firstname: String,
    pub lastname: String,
    pub skin_color: i64,
    pub skin_type: i64,
    pub gender: String,
    /// Birth date, "YYYY-MM-DD"
    #[serde(default)]
    pub birth: Option<String>,
}
