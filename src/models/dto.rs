use serde::{Deserialize, Serialize};

use super::fact::FactQuestion;

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user_id: i64,
    pub role: String,
    /// Seconds until the token expires
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestResponse {
    pub access_token: String,
    pub role: String,
    pub ai_limit: u32,
    pub upload_limit: u32,
    pub expires_in: i64,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateEmailRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// Image consultation request. The image travels as base64 in the JSON body.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadRequest {
    #[serde(default)]
    pub message: Option<String>,
    pub image: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuestionsRequest {
    pub fact_id: i64,
    pub questions: Vec<FactQuestion>,
}
