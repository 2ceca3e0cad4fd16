use serde::{Deserialize, Serialize};

/// One chat turn, either the user's question or the assistant's reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "is_ai")]
    pub is_ai: bool,
    #[serde(rename = "message")]
    pub text: String,
    #[serde(rename = "sent_at")]
    pub created_at: String,
}
