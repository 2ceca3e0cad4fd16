use serde::{Deserialize, Serialize};

/// A quiz "fact": a short educational text with attached questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    #[serde(default)]
    pub id: i64,
    pub title: String,
    pub content: String,
    pub number_of_question: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactQuestion {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub fact_id: i64,
    pub question: String,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub content: String,
    pub is_true: bool,
}
