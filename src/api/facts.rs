use super::error::{ApiResult, ProblemDetails};
use super::{internal, AppState};
use crate::models::{CreateQuestionsRequest, Fact, FactQuestion};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct CreateFactRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct QuestionQuery {
    pub id: i64,
    #[serde(default)]
    pub offset: i64,
}

pub async fn create_fact(
    State(state): State<AppState>,
    Json(req): Json<CreateFactRequest>,
) -> ApiResult<(StatusCode, Json<Fact>)> {
    if req.title.trim().is_empty() || req.content.trim().is_empty() {
        return Err(ProblemDetails::validation_error(
            "title and content are required",
        ));
    }

    let fact = state
        .db
        .create_fact(req.title.trim(), req.content.trim())
        .await
        .map_err(internal)?;

    Ok((StatusCode::CREATED, Json(fact)))
}

pub async fn create_questions(
    State(state): State<AppState>,
    Json(req): Json<CreateQuestionsRequest>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    if req.questions.is_empty() {
        return Err(ProblemDetails::validation_error("questions is empty"));
    }
    if req
        .questions
        .iter()
        .any(|q| q.question.trim().is_empty() || q.choices.is_empty())
    {
        return Err(ProblemDetails::validation_error(
            "every question needs text and at least one choice",
        ));
    }

    if state
        .db
        .get_fact(req.fact_id)
        .await
        .map_err(internal)?
        .is_none()
    {
        return Err(ProblemDetails::not_found("Fact"));
    }

    state
        .db
        .create_questions(req.fact_id, &req.questions)
        .await
        .map_err(internal)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "questions created",
            "count": req.questions.len(),
        })),
    ))
}

pub async fn get_facts(State(state): State<AppState>) -> ApiResult<Json<Vec<Fact>>> {
    let facts = state.db.list_facts().await.map_err(internal)?;
    Ok(Json(facts))
}

pub async fn get_question(
    State(state): State<AppState>,
    Query(query): Query<QuestionQuery>,
) -> ApiResult<Json<FactQuestion>> {
    let question = state
        .db
        .get_question(query.id, query.offset.max(0))
        .await
        .map_err(internal)?
        .ok_or_else(|| ProblemDetails::not_found("Question"))?;

    Ok(Json(question))
}
