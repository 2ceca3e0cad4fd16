use super::error::{ApiResult, ProblemDetails};
use super::AppState;
use crate::models::{NewsArticle, NewsList};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: String,
}

pub async fn get_all(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Json<NewsList> {
    let page = query.page.unwrap_or(1).max(1);
    Json(state.news.get_all(page).await)
}

pub async fn get_one(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> ApiResult<Json<NewsArticle>> {
    let article = state.news.get_one(&query.id).await.map_err(|e| {
        tracing::warn!("news lookup failed: {e}");
        ProblemDetails::bad_gateway("News source request failed")
    })?;

    article
        .map(Json)
        .ok_or_else(|| ProblemDetails::not_found("News article"))
}
