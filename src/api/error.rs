use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// RFC 9457 problem details, the error body for every API response.
/// https://www.rfc-editor.org/rfc/rfc9457.html
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub type_uri: String,

    /// Human-readable summary of the problem type
    pub title: String,

    pub status: u16,

    /// Explanation of this specific occurrence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// URI identifying the specific occurrence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    /// RFC 9457 extension members (e.g. remaining guest quotas)
    #[serde(flatten, skip_serializing_if = "serde_json::Map::is_empty", default)]
    pub extensions: serde_json::Map<String, serde_json::Value>,
}

impl ProblemDetails {
    pub fn new(type_uri: impl Into<String>, title: impl Into<String>, status: StatusCode) -> Self {
        Self {
            type_uri: type_uri.into(),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            instance: None,
            extensions: serde_json::Map::new(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extensions.insert(key.into(), value.into());
        self
    }

    fn well_known(slug: &str, status: StatusCode) -> Self {
        Self::new(
            format!("https://skinai.example.com/errors/{slug}"),
            status.canonical_reason().unwrap_or("Error"),
            status,
        )
    }

    pub fn validation_error(detail: impl Into<String>) -> Self {
        Self::well_known("validation", StatusCode::BAD_REQUEST).with_detail(detail)
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::well_known("unauthorized", StatusCode::UNAUTHORIZED).with_detail(detail)
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::well_known("forbidden", StatusCode::FORBIDDEN).with_detail(detail)
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::well_known("not-found", StatusCode::NOT_FOUND)
            .with_detail(format!("{} not found", resource.into()))
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::well_known("conflict", StatusCode::CONFLICT).with_detail(detail)
    }

    pub fn too_many_requests(detail: impl Into<String>) -> Self {
        Self::well_known("rate-limit", StatusCode::TOO_MANY_REQUESTS).with_detail(detail)
    }

    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self::well_known("internal", StatusCode::INTERNAL_SERVER_ERROR).with_detail(detail)
    }

    pub fn bad_gateway(detail: impl Into<String>) -> Self {
        Self::well_known("upstream", StatusCode::BAD_GATEWAY).with_detail(detail)
    }
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = (status, Json(self)).into_response();

        response.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static("application/problem+json"),
        );

        response
    }
}

pub type ApiResult<T> = Result<T, ProblemDetails>;
