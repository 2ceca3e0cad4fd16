use super::error::{ApiResult, ProblemDetails};
use super::{internal, AppState};
use crate::models::{Doctor, DoctorsBySpecialty};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: String,
}

pub async fn create_doctor(
    State(state): State<AppState>,
    Json(req): Json<Doctor>,
) -> ApiResult<(StatusCode, Json<Doctor>)> {
    if req.name.trim().is_empty() || req.specialty.trim().is_empty() {
        return Err(ProblemDetails::validation_error(
            "name and specialty are required",
        ));
    }

    let doctor = state
        .db
        .create_doctor(req.name.trim(), req.specialty.trim(), req.contact.as_deref())
        .await
        .map_err(internal)?;

    Ok((StatusCode::CREATED, Json(doctor)))
}

pub async fn get_all_doctors(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<DoctorsBySpecialty>>> {
    let groups = state.db.list_doctors_by_specialty().await.map_err(internal)?;
    Ok(Json(groups))
}

pub async fn get_one_doctor(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
) -> ApiResult<Json<Vec<Doctor>>> {
    let doctors = state
        .db
        .find_doctors_by_name(query.name.trim())
        .await
        .map_err(internal)?;

    if doctors.is_empty() {
        return Err(ProblemDetails::not_found("Doctor"));
    }
    Ok(Json(doctors))
}
