use axum::{
    Json,
    extract::{Path, State},
};
use birdie_shared::api::{CreateTeacherReq, TeacherDto};
use tracing::info;

use super::validate::{ValidJson, path_id};
use super::{AppError, AppState};
use crate::storage::models::Teacher;

fn to_dto(t: Teacher) -> TeacherDto {
    TeacherDto {
        id: t.id,
        name: t.name,
        surname: t.surname,
    }
}

pub(super) async fn api_create_teacher(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<CreateTeacherReq>,
) -> Result<Json<TeacherDto>, AppError> {
    let teacher = state
        .store
        .create_teacher(&input.name, &input.surname)
        .await
        .map_err(AppError::internal)?;
    info!(teacher_id = teacher.id, "teacher created");
    Ok(Json(to_dto(teacher)))
}

pub(super) async fn api_list_teachers(
    State(state): State<AppState>,
) -> Result<Json<Vec<TeacherDto>>, AppError> {
    let rows = state
        .store
        .list_teachers()
        .await
        .map_err(AppError::internal)?;
    Ok(Json(rows.into_iter().map(to_dto).collect()))
}

pub(super) async fn api_get_teacher(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TeacherDto>, AppError> {
    let id = path_id("id", id)?;
    let teacher = state
        .store
        .get_teacher(id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("teacher not found: {}", id)))?;
    Ok(Json(to_dto(teacher)))
}
