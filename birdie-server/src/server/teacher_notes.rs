use axum::{
    Json,
    extract::{Path, State},
};
use birdie_shared::api::{
    CreateTeacherNoteReq, DateReq, PeriodReq, TeacherNoteDto, TeacherNotePeriodRowDto,
    UpdateTeacherNoteReq,
};
use tracing::info;

use super::validate::{ValidJson, path_id};
use super::{AppError, AppState};
use crate::storage::{TeacherNoteWithTeacher, models::TeacherNote};

fn to_dto(n: TeacherNote) -> TeacherNoteDto {
    TeacherNoteDto {
        id: n.id,
        note: n.note,
        teacher_id: n.teacher_id,
        date: n.date,
    }
}

pub(super) fn to_period_row(
    (n, teacher_name, teacher_surname, teacher_id): TeacherNoteWithTeacher,
) -> TeacherNotePeriodRowDto {
    TeacherNotePeriodRowDto {
        id: n.id,
        note: n.note,
        date: n.date,
        teacher_name,
        teacher_surname,
        teacher_id,
    }
}

/// `id` is the teacher writing the note.
pub(super) async fn api_create_teacher_note(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidJson(input): ValidJson<CreateTeacherNoteReq>,
) -> Result<Json<TeacherNoteDto>, AppError> {
    let teacher_id = path_id("id", id)?;
    state
        .store
        .get_teacher(teacher_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| {
            AppError::not_found(format!("teacher with id {} does not exist", teacher_id))
        })?;
    let note = state
        .store
        .create_teacher_note(teacher_id, &input.note, input.date)
        .await
        .map_err(AppError::internal)?;
    info!(teacher_id, note_id = note.id, "teacher note created");
    Ok(Json(to_dto(note)))
}

pub(super) async fn api_list_teacher_notes(
    State(state): State<AppState>,
) -> Result<Json<Vec<TeacherNoteDto>>, AppError> {
    let rows = state
        .store
        .list_teacher_notes()
        .await
        .map_err(AppError::internal)?;
    Ok(Json(rows.into_iter().map(to_dto).collect()))
}

pub(super) async fn api_get_teacher_note(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TeacherNoteDto>, AppError> {
    let id = path_id("id", id)?;
    let note = state
        .store
        .get_teacher_note(id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("teacher note not found: {}", id)))?;
    Ok(Json(to_dto(note)))
}

pub(super) async fn api_update_teacher_note(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidJson(text): ValidJson<UpdateTeacherNoteReq>,
) -> Result<Json<TeacherNoteDto>, AppError> {
    let id = path_id("id", id)?;
    let note = state
        .store
        .update_teacher_note(id, &text)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("teacher note not found: {}", id)))?;
    Ok(Json(to_dto(note)))
}

pub(super) async fn api_teacher_notes_by_date(
    State(state): State<AppState>,
    ValidJson(day): ValidJson<DateReq>,
) -> Result<Json<Vec<TeacherNoteDto>>, AppError> {
    let rows = state
        .store
        .list_teacher_notes_by_date(day)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(rows.into_iter().map(to_dto).collect()))
}

pub(super) async fn api_teacher_notes_by_period(
    State(state): State<AppState>,
    ValidJson(period): ValidJson<PeriodReq>,
) -> Result<Json<Vec<TeacherNotePeriodRowDto>>, AppError> {
    let rows = state
        .store
        .list_teacher_notes_by_period(period.from, period.to)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(rows.into_iter().map(to_period_row).collect()))
}
