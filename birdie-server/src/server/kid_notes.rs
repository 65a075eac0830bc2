use axum::{
    Json,
    extract::{Path, State},
};
use birdie_shared::api::{
    CreateKidNoteReq, KidNoteDto, KidNotePeriodRowDto, PeriodReq, UpdateKidNoteReq,
};
use birdie_shared::domain;
use tracing::{info, warn};

use super::validate::{ValidJson, path_id};
use super::{AppError, AppState};
use crate::storage::{KidNoteWithKid, models::KidNote};

fn to_dto(n: KidNote) -> KidNoteDto {
    let n = domain::KidNote::from(n);
    KidNoteDto {
        id: n.id,
        note: n.note,
        kid_id: n.kid_id.0,
        presence: n.presence,
        has_meal: n.has_meal,
        date: n.date,
    }
}

pub(super) fn to_period_row(
    (n, kid_name, kid_surname, kid_id): KidNoteWithKid,
) -> KidNotePeriodRowDto {
    let n = domain::KidNote::from(n);
    KidNotePeriodRowDto {
        id: n.id,
        note: n.note,
        date: n.date,
        presence: n.presence,
        has_meal: n.has_meal,
        kid_name,
        kid_surname,
        kid_id,
    }
}

/// `id` is the kid the note is written for.
pub(super) async fn api_create_kid_note(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidJson(input): ValidJson<CreateKidNoteReq>,
) -> Result<Json<KidNoteDto>, AppError> {
    let kid_id = path_id("id", id)?;
    state
        .store
        .get_kid(kid_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("kid with id {} does not exist", kid_id)))?;
    let Some(note) = state
        .store
        .create_kid_note(kid_id, &input.note, &input.presence, input.has_meal, input.date)
        .await
        .map_err(AppError::internal)?
    else {
        warn!(kid_id, date = %input.date, "kid note already present for day");
        return Err(AppError::bad_request(format!(
            "kid {} already has a note for {}",
            kid_id, input.date
        )));
    };
    info!(kid_id, note_id = note.id, "kid note created");
    Ok(Json(to_dto(note)))
}

pub(super) async fn api_list_kid_notes(
    State(state): State<AppState>,
) -> Result<Json<Vec<KidNoteDto>>, AppError> {
    let rows = state
        .store
        .list_kid_notes()
        .await
        .map_err(AppError::internal)?;
    Ok(Json(rows.into_iter().map(to_dto).collect()))
}

pub(super) async fn api_get_kid_note(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<KidNoteDto>, AppError> {
    let id = path_id("id", id)?;
    let note = state
        .store
        .get_kid_note(id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("kid note not found: {}", id)))?;
    Ok(Json(to_dto(note)))
}

pub(super) async fn api_update_kid_note(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidJson(input): ValidJson<UpdateKidNoteReq>,
) -> Result<Json<KidNoteDto>, AppError> {
    let id = path_id("id", id)?;
    let note = state
        .store
        .update_kid_note(id, &input.note, &input.presence, input.has_meal)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("kid note not found: {}", id)))?;
    Ok(Json(to_dto(note)))
}

pub(super) async fn api_kid_notes_by_period(
    State(state): State<AppState>,
    ValidJson(period): ValidJson<PeriodReq>,
) -> Result<Json<Vec<KidNotePeriodRowDto>>, AppError> {
    let rows = state
        .store
        .list_kid_notes_by_period(period.from, period.to)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(rows.into_iter().map(to_period_row).collect()))
}
