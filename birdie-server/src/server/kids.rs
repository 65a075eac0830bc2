use axum::{
    Json,
    extract::{Path, State},
};
use birdie_shared::api::{CreateKidReq, KidDto};
use tracing::info;

use super::validate::{ValidJson, path_id};
use super::{AppError, AppState};
use crate::storage::models::Kid;

fn to_dto(k: Kid) -> KidDto {
    KidDto {
        id: k.id,
        name: k.name,
        surname: k.surname,
    }
}

pub(super) async fn api_create_kid(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<CreateKidReq>,
) -> Result<Json<KidDto>, AppError> {
    let kid = state
        .store
        .create_kid(&input.name, &input.surname)
        .await
        .map_err(AppError::internal)?;
    info!(kid_id = kid.id, "kid created");
    Ok(Json(to_dto(kid)))
}

pub(super) async fn api_list_kids(
    State(state): State<AppState>,
) -> Result<Json<Vec<KidDto>>, AppError> {
    let rows = state.store.list_kids().await.map_err(AppError::internal)?;
    Ok(Json(rows.into_iter().map(to_dto).collect()))
}

pub(super) async fn api_get_kid(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<KidDto>, AppError> {
    let id = path_id("id", id)?;
    let kid = state
        .store
        .get_kid(id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("kid not found: {}", id)))?;
    Ok(Json(to_dto(kid)))
}
