use axum::{
    Json,
    extract::{Path, State},
};
use birdie_shared::api::{CarnetDto, CarnetReq};
use birdie_shared::carnet::{self, KidCarnetInfo};
use birdie_shared::domain::{Kid, KidNote, Purchase};
use tracing::{debug, info};

use super::validate::{ValidJson, path_id};
use super::{AppError, AppState};
use crate::storage::{Store, StorageError, models::Carnet};

fn to_dto(c: Carnet) -> CarnetDto {
    CarnetDto {
        id: c.id,
        date: c.date,
        quantity: c.quantity,
        kid_id: c.kid_id,
    }
}

/// Loads purchases, roster and notes, then folds them into per-kid balances.
/// Any read failure aborts the whole computation.
pub(super) async fn load_carnet_info(store: &Store) -> Result<KidCarnetInfo, StorageError> {
    let purchases: Vec<Purchase> = store
        .list_carnets()
        .await?
        .into_iter()
        .map(Purchase::from)
        .collect();
    let kids: Vec<Kid> = store.list_kids().await?.into_iter().map(Kid::from).collect();
    let notes: Vec<KidNote> = store
        .list_kid_notes()
        .await?
        .into_iter()
        .map(KidNote::from)
        .collect();
    let info = carnet::compute_carnet_info(&purchases, &kids, &notes);
    debug!(
        purchases = purchases.len(),
        kids = kids.len(),
        notes = notes.len(),
        "carnet info computed"
    );
    Ok(info)
}

pub(super) async fn api_carnet_info(
    State(state): State<AppState>,
) -> Result<Json<KidCarnetInfo>, AppError> {
    let info = load_carnet_info(&state.store)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(info))
}

/// `id` is the kid the carnet was bought for.
pub(super) async fn api_create_carnet(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidJson(input): ValidJson<CarnetReq>,
) -> Result<Json<CarnetDto>, AppError> {
    let kid_id = path_id("id", id)?;
    state
        .store
        .get_kid(kid_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("kid with id {} does not exist", kid_id)))?;
    let row = state
        .store
        .create_carnet(kid_id, input.date, input.quantity)
        .await
        .map_err(AppError::internal)?;
    info!(kid_id, carnet_id = row.id, quantity = row.quantity, "carnet recorded");
    Ok(Json(to_dto(row)))
}

pub(super) async fn api_get_carnet(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CarnetDto>, AppError> {
    let id = path_id("id", id)?;
    let row = state
        .store
        .get_carnet(id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("carnet not found: {}", id)))?;
    Ok(Json(to_dto(row)))
}

pub(super) async fn api_update_carnet(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidJson(input): ValidJson<CarnetReq>,
) -> Result<Json<CarnetDto>, AppError> {
    let id = path_id("id", id)?;
    let row = state
        .store
        .update_carnet(id, input.date, input.quantity)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("carnet not found: {}", id)))?;
    Ok(Json(to_dto(row)))
}
