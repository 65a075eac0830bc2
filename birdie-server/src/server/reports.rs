use axum::{Json, extract::State};
use birdie_shared::api::{MonthlyReportDto, PeriodReq};
use tracing::info;

use super::carnets::load_carnet_info;
use super::kid_notes;
use super::teacher_notes;
use super::validate::ValidJson;
use super::{AppError, AppState};

/// Notes written in the period plus the all-time carnet balances.
pub(super) async fn api_monthly_report(
    State(state): State<AppState>,
    ValidJson(period): ValidJson<PeriodReq>,
) -> Result<Json<MonthlyReportDto>, AppError> {
    let kid_rows = state
        .store
        .list_kid_notes_by_period(period.from, period.to)
        .await
        .map_err(AppError::internal)?;
    let teacher_rows = state
        .store
        .list_teacher_notes_by_period(period.from, period.to)
        .await
        .map_err(AppError::internal)?;
    let carnet_info = load_carnet_info(&state.store)
        .await
        .map_err(AppError::internal)?;
    info!(
        from = %period.from,
        to = %period.to,
        kid_notes = kid_rows.len(),
        teacher_notes = teacher_rows.len(),
        "monthly report built"
    );
    Ok(Json(MonthlyReportDto {
        kid_notes: kid_rows.into_iter().map(kid_notes::to_period_row).collect(),
        teacher_notes: teacher_rows
            .into_iter()
            .map(teacher_notes::to_period_row)
            .collect(),
        carnet_info,
    }))
}
