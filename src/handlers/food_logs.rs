use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::auth::middleware::AuthOwner;
use crate::dto::{validated, ConfirmQuery, CreateFoodLogRequest, DeleteResponse, RangeQuery};
use crate::error::{AppError, AppResult};
use crate::models::food_log::FoodLog;
use crate::AppState;

pub async fn list_food_logs(
    State(state): State<AppState>,
    Extension(owner): Extension<AuthOwner>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<Vec<FoodLog>>> {
    let (start, end) = query.resolve(&state.calendar)?;
    let window = state.calendar.window(start, end)?;
    let logs = state
        .store
        .food_logs_in_window(owner.owner_id, window)
        .await?;
    Ok(Json(logs))
}

pub async fn create_food_log(
    State(state): State<AppState>,
    Extension(owner): Extension<AuthOwner>,
    Json(body): Json<CreateFoodLogRequest>,
) -> AppResult<(StatusCode, Json<FoodLog>)> {
    let new = validated(body)?.into_new()?;
    let log = state.store.insert_food_log(owner.owner_id, new).await?;

    tracing::info!(
        owner_id = owner.owner_id,
        calories = log.calories,
        "Food log created manually"
    );
    Ok((StatusCode::CREATED, Json(log)))
}

pub async fn delete_food_log(
    State(state): State<AppState>,
    Extension(owner): Extension<AuthOwner>,
    Path(id): Path<Uuid>,
    Query(confirm): Query<ConfirmQuery>,
) -> AppResult<Json<DeleteResponse>> {
    confirm.require()?;
    if !state.store.delete_food_log(owner.owner_id, id).await? {
        return Err(AppError::NotFound("Food log not found".into()));
    }
    Ok(Json(DeleteResponse { deleted: true, id }))
}
