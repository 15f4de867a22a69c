use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::auth::middleware::AuthOwner;
use crate::dto::{validated, ConfirmQuery, CreateWorkoutRequest, DeleteResponse, RangeQuery};
use crate::error::{AppError, AppResult};
use crate::models::workout::Workout;
use crate::AppState;

pub async fn list_workouts(
    State(state): State<AppState>,
    Extension(owner): Extension<AuthOwner>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<Vec<Workout>>> {
    let (start, end) = query.resolve(&state.calendar)?;
    let window = state.calendar.window(start, end)?;
    let workouts = state
        .store
        .workouts_in_window(owner.owner_id, window)
        .await?;
    Ok(Json(workouts))
}

pub async fn create_workout(
    State(state): State<AppState>,
    Extension(owner): Extension<AuthOwner>,
    Json(body): Json<CreateWorkoutRequest>,
) -> AppResult<(StatusCode, Json<Workout>)> {
    let new = validated(body)?.into_new()?;
    let workout = state.store.insert_workout(owner.owner_id, new).await?;

    tracing::info!(
        owner_id = owner.owner_id,
        activity = %workout.activity_type,
        minutes = workout.duration_mins,
        "Workout created manually"
    );
    Ok((StatusCode::CREATED, Json(workout)))
}

pub async fn delete_workout(
    State(state): State<AppState>,
    Extension(owner): Extension<AuthOwner>,
    Path(id): Path<Uuid>,
    Query(confirm): Query<ConfirmQuery>,
) -> AppResult<Json<DeleteResponse>> {
    confirm.require()?;
    if !state.store.delete_workout(owner.owner_id, id).await? {
        return Err(AppError::NotFound("Workout not found".into()));
    }
    Ok(Json(DeleteResponse { deleted: true, id }))
}
