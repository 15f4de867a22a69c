use axum::{
    extract::{Query, State},
    Extension, Json,
};

use crate::auth::middleware::AuthOwner;
use crate::dto::{validated, DaysQuery, TextResponse};
use crate::error::AppResult;
use crate::services::advisor;
use crate::AppState;

/// Free-text patterns across the wellness window. Oracle failures surface as 503.
pub async fn post_insights(
    State(state): State<AppState>,
    Extension(owner): Extension<AuthOwner>,
    Query(query): Query<DaysQuery>,
) -> AppResult<Json<TextResponse>> {
    let query = validated(query)?;
    let text = advisor::insights(
        state.store.as_ref(),
        state.oracle.as_ref(),
        &state.calendar,
        owner.owner_id,
        query.days(),
    )
    .await?;
    Ok(Json(TextResponse { text }))
}

pub async fn post_recommendation(
    State(state): State<AppState>,
    Extension(owner): Extension<AuthOwner>,
) -> AppResult<Json<TextResponse>> {
    let text = advisor::recommend(
        state.store.as_ref(),
        state.oracle.as_ref(),
        &state.calendar,
        owner.owner_id,
    )
    .await?;
    Ok(Json(TextResponse { text }))
}
