use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Serialize;

use crate::auth::middleware::AuthOwner;
use crate::dto::{validated, DateQuery, DaysQuery, RangeQuery};
use crate::error::AppResult;
use crate::services::advisor::summary_narrative;
use crate::services::aggregation::{
    daily_summary, range_overview, wellness_context, DailySummary, RangeOverview, WellnessContext,
};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DailySummaryResponse {
    #[serde(flatten)]
    pub summary: DailySummary,
    /// Oracle-written paragraph, or a templated sentence when the oracle fails.
    pub narrative: String,
}

pub async fn get_daily_summary(
    State(state): State<AppState>,
    Extension(owner): Extension<AuthOwner>,
    Query(query): Query<DateQuery>,
) -> AppResult<Json<DailySummaryResponse>> {
    let date = query.resolve(&state.calendar)?;
    let summary = daily_summary(state.store.as_ref(), &state.calendar, owner.owner_id, date).await?;
    let narrative = summary_narrative(state.oracle.as_ref(), &summary).await;

    Ok(Json(DailySummaryResponse { summary, narrative }))
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(owner): Extension<AuthOwner>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<RangeOverview>> {
    let (start, end) = query.resolve(&state.calendar)?;
    let overview = range_overview(
        state.store.as_ref(),
        &state.calendar,
        owner.owner_id,
        start,
        end,
    )
    .await?;
    Ok(Json(overview))
}

pub async fn get_wellness(
    State(state): State<AppState>,
    Extension(owner): Extension<AuthOwner>,
    Query(query): Query<DaysQuery>,
) -> AppResult<Json<WellnessContext>> {
    let query = validated(query)?;
    let ctx = wellness_context(
        state.store.as_ref(),
        &state.calendar,
        owner.owner_id,
        query.days(),
    )
    .await?;
    Ok(Json(ctx))
}
