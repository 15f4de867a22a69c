//! Free-text oracle calls: meal recommendations, wellness insights and the
//! daily narrative.
//!
//! Recommendations and insights surface oracle failures to the caller. The
//! narrative never fails; it falls back to a one-line templated summary.

use crate::db::RecordStore;
use crate::error::AppResult;
use crate::services::aggregation::{summarize_day, wellness_context, DailySummary};
use crate::services::calendar::Calendar;
use crate::services::oracle::{Oracle, OracleRequest};
use crate::services::prompts::{
    insights_prompt, meal_slot, recommendation_prompt, summary_prompt, INSIGHTS_MAX_TOKENS,
    RECOMMENDATION_MAX_TOKENS, SUMMARY_MAX_TOKENS,
};
use crate::services::replies::narrative_fallback;

pub const DEFAULT_INSIGHT_DAYS: u32 = 7;
pub const MAX_INSIGHT_DAYS: u32 = 90;

pub const NOT_ENOUGH_DATA: &str = "Not enough data yet. Log some meals, workouts and how you feel \
(for example `slept poorly, only 5 hours`) and try again. The more you log, the richer the insights.";

pub async fn recommend(
    store: &dyn RecordStore,
    oracle: &dyn Oracle,
    calendar: &Calendar,
    owner_id: i64,
) -> AppResult<String> {
    let profile = store.get_or_create_owner(owner_id).await?;
    let today = calendar.today();
    let mut foods = store
        .food_logs_in_window(owner_id, calendar.day(today))
        .await?;
    foods.reverse();

    let summary = summarize_day(today, &profile, &foods, &[], 0);
    let slot = meal_slot(calendar.current_hour());
    let prompt = recommendation_prompt(&profile, &summary, &foods, slot);

    tracing::info!(owner_id, slot, "Requesting meal recommendation");
    let text = oracle
        .complete(OracleRequest::new(prompt, RECOMMENDATION_MAX_TOKENS))
        .await?;
    Ok(text)
}

pub async fn insights(
    store: &dyn RecordStore,
    oracle: &dyn Oracle,
    calendar: &Calendar,
    owner_id: i64,
    days: u32,
) -> AppResult<String> {
    let profile = store.get_or_create_owner(owner_id).await?;
    let ctx = wellness_context(store, calendar, owner_id, days).await?;
    if ctx.is_empty() {
        return Ok(NOT_ENOUGH_DATA.to_string());
    }

    tracing::info!(
        owner_id,
        days = ctx.days,
        food_entries = ctx.totals.food_entries,
        workouts = ctx.totals.workout_count,
        notes = ctx.totals.note_count,
        "Requesting insights"
    );
    let text = oracle
        .complete(OracleRequest::new(
            insights_prompt(&ctx, &profile),
            INSIGHTS_MAX_TOKENS,
        ))
        .await?;
    Ok(text)
}

pub async fn summary_narrative(oracle: &dyn Oracle, summary: &DailySummary) -> String {
    match oracle
        .complete(OracleRequest::new(summary_prompt(summary), SUMMARY_MAX_TOKENS))
        .await
    {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, date = %summary.date, "Narrative unavailable, using template");
            narrative_fallback(summary)
        }
    }
}
