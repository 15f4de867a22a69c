//! Dispatches a classified utterance: answer it, or persist it and report
//! the day's running totals.

use crate::db::RecordStore;
use crate::error::AppResult;
use crate::models::food_log::NewFoodLog;
use crate::models::note::{is_wellness_tag, NewNote};
use crate::models::workout::NewWorkout;
use crate::services::aggregation::{daily_summary, total_minutes};
use crate::services::calendar::Calendar;
use crate::services::classifier::{classify, Classification};
use crate::services::oracle::Oracle;
use crate::services::replies::{self, preview, Reply};

pub async fn route(
    store: &dyn RecordStore,
    calendar: &Calendar,
    owner_id: i64,
    classification: Classification,
) -> AppResult<Reply> {
    match classification {
        Classification::Question(q) => {
            tracing::info!(owner_id, "Question answered, nothing saved");
            Ok(Reply::plain(q.answer))
        }

        Classification::Note(n) => {
            let wellness = n.tags.iter().any(|t| is_wellness_tag(t));
            let note = store
                .insert_note(
                    owner_id,
                    NewNote {
                        content: n.content,
                        summary: n.summary,
                        tags: n.tags,
                    },
                )
                .await?;
            tracing::info!(owner_id, note_id = %note.id, "Note saved");
            Ok(Reply::markdown(replies::note_saved(
                &note.summary,
                &note.tags,
                wellness,
            )))
        }

        Classification::Food(f) => {
            let entry = store
                .insert_food_log(
                    owner_id,
                    NewFoodLog {
                        food_description: f.food_description,
                        calories: f.calories,
                        protein: f.protein,
                        carbs: f.carbs,
                        fat: f.fat,
                    },
                )
                .await?;
            tracing::info!(owner_id, calories = entry.calories, "Food logged");

            // Re-read after the write so today's totals include this entry
            let today = daily_summary(store, calendar, owner_id, calendar.today()).await?;
            let profile = store.get_or_create_owner(owner_id).await?;
            Ok(Reply::markdown(replies::food_logged(&entry, &today, &profile)))
        }

        Classification::Workout(w) => {
            let entry = store
                .insert_workout(
                    owner_id,
                    NewWorkout {
                        activity_type: w.activity_type,
                        duration_mins: w.duration_mins,
                        distance_km: w.distance_km,
                        notes: w.notes,
                    },
                )
                .await?;
            tracing::info!(owner_id, minutes = entry.duration_mins, "Workout logged");

            let todays = store
                .workouts_in_window(owner_id, calendar.day(calendar.today()))
                .await?;
            Ok(Reply::markdown(replies::workout_logged(
                &entry,
                total_minutes(&todays),
            )))
        }
    }
}

/// Classify then route one free-text message.
pub async fn handle_utterance(
    store: &dyn RecordStore,
    oracle: &dyn Oracle,
    calendar: &Calendar,
    owner_id: i64,
    text: &str,
) -> AppResult<(&'static str, Reply)> {
    tracing::info!(owner_id, text = %preview(text), "Incoming message");

    let result = classify_and_route(store, oracle, calendar, owner_id, text).await;
    if let Err(e) = &result {
        tracing::error!(owner_id, text = %preview(text), error = %e, "Message handling failed");
    }
    result
}

async fn classify_and_route(
    store: &dyn RecordStore,
    oracle: &dyn Oracle,
    calendar: &Calendar,
    owner_id: i64,
    text: &str,
) -> AppResult<(&'static str, Reply)> {
    let classification = classify(oracle, text).await?;
    let kind = classification.kind();
    tracing::debug!(owner_id, kind, confidence = classification.confidence(), "Classified");
    let reply = route(store, calendar, owner_id, classification).await?;
    Ok((kind, reply))
}
