//! # Request/Response DTOs
//!
//! HTTP contract types for the chat transport and the dashboard.
//!
//! Conventions:
//! - `*Request`  → deserialized from client JSON body
//! - `*Query`    → deserialized from query params
//! - `*Response` → serialized to client JSON
//! - Field rules are expressed via `validator` derive macros; cross-field
//!   rules live in `into_*` conversions that return `AppError::Validation`.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::food_log::NewFoodLog;
use crate::models::note::{normalize_tags, NewNote};
use crate::models::profile::{round1, ProfilePatch};
use crate::models::workout::{NewWorkout, OTHER_ACTIVITY, WORKOUT_ACTIVITIES};
use crate::services::advisor::{DEFAULT_INSIGHT_DAYS, MAX_INSIGHT_DAYS};
use crate::services::calendar::Calendar;
use crate::services::commands::SEARCH_NOTES_LIMIT;
use crate::services::replies::Reply;

pub const DEFAULT_RANGE_DAYS: u32 = 7;
const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 9999;
const MAX_SEARCH_LIMIT: i64 = 50;

/// Run the derive rules and flatten failures into one `Validation` error.
pub fn validated<T: Validate>(value: T) -> AppResult<T> {
    value
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    Ok(value)
}

// ============================================================================
// Common
// ============================================================================

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub id: Uuid,
}

/// Deletes are refused unless `?confirm=true` is present.
#[derive(Debug, Default, Deserialize)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirm: bool,
}

impl ConfirmQuery {
    pub fn require(&self) -> AppResult<()> {
        if self.confirm {
            Ok(())
        } else {
            Err(AppError::Validation(
                "Deletion must be confirmed with confirm=true".into(),
            ))
        }
    }
}

/// GET list endpoints: `?start_date=&end_date=`, both optional.
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl RangeQuery {
    /// Missing bounds default to the trailing week ending today.
    pub fn resolve(&self, calendar: &Calendar) -> AppResult<(NaiveDate, NaiveDate)> {
        let end = match self.end_date {
            Some(d) => check_date("end_date", d)?,
            None => calendar.today(),
        };
        let start = match self.start_date {
            Some(d) => check_date("start_date", d)?,
            None => end
                .checked_sub_days(Days::new(u64::from(DEFAULT_RANGE_DAYS) - 1))
                .ok_or_else(|| AppError::Validation("end_date is out of range".into()))?,
        };
        if start > end {
            return Err(AppError::Validation(format!(
                "start_date {} is after end_date {}",
                start, end
            )));
        }
        Ok((start, end))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    pub date: Option<NaiveDate>,
}

impl DateQuery {
    pub fn resolve(&self, calendar: &Calendar) -> AppResult<NaiveDate> {
        match self.date {
            Some(d) => check_date("date", d),
            None => Ok(calendar.today()),
        }
    }
}

/// Query dates must fall in years 1900..=9999.
fn check_date(field: &str, date: NaiveDate) -> AppResult<NaiveDate> {
    if (MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
        Ok(date)
    } else {
        Err(AppError::Validation(format!(
            "{} must be between {}-01-01 and {}-12-31",
            field, MIN_YEAR, MAX_YEAR
        )))
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct DaysQuery {
    #[validate(range(min = 1, max = 90, message = "days must be 1-90"))]
    pub days: Option<u32>,
}

impl DaysQuery {
    pub fn days(&self) -> u32 {
        self.days.unwrap_or(DEFAULT_INSIGHT_DAYS).min(MAX_INSIGHT_DAYS)
    }
}

// ============================================================================
// Chat transport
// ============================================================================

/// POST /api/messages
#[derive(Debug, Deserialize, Validate)]
pub struct MessageRequest {
    #[validate(length(min = 1, max = 4096, message = "Message must be 1-4096 characters"))]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub kind: &'static str,
    pub markdown: bool,
    pub chunks: Vec<String>,
}

impl MessageResponse {
    pub fn new(kind: &'static str, reply: Reply) -> Self {
        Self {
            kind,
            markdown: reply.markdown,
            chunks: reply.chunks(),
        }
    }
}

/// POST /api/commands
#[derive(Debug, Deserialize, Validate)]
pub struct CommandRequest {
    #[validate(length(min = 1, max = 64, message = "Command name is required"))]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ChunksResponse {
    pub markdown: bool,
    pub chunks: Vec<String>,
}

impl From<Reply> for ChunksResponse {
    fn from(reply: Reply) -> Self {
        Self {
            markdown: reply.markdown,
            chunks: reply.chunks(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TextResponse {
    pub text: String,
}

// ============================================================================
// Profile
// ============================================================================

/// PUT /api/profile. Omitted fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(range(min = 20.0, max = 300.0, message = "Weight must be 20-300 kg"))]
    pub current_weight: Option<f64>,
    #[validate(range(min = 20.0, max = 300.0, message = "Goal weight must be 20-300 kg"))]
    pub goal_weight: Option<f64>,
    #[validate(range(min = 500, max = 5000, message = "Calorie target must be 500-5000"))]
    pub daily_calorie_target: Option<i32>,
    #[validate(range(min = 0.0, max = 1000.0, message = "Protein target must be 0-1000 g"))]
    pub protein_target: Option<f64>,
    #[validate(range(min = 0.0, max = 1000.0, message = "Carbs target must be 0-1000 g"))]
    pub carbs_target: Option<f64>,
    #[validate(range(min = 0.0, max = 1000.0, message = "Fat target must be 0-1000 g"))]
    pub fat_target: Option<f64>,
}

impl UpdateProfileRequest {
    pub fn into_patch(self) -> AppResult<ProfilePatch> {
        let patch = ProfilePatch {
            current_weight: self.current_weight,
            goal_weight: self.goal_weight,
            daily_calorie_target: self.daily_calorie_target,
            protein_target: self.protein_target,
            carbs_target: self.carbs_target,
            fat_target: self.fat_target,
        };
        if patch.is_empty() {
            return Err(AppError::Validation("No fields to update".into()));
        }
        Ok(patch)
    }
}

// ============================================================================
// Manual entry
// ============================================================================

/// POST /api/notes
#[derive(Debug, Deserialize, Validate)]
pub struct CreateNoteRequest {
    #[validate(length(min = 1, max = 5000, message = "Note must be 1-5000 characters"))]
    pub content: String,
    #[validate(length(min = 1, max = 200, message = "Summary must be 1-200 characters"))]
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CreateNoteRequest {
    pub fn into_new(self) -> AppResult<NewNote> {
        let content = self.content.trim().to_string();
        let summary = self.summary.trim().to_string();
        if content.is_empty() || summary.is_empty() {
            return Err(AppError::Validation(
                "Note content and summary must not be blank".into(),
            ));
        }
        Ok(NewNote {
            content,
            summary,
            tags: normalize_tags(&self.tags),
        })
    }
}

/// POST /api/food-logs
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFoodLogRequest {
    #[validate(length(min = 1, max = 500, message = "Food description must be 1-500 characters"))]
    pub food_description: String,
    #[validate(range(min = 0, message = "Calories must not be negative"))]
    pub calories: i32,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "Protein must not be negative"))]
    pub protein: f64,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "Carbs must not be negative"))]
    pub carbs: f64,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "Fat must not be negative"))]
    pub fat: f64,
}

impl CreateFoodLogRequest {
    pub fn into_new(self) -> AppResult<NewFoodLog> {
        let food_description = self.food_description.trim().to_string();
        if food_description.is_empty() {
            return Err(AppError::Validation(
                "Food description must not be blank".into(),
            ));
        }
        Ok(NewFoodLog {
            food_description,
            calories: self.calories,
            protein: round1(self.protein),
            carbs: round1(self.carbs),
            fat: round1(self.fat),
        })
    }
}

/// POST /api/workouts
///
/// `activity_type` is one of the fixed activities, or `Other` together with
/// a non-empty `custom_activity`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateWorkoutRequest {
    pub activity_type: String,
    #[validate(length(max = 100, message = "Custom activity must be under 100 characters"))]
    pub custom_activity: Option<String>,
    #[validate(range(min = 1, max = 1440, message = "Duration must be 1-1440 minutes"))]
    pub duration_mins: i32,
    #[validate(range(min = 0.0, message = "Distance must not be negative"))]
    pub distance_km: Option<f64>,
    #[validate(length(max = 2000, message = "Notes must be under 2000 characters"))]
    pub notes: Option<String>,
}

impl CreateWorkoutRequest {
    pub fn into_new(self) -> AppResult<NewWorkout> {
        let activity = self.activity_type.trim();
        let activity_type = if activity.eq_ignore_ascii_case(OTHER_ACTIVITY) {
            self.custom_activity
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .ok_or_else(|| AppError::Validation("Please specify an activity".into()))?
                .to_string()
        } else {
            WORKOUT_ACTIVITIES
                .iter()
                .find(|a| a.eq_ignore_ascii_case(activity))
                .map(|a| a.to_string())
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "Unknown activity '{}'. Use one of {} or {}",
                        activity,
                        WORKOUT_ACTIVITIES.join(", "),
                        OTHER_ACTIVITY
                    ))
                })?
        };

        Ok(NewWorkout {
            activity_type,
            duration_mins: self.duration_mins,
            distance_km: self.distance_km.filter(|d| *d > 0.0),
            notes: self
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
        })
    }
}

// ============================================================================
// Search
// ============================================================================

/// GET /api/notes/search?q=&limit=
#[derive(Debug, Deserialize, Validate)]
pub struct SearchQuery {
    #[validate(length(min = 1, max = 200, message = "Search term must be 1-200 characters"))]
    pub q: String,
    pub limit: Option<i64>,
}

impl SearchQuery {
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(SEARCH_NOTES_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT)
    }
}
