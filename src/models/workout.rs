use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Activities offered by the manual entry form. Anything else goes through `Other`.
pub const WORKOUT_ACTIVITIES: [&str; 7] = [
    "Running",
    "Cycling",
    "Swimming",
    "Strength Training",
    "Yoga",
    "Walking",
    "HIIT",
];

pub const OTHER_ACTIVITY: &str = "Other";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Workout {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_type: String,
    pub duration_mins: i32,
    pub distance_km: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWorkout {
    pub activity_type: String,
    pub duration_mins: i32,
    pub distance_km: Option<f64>,
    pub notes: Option<String>,
}
