use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FoodLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food_description: String,
    pub calories: i32,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub created_at: DateTime<Utc>,
}

/// Macros are expected to be rounded to one decimal before insert.
#[derive(Debug, Clone)]
pub struct NewFoodLog {
    pub food_description: String,
    pub calories: i32,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}
