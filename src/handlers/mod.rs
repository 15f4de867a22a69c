pub mod dashboard;
pub mod food_logs;
pub mod health;
pub mod insights;
pub mod messages;
pub mod notes;
pub mod profile;
pub mod workouts;
