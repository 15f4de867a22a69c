pub mod food_log;
pub mod note;
pub mod profile;
pub mod workout;
