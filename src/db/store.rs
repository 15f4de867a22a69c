use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::food_log::{FoodLog, NewFoodLog};
use crate::models::note::{NewNote, Note};
use crate::models::profile::{Profile, ProfilePatch};
use crate::models::workout::{NewWorkout, Workout};
use crate::services::calendar::TimeWindow;

/// Owner-scoped persistence for profiles and the three record kinds.
///
/// Owners are addressed by their external numeric id. Every list is
/// newest-first. Deletes return `false` when the id does not exist or belongs
/// to another owner; callers cannot tell the two apart.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn ping(&self) -> AppResult<()>;

    /// Idempotent upsert: returns the existing profile or creates one with the default calorie target.
    async fn get_or_create_owner(&self, owner_id: i64) -> AppResult<Profile>;
    async fn update_owner_profile(&self, owner_id: i64, patch: &ProfilePatch) -> AppResult<Profile>;

    async fn insert_note(&self, owner_id: i64, note: NewNote) -> AppResult<Note>;
    async fn insert_food_log(&self, owner_id: i64, entry: NewFoodLog) -> AppResult<FoodLog>;
    async fn insert_workout(&self, owner_id: i64, entry: NewWorkout) -> AppResult<Workout>;

    async fn notes_in_window(&self, owner_id: i64, window: TimeWindow) -> AppResult<Vec<Note>>;
    async fn food_logs_in_window(&self, owner_id: i64, window: TimeWindow)
        -> AppResult<Vec<FoodLog>>;
    async fn workouts_in_window(&self, owner_id: i64, window: TimeWindow)
        -> AppResult<Vec<Workout>>;

    async fn recent_notes(&self, owner_id: i64, limit: i64) -> AppResult<Vec<Note>>;
    /// Case-insensitive match against content or summary, deduplicated.
    async fn search_notes(&self, owner_id: i64, keyword: &str, limit: i64) -> AppResult<Vec<Note>>;

    async fn delete_note(&self, owner_id: i64, id: Uuid) -> AppResult<bool>;
    async fn delete_food_log(&self, owner_id: i64, id: Uuid) -> AppResult<bool>;
    async fn delete_workout(&self, owner_id: i64, id: Uuid) -> AppResult<bool>;
}

pub struct PgStore {
    pool: PgPool,
    default_calorie_target: i32,
}

impl PgStore {
    pub fn new(pool: PgPool, default_calorie_target: i32) -> Self {
        Self {
            pool,
            default_calorie_target,
        }
    }
}

/// Escape LIKE metacharacters so a keyword matches literally.
pub fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl RecordStore for PgStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_or_create_owner(&self, owner_id: i64) -> AppResult<Profile> {
        // No-op update so RETURNING yields the existing row on conflict
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, telegram_id, daily_calorie_target)
            VALUES ($1, $2, $3)
            ON CONFLICT (telegram_id) DO UPDATE
                SET telegram_id = profiles.telegram_id
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(self.default_calorie_target)
        .fetch_one(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn update_owner_profile(&self, owner_id: i64, patch: &ProfilePatch) -> AppResult<Profile> {
        self.get_or_create_owner(owner_id).await?;

        let profile = sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles SET
                current_weight = COALESCE($2, current_weight),
                goal_weight = COALESCE($3, goal_weight),
                daily_calorie_target = COALESCE($4, daily_calorie_target),
                protein_target = COALESCE($5, protein_target),
                carbs_target = COALESCE($6, carbs_target),
                fat_target = COALESCE($7, fat_target),
                updated_at = NOW()
            WHERE telegram_id = $1
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(patch.current_weight)
        .bind(patch.goal_weight)
        .bind(patch.daily_calorie_target)
        .bind(patch.protein_target)
        .bind(patch.carbs_target)
        .bind(patch.fat_target)
        .fetch_one(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn insert_note(&self, owner_id: i64, note: NewNote) -> AppResult<Note> {
        let owner = self.get_or_create_owner(owner_id).await?;

        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (id, user_id, content, summary, tags)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner.id)
        .bind(&note.content)
        .bind(&note.summary)
        .bind(&note.tags)
        .fetch_one(&self.pool)
        .await?;

        Ok(note)
    }

    async fn insert_food_log(&self, owner_id: i64, entry: NewFoodLog) -> AppResult<FoodLog> {
        let owner = self.get_or_create_owner(owner_id).await?;

        let log = sqlx::query_as::<_, FoodLog>(
            r#"
            INSERT INTO food_logs (id, user_id, food_description, calories, protein, carbs, fat)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner.id)
        .bind(&entry.food_description)
        .bind(entry.calories)
        .bind(entry.protein)
        .bind(entry.carbs)
        .bind(entry.fat)
        .fetch_one(&self.pool)
        .await?;

        Ok(log)
    }

    async fn insert_workout(&self, owner_id: i64, entry: NewWorkout) -> AppResult<Workout> {
        let owner = self.get_or_create_owner(owner_id).await?;

        let workout = sqlx::query_as::<_, Workout>(
            r#"
            INSERT INTO workouts (id, user_id, activity_type, duration_mins, distance_km, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner.id)
        .bind(&entry.activity_type)
        .bind(entry.duration_mins)
        .bind(entry.distance_km)
        .bind(&entry.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(workout)
    }

    async fn notes_in_window(&self, owner_id: i64, window: TimeWindow) -> AppResult<Vec<Note>> {
        let notes = sqlx::query_as::<_, Note>(
            r#"
            SELECT n.* FROM notes n
            JOIN profiles p ON p.id = n.user_id
            WHERE p.telegram_id = $1 AND n.created_at >= $2 AND n.created_at <= $3
            ORDER BY n.created_at DESC
            "#,
        )
        .bind(owner_id)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(notes)
    }

    async fn food_logs_in_window(
        &self,
        owner_id: i64,
        window: TimeWindow,
    ) -> AppResult<Vec<FoodLog>> {
        let logs = sqlx::query_as::<_, FoodLog>(
            r#"
            SELECT f.* FROM food_logs f
            JOIN profiles p ON p.id = f.user_id
            WHERE p.telegram_id = $1 AND f.created_at >= $2 AND f.created_at <= $3
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(owner_id)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn workouts_in_window(
        &self,
        owner_id: i64,
        window: TimeWindow,
    ) -> AppResult<Vec<Workout>> {
        let workouts = sqlx::query_as::<_, Workout>(
            r#"
            SELECT w.* FROM workouts w
            JOIN profiles p ON p.id = w.user_id
            WHERE p.telegram_id = $1 AND w.created_at >= $2 AND w.created_at <= $3
            ORDER BY w.created_at DESC
            "#,
        )
        .bind(owner_id)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(workouts)
    }

    async fn recent_notes(&self, owner_id: i64, limit: i64) -> AppResult<Vec<Note>> {
        let notes = sqlx::query_as::<_, Note>(
            r#"
            SELECT n.* FROM notes n
            JOIN profiles p ON p.id = n.user_id
            WHERE p.telegram_id = $1
            ORDER BY n.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(notes)
    }

    async fn search_notes(&self, owner_id: i64, keyword: &str, limit: i64) -> AppResult<Vec<Note>> {
        // One query over both columns, so a note matching twice appears once
        let notes = sqlx::query_as::<_, Note>(
            r#"
            SELECT n.* FROM notes n
            JOIN profiles p ON p.id = n.user_id
            WHERE p.telegram_id = $1
              AND (n.content ILIKE $2 OR n.summary ILIKE $2)
            ORDER BY n.created_at DESC
            LIMIT $3
            "#,
        )
        .bind(owner_id)
        .bind(like_pattern(keyword))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(notes)
    }

    async fn delete_note(&self, owner_id: i64, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM notes
            WHERE id = $1 AND user_id = (SELECT id FROM profiles WHERE telegram_id = $2)
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_food_log(&self, owner_id: i64, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM food_logs
            WHERE id = $1 AND user_id = (SELECT id FROM profiles WHERE telegram_id = $2)
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_workout(&self, owner_id: i64, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM workouts
            WHERE id = $1 AND user_id = (SELECT id FROM profiles WHERE telegram_id = $2)
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
