use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::store::RecordStore;
use crate::error::AppResult;
use crate::models::food_log::{FoodLog, NewFoodLog};
use crate::models::note::{NewNote, Note};
use crate::models::profile::{Profile, ProfilePatch};
use crate::models::workout::{NewWorkout, Workout};
use crate::services::calendar::TimeWindow;

/// In-process `RecordStore` with the same ownership rules as `PgStore`.
pub struct MemoryStore {
    default_calorie_target: i32,
    inner: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    profiles: HashMap<i64, Profile>,
    notes: Vec<Note>,
    food_logs: Vec<FoodLog>,
    workouts: Vec<Workout>,
}

impl MemoryStore {
    pub fn new(default_calorie_target: i32) -> Self {
        Self {
            default_calorie_target,
            inner: Mutex::new(Tables::default()),
        }
    }

    pub fn profile_count(&self) -> usize {
        self.inner.lock().unwrap().profiles.len()
    }

    /// Notes + food logs + workouts across every owner.
    pub fn record_count(&self) -> usize {
        let t = self.inner.lock().unwrap();
        t.notes.len() + t.food_logs.len() + t.workouts.len()
    }

    /// Move a record of any kind to another point in time.
    pub fn set_created_at(&self, id: Uuid, at: DateTime<Utc>) {
        let mut t = self.inner.lock().unwrap();
        if let Some(n) = t.notes.iter_mut().find(|n| n.id == id) {
            n.created_at = at;
        }
        if let Some(f) = t.food_logs.iter_mut().find(|f| f.id == id) {
            f.created_at = at;
        }
        if let Some(w) = t.workouts.iter_mut().find(|w| w.id == id) {
            w.created_at = at;
        }
    }

    fn owner(&self, t: &mut Tables, owner_id: i64) -> Profile {
        let target = self.default_calorie_target;
        t.profiles
            .entry(owner_id)
            .or_insert_with(|| {
                let now = Utc::now();
                Profile {
                    id: Uuid::new_v4(),
                    telegram_id: owner_id,
                    current_weight: None,
                    goal_weight: None,
                    daily_calorie_target: Some(target),
                    protein_target: None,
                    carbs_target: None,
                    fat_target: None,
                    created_at: now,
                    updated_at: now,
                }
            })
            .clone()
    }

    fn owner_uuid(t: &Tables, owner_id: i64) -> Option<Uuid> {
        t.profiles.get(&owner_id).map(|p| p.id)
    }
}

fn newest_first<T>(mut rows: Vec<T>, ts: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    rows.sort_by_key(|r| std::cmp::Reverse(ts(r)));
    rows
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn get_or_create_owner(&self, owner_id: i64) -> AppResult<Profile> {
        let mut t = self.inner.lock().unwrap();
        Ok(self.owner(&mut t, owner_id))
    }

    async fn update_owner_profile(&self, owner_id: i64, patch: &ProfilePatch) -> AppResult<Profile> {
        let mut t = self.inner.lock().unwrap();
        self.owner(&mut t, owner_id);
        let profile = t.profiles.get_mut(&owner_id).expect("profile just ensured");
        patch.apply_to(profile);
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    async fn insert_note(&self, owner_id: i64, note: NewNote) -> AppResult<Note> {
        let mut t = self.inner.lock().unwrap();
        let owner = self.owner(&mut t, owner_id);
        let row = Note {
            id: Uuid::new_v4(),
            user_id: owner.id,
            content: note.content,
            summary: note.summary,
            tags: note.tags,
            created_at: Utc::now(),
        };
        t.notes.push(row.clone());
        Ok(row)
    }

    async fn insert_food_log(&self, owner_id: i64, entry: NewFoodLog) -> AppResult<FoodLog> {
        let mut t = self.inner.lock().unwrap();
        let owner = self.owner(&mut t, owner_id);
        let row = FoodLog {
            id: Uuid::new_v4(),
            user_id: owner.id,
            food_description: entry.food_description,
            calories: entry.calories,
            protein: entry.protein,
            carbs: entry.carbs,
            fat: entry.fat,
            created_at: Utc::now(),
        };
        t.food_logs.push(row.clone());
        Ok(row)
    }

    async fn insert_workout(&self, owner_id: i64, entry: NewWorkout) -> AppResult<Workout> {
        let mut t = self.inner.lock().unwrap();
        let owner = self.owner(&mut t, owner_id);
        let row = Workout {
            id: Uuid::new_v4(),
            user_id: owner.id,
            activity_type: entry.activity_type,
            duration_mins: entry.duration_mins,
            distance_km: entry.distance_km,
            notes: entry.notes,
            created_at: Utc::now(),
        };
        t.workouts.push(row.clone());
        Ok(row)
    }

    async fn notes_in_window(&self, owner_id: i64, window: TimeWindow) -> AppResult<Vec<Note>> {
        let t = self.inner.lock().unwrap();
        let Some(uid) = Self::owner_uuid(&t, owner_id) else {
            return Ok(vec![]);
        };
        let rows = t
            .notes
            .iter()
            .filter(|n| n.user_id == uid && window.contains(n.created_at))
            .cloned()
            .collect();
        Ok(newest_first(rows, |n: &Note| n.created_at))
    }

    async fn food_logs_in_window(
        &self,
        owner_id: i64,
        window: TimeWindow,
    ) -> AppResult<Vec<FoodLog>> {
        let t = self.inner.lock().unwrap();
        let Some(uid) = Self::owner_uuid(&t, owner_id) else {
            return Ok(vec![]);
        };
        let rows = t
            .food_logs
            .iter()
            .filter(|f| f.user_id == uid && window.contains(f.created_at))
            .cloned()
            .collect();
        Ok(newest_first(rows, |f: &FoodLog| f.created_at))
    }

    async fn workouts_in_window(
        &self,
        owner_id: i64,
        window: TimeWindow,
    ) -> AppResult<Vec<Workout>> {
        let t = self.inner.lock().unwrap();
        let Some(uid) = Self::owner_uuid(&t, owner_id) else {
            return Ok(vec![]);
        };
        let rows = t
            .workouts
            .iter()
            .filter(|w| w.user_id == uid && window.contains(w.created_at))
            .cloned()
            .collect();
        Ok(newest_first(rows, |w: &Workout| w.created_at))
    }

    async fn recent_notes(&self, owner_id: i64, limit: i64) -> AppResult<Vec<Note>> {
        let t = self.inner.lock().unwrap();
        let Some(uid) = Self::owner_uuid(&t, owner_id) else {
            return Ok(vec![]);
        };
        let rows = t.notes.iter().filter(|n| n.user_id == uid).cloned().collect();
        let mut rows = newest_first(rows, |n: &Note| n.created_at);
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn search_notes(&self, owner_id: i64, keyword: &str, limit: i64) -> AppResult<Vec<Note>> {
        let t = self.inner.lock().unwrap();
        let Some(uid) = Self::owner_uuid(&t, owner_id) else {
            return Ok(vec![]);
        };
        let needle = keyword.to_lowercase();
        let rows = t
            .notes
            .iter()
            .filter(|n| {
                n.user_id == uid
                    && (n.content.to_lowercase().contains(&needle)
                        || n.summary.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        let mut rows = newest_first(rows, |n: &Note| n.created_at);
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn delete_note(&self, owner_id: i64, id: Uuid) -> AppResult<bool> {
        let mut t = self.inner.lock().unwrap();
        let Some(uid) = Self::owner_uuid(&t, owner_id) else {
            return Ok(false);
        };
        let before = t.notes.len();
        t.notes.retain(|n| !(n.id == id && n.user_id == uid));
        Ok(t.notes.len() < before)
    }

    async fn delete_food_log(&self, owner_id: i64, id: Uuid) -> AppResult<bool> {
        let mut t = self.inner.lock().unwrap();
        let Some(uid) = Self::owner_uuid(&t, owner_id) else {
            return Ok(false);
        };
        let before = t.food_logs.len();
        t.food_logs.retain(|f| !(f.id == id && f.user_id == uid));
        Ok(t.food_logs.len() < before)
    }

    async fn delete_workout(&self, owner_id: i64, id: Uuid) -> AppResult<bool> {
        let mut t = self.inner.lock().unwrap();
        let Some(uid) = Self::owner_uuid(&t, owner_id) else {
            return Ok(false);
        };
        let before = t.workouts.len();
        t.workouts.retain(|w| !(w.id == id && w.user_id == uid));
        Ok(t.workouts.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::calendar::Calendar;

    fn food(desc: &str, calories: i32) -> NewFoodLog {
        NewFoodLog {
            food_description: desc.into(),
            calories,
            protein: 0.0,
            carbs: 0.0,
            fat: 0.0,
        }
    }

    fn note(content: &str, summary: &str) -> NewNote {
        NewNote {
            content: content.into(),
            summary: summary.into(),
            tags: vec![],
        }
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let store = MemoryStore::new(2000);
        let a = store.get_or_create_owner(7).await.unwrap();
        let b = store.get_or_create_owner(7).await.unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.daily_calorie_target, Some(2000));
        assert_eq!(store.profile_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_twice_reports_not_found_second_time() {
        let store = MemoryStore::new(2000);
        let row = store.insert_food_log(1, food("toast", 200)).await.unwrap();
        assert!(store.delete_food_log(1, row.id).await.unwrap());
        assert!(!store.delete_food_log(1, row.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_foreign_record_is_not_found() {
        let store = MemoryStore::new(2000);
        let row = store.insert_note(1, note("secret", "mine")).await.unwrap();
        store.get_or_create_owner(2).await.unwrap();

        assert!(!store.delete_note(2, row.id).await.unwrap());
        assert!(!store.delete_note(3, row.id).await.unwrap());
        assert!(!store.delete_note(2, Uuid::new_v4()).await.unwrap());
        assert_eq!(store.record_count(), 1);
    }

    #[tokio::test]
    async fn test_search_matches_content_or_summary_once() {
        let store = MemoryStore::new(2000);
        let both = store
            .insert_note(1, note("Call the Dentist", "dentist reminder"))
            .await
            .unwrap();
        let older = store
            .insert_note(1, note("teeth", "Dentist at 3pm"))
            .await
            .unwrap();
        store.set_created_at(older.id, Utc::now() - chrono::Duration::hours(2));
        store.insert_note(1, note("groceries", "shopping")).await.unwrap();
        store.insert_note(2, note("dentist", "someone else")).await.unwrap();

        let hits = store.search_notes(1, "DENTIST", 5).await.unwrap();
        let ids: Vec<Uuid> = hits.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![both.id, older.id]);

        let limited = store.search_notes(1, "dentist", 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_window_is_inclusive_on_both_ends() {
        let store = MemoryStore::new(2000);
        let cal = Calendar::new(chrono_tz::UTC);
        let day = chrono::NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let window = cal.day(day);

        let first = store.insert_food_log(1, food("first", 100)).await.unwrap();
        let last = store.insert_food_log(1, food("last", 100)).await.unwrap();
        let next = store.insert_food_log(1, food("next", 100)).await.unwrap();
        store.set_created_at(first.id, window.start);
        store.set_created_at(last.id, window.end);
        store.set_created_at(next.id, window.end + chrono::Duration::microseconds(1));

        let rows = store.food_logs_in_window(1, window).await.unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.food_description.as_str()).collect();
        assert_eq!(names, vec!["last", "first"]);
    }
}
