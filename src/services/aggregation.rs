//! Daily summaries, range views and the wellness context bundle.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::db::RecordStore;
use crate::error::AppResult;
use crate::models::food_log::FoodLog;
use crate::models::note::Note;
use crate::models::profile::{round1, MacroTargets, Profile};
use crate::models::workout::Workout;
use crate::services::calendar::Calendar;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NutritionTotals {
    pub calories: i64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub entries: usize,
}

impl NutritionTotals {
    pub fn from_logs<'a>(logs: impl IntoIterator<Item = &'a FoodLog>) -> Self {
        let mut totals = logs.into_iter().fold(Self::default(), |mut acc, log| {
            acc.add(log);
            acc
        });
        totals.round();
        totals
    }

    fn add(&mut self, log: &FoodLog) {
        self.calories += i64::from(log.calories);
        self.protein += log.protein;
        self.carbs += log.carbs;
        self.fat += log.fat;
        self.entries += 1;
    }

    fn round(&mut self) {
        self.protein = round1(self.protein);
        self.carbs = round1(self.carbs);
        self.fat = round1(self.fat);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_calories: i64,
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fat: f64,
    pub calories_target: Option<i32>,
    /// `None` when no target is set; may be negative when over target.
    pub calories_remaining: Option<i64>,
    pub food_entry_count: usize,
    pub workout_count: usize,
    pub workout_minutes: i64,
    pub note_count: usize,
}

pub fn summarize_day(
    date: NaiveDate,
    profile: &Profile,
    food: &[FoodLog],
    workouts: &[Workout],
    note_count: usize,
) -> DailySummary {
    let nutrition = NutritionTotals::from_logs(food);
    let calories_target = profile.calorie_target();

    DailySummary {
        date,
        total_calories: nutrition.calories,
        total_protein: nutrition.protein,
        total_carbs: nutrition.carbs,
        total_fat: nutrition.fat,
        calories_target,
        calories_remaining: calories_target.map(|t| i64::from(t) - nutrition.calories),
        food_entry_count: nutrition.entries,
        workout_count: workouts.len(),
        workout_minutes: total_minutes(workouts),
        note_count,
    }
}

pub async fn daily_summary(
    store: &dyn RecordStore,
    calendar: &Calendar,
    owner_id: i64,
    date: NaiveDate,
) -> AppResult<DailySummary> {
    let profile = store.get_or_create_owner(owner_id).await?;
    let window = calendar.day(date);
    let food = store.food_logs_in_window(owner_id, window).await?;
    let workouts = store.workouts_in_window(owner_id, window).await?;
    let notes = store.notes_in_window(owner_id, window).await?;

    Ok(summarize_day(date, &profile, &food, &workouts, notes.len()))
}

pub fn total_minutes(workouts: &[Workout]) -> i64 {
    workouts.iter().map(|w| i64::from(w.duration_mins)).sum()
}

// ── Per-day grouping ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub nutrition: NutritionTotals,
    pub workout_count: usize,
    pub workout_minutes: i64,
    pub note_count: usize,
    /// Oldest first within the day.
    pub foods: Vec<FoodLog>,
}

impl DayBucket {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            nutrition: NutritionTotals::default(),
            workout_count: 0,
            workout_minutes: 0,
            note_count: 0,
            foods: Vec::new(),
        }
    }
}

/// Records grouped by the local calendar day of their creation timestamp.
///
/// Only days with at least one record appear. Iterate with [`ascending`] for
/// charts and [`descending`] for lists.
///
/// [`ascending`]: DailyBuckets::ascending
/// [`descending`]: DailyBuckets::descending
#[derive(Debug, Clone, Default)]
pub struct DailyBuckets {
    days: BTreeMap<NaiveDate, DayBucket>,
}

impl DailyBuckets {
    pub fn build(
        calendar: &Calendar,
        food: &[FoodLog],
        workouts: &[Workout],
        notes: &[Note],
    ) -> Self {
        let mut days: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();

        for log in food {
            let date = calendar.local_date(log.created_at);
            let bucket = days.entry(date).or_insert_with(|| DayBucket::empty(date));
            bucket.nutrition.add(log);
            bucket.foods.push(log.clone());
        }
        for w in workouts {
            let date = calendar.local_date(w.created_at);
            let bucket = days.entry(date).or_insert_with(|| DayBucket::empty(date));
            bucket.workout_count += 1;
            bucket.workout_minutes += i64::from(w.duration_mins);
        }
        for n in notes {
            let date = calendar.local_date(n.created_at);
            days.entry(date)
                .or_insert_with(|| DayBucket::empty(date))
                .note_count += 1;
        }

        for bucket in days.values_mut() {
            bucket.nutrition.round();
            bucket.foods.sort_by_key(|f| f.created_at);
        }

        Self { days }
    }

    pub fn ascending(&self) -> impl Iterator<Item = &DayBucket> {
        self.days.values()
    }

    pub fn descending(&self) -> impl Iterator<Item = &DayBucket> {
        self.days.values().rev()
    }

    pub fn days_with_food(&self) -> usize {
        self.days.values().filter(|b| b.nutrition.entries > 0).count()
    }
}

// ── Dashboard range overview ─────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RangeMetrics {
    pub range_days: i64,
    pub total_calories: i64,
    /// Total calories over every day in the range, logged or not.
    pub avg_daily_calories: i64,
    pub workout_count: usize,
    pub workout_minutes: i64,
    pub note_count: usize,
}

#[derive(Debug, Serialize)]
pub struct DayPoint {
    pub date: NaiveDate,
    pub calories: i64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub workout_minutes: i64,
    pub note_count: usize,
}

#[derive(Debug, Serialize)]
pub struct MealLogDay {
    pub date: NaiveDate,
    pub totals: NutritionTotals,
    pub entries: Vec<FoodLog>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ActivityCount {
    pub activity_type: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct WeightProgress {
    pub current_weight: Option<f64>,
    pub goal_weight: Option<f64>,
    pub to_lose: Option<f64>,
    pub goal_reached: bool,
}

#[derive(Debug, Serialize)]
pub struct RangeOverview {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub metrics: RangeMetrics,
    pub macro_totals: NutritionTotals,
    pub calories_target: Option<i32>,
    pub macro_targets: Option<MacroTargets>,
    pub daily_series: Vec<DayPoint>,
    pub meal_log: Vec<MealLogDay>,
    pub workout_frequency: Vec<ActivityCount>,
    pub weight: WeightProgress,
}

pub async fn range_overview(
    store: &dyn RecordStore,
    calendar: &Calendar,
    owner_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<RangeOverview> {
    let window = calendar.window(start, end)?;
    let profile = store.get_or_create_owner(owner_id).await?;
    let food = store.food_logs_in_window(owner_id, window).await?;
    let workouts = store.workouts_in_window(owner_id, window).await?;
    let notes = store.notes_in_window(owner_id, window).await?;

    Ok(build_overview(calendar, &profile, start, end, &food, &workouts, &notes))
}

pub fn build_overview(
    calendar: &Calendar,
    profile: &Profile,
    start: NaiveDate,
    end: NaiveDate,
    food: &[FoodLog],
    workouts: &[Workout],
    notes: &[Note],
) -> RangeOverview {
    let buckets = DailyBuckets::build(calendar, food, workouts, notes);
    let totals = NutritionTotals::from_logs(food);
    let range_days = ((end - start).num_days() + 1).max(1);

    let daily_series = buckets
        .ascending()
        .map(|b| DayPoint {
            date: b.date,
            calories: b.nutrition.calories,
            protein: b.nutrition.protein,
            carbs: b.nutrition.carbs,
            fat: b.nutrition.fat,
            workout_minutes: b.workout_minutes,
            note_count: b.note_count,
        })
        .collect();

    let meal_log = buckets
        .descending()
        .filter(|b| !b.foods.is_empty())
        .map(|b| MealLogDay {
            date: b.date,
            totals: b.nutrition,
            entries: b.foods.clone(),
        })
        .collect();

    let to_lose = profile.weight_to_goal();
    RangeOverview {
        start_date: start,
        end_date: end,
        metrics: RangeMetrics {
            range_days,
            total_calories: totals.calories,
            avg_daily_calories: totals.calories / range_days,
            workout_count: workouts.len(),
            workout_minutes: total_minutes(workouts),
            note_count: notes.len(),
        },
        macro_totals: totals,
        calories_target: profile.calorie_target(),
        macro_targets: profile.macro_targets(),
        daily_series,
        meal_log,
        workout_frequency: workout_frequency(workouts),
        weight: WeightProgress {
            current_weight: profile.current_weight,
            goal_weight: profile.goal_weight,
            to_lose: to_lose.filter(|d| *d > 0.0),
            goal_reached: to_lose.is_some_and(|d| d <= 0.0),
        },
    }
}

/// Most frequent wellness tags across `notes`, ties alphabetical.
pub fn wellness_tag_counts(notes: &[Note], limit: usize) -> Vec<TagCount> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for tag in notes.iter().flat_map(|n| n.wellness_tags()) {
        *counts.entry(tag.trim().to_lowercase()).or_default() += 1;
    }
    let mut out: Vec<TagCount> = counts
        .into_iter()
        .map(|(tag, count)| TagCount { tag, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out.truncate(limit);
    out
}

/// Sessions per activity, most frequent first, ties alphabetical.
pub fn workout_frequency(workouts: &[Workout]) -> Vec<ActivityCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for w in workouts {
        *counts.entry(w.activity_type.as_str()).or_default() += 1;
    }
    let mut out: Vec<ActivityCount> = counts
        .into_iter()
        .map(|(activity, count)| ActivityCount {
            activity_type: activity.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

// ── Wellness context ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct DailyNutrition {
    pub date: NaiveDate,
    pub calories: i64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub entries: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutItem {
    pub date: NaiveDate,
    pub activity_type: String,
    pub duration_mins: i32,
    pub distance_km: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaggedNote {
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub summary: String,
    pub content: String,
    pub tags: Vec<String>,
    pub wellness_tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Wellness tags shown on the dashboard.
pub const TOP_WELLNESS_TAGS: usize = 5;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WellnessTotals {
    pub food_entries: usize,
    pub workout_count: usize,
    pub note_count: usize,
    /// Averaged over days that have at least one food entry.
    pub avg_daily_calories: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WellnessContext {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: u32,
    pub daily_nutrition: Vec<DailyNutrition>,
    pub workouts: Vec<WorkoutItem>,
    pub tagged_notes: Vec<TaggedNote>,
    pub wellness_tag_counts: Vec<TagCount>,
    pub totals: WellnessTotals,
}

impl WellnessContext {
    pub fn is_empty(&self) -> bool {
        self.totals.food_entries == 0 && self.totals.workout_count == 0 && self.totals.note_count == 0
    }
}

pub async fn wellness_context(
    store: &dyn RecordStore,
    calendar: &Calendar,
    owner_id: i64,
    days: u32,
) -> AppResult<WellnessContext> {
    let days = days.max(1);
    let (start, end) = calendar.trailing(days);
    let window = calendar.window(start, end)?;
    let food = store.food_logs_in_window(owner_id, window).await?;
    let workouts = store.workouts_in_window(owner_id, window).await?;
    let notes = store.notes_in_window(owner_id, window).await?;

    Ok(build_wellness(calendar, start, end, days, &food, &workouts, &notes))
}

pub fn build_wellness(
    calendar: &Calendar,
    start: NaiveDate,
    end: NaiveDate,
    days: u32,
    food: &[FoodLog],
    workouts: &[Workout],
    notes: &[Note],
) -> WellnessContext {
    let buckets = DailyBuckets::build(calendar, food, &[], &[]);

    let daily_nutrition: Vec<DailyNutrition> = buckets
        .ascending()
        .map(|b| DailyNutrition {
            date: b.date,
            calories: b.nutrition.calories,
            protein: b.nutrition.protein,
            carbs: b.nutrition.carbs,
            fat: b.nutrition.fat,
            entries: b.nutrition.entries,
        })
        .collect();

    let mut workout_items: Vec<WorkoutItem> = workouts
        .iter()
        .map(|w| WorkoutItem {
            date: calendar.local_date(w.created_at),
            activity_type: w.activity_type.clone(),
            duration_mins: w.duration_mins,
            distance_km: w.distance_km,
            notes: w.notes.clone(),
        })
        .collect();
    workout_items.sort_by_key(|w| w.date);

    let mut tagged_notes: Vec<TaggedNote> = notes
        .iter()
        .filter(|n| !n.tags.is_empty())
        .map(|n| TaggedNote {
            date: calendar.local_date(n.created_at),
            created_at: n.created_at,
            summary: n.summary.clone(),
            content: n.content.clone(),
            tags: n.tags.clone(),
            wellness_tags: n.wellness_tags().into_iter().map(str::to_string).collect(),
        })
        .collect();
    tagged_notes.sort_by_key(|n| n.created_at);

    let total_calories: i64 = daily_nutrition.iter().map(|d| d.calories).sum();
    let logged_days = buckets.days_with_food() as i64;
    let avg_daily_calories = if logged_days > 0 {
        total_calories / logged_days
    } else {
        0
    };

    WellnessContext {
        start_date: start,
        end_date: end,
        days,
        daily_nutrition,
        workouts: workout_items,
        tagged_notes,
        wellness_tag_counts: wellness_tag_counts(notes, TOP_WELLNESS_TAGS),
        totals: WellnessTotals {
            food_entries: food.len(),
            workout_count: workouts.len(),
            note_count: notes.len(),
            avg_daily_calories,
        },
    }
}
