//! Oracle instructions and prompt builders. No I/O happens here.

use std::fmt::Write as _;

use chrono::NaiveDate;

use crate::models::food_log::FoodLog;
use crate::models::profile::{round1, Profile};
use crate::services::aggregation::{DailySummary, WellnessContext};

pub const CLASSIFICATION_MAX_TOKENS: u32 = 1024;
pub const SUMMARY_MAX_TOKENS: u32 = 300;
pub const RECOMMENDATION_MAX_TOKENS: u32 = 600;
pub const INSIGHTS_MAX_TOKENS: u32 = 1500;

pub const CLASSIFICATION_SYSTEM_PROMPT: &str = r#"You route messages for a personal life tracker.

Decide whether each message should be SAVED as a record or is a QUESTION that needs a direct reply.

There are exactly four types:
1. note     - thoughts, ideas, reminders, journal entries, observations about mood, energy, sleep, stress or productivity
2. food     - a meal, snack or drink the user ate or is eating now
3. workout  - exercise or physical activity the user did or just finished
4. question - anything the user asks, or any conversational message that wants a reply

## Save or answer

Statements about what happened, or what to remember, are saved:
  "Had eggs for breakfast" -> food
  "I'm having pizza" -> food
  "Remember to call the dentist" -> note
  "Going to the gym tomorrow" -> note
  "Slept badly, only 5 hours" -> note with tags ["sleep"]
  "Just finished a 30 min run" -> workout

Questions, requests and small talk are answered:
  "How many calories in a banana?" -> question
  "What should I eat for dinner?" -> question
  "Did I log anything today?" -> question (point the user at /summary)
  "What were my notes last week?" -> question (point the user at /notes week)
  "Hi" / "Thanks" -> question

## Rules
- Reply with a single JSON object and nothing else. No markdown, no code fences, no commentary.
- Always include "confidence" between 0.0 and 1.0.
- When unsure between note and question, choose question. Do not clutter the user's history.
- Present-tense eating is food. Future plans are notes.
- Observations about mood, energy, sleep, stress, productivity, focus, motivation, social life or health are notes tagged with the matching word.

## Formats

question:
{"type": "question", "confidence": 0.95, "answer": "A medium banana has about 100 calories, 27g carbs, 1g protein and almost no fat."}

note:
{"type": "note", "confidence": 0.92, "content": "<the original message>", "summary": "<one-sentence title>", "tags": ["tag1", "tag2"]}

food:
{"type": "food", "confidence": 0.95, "food_description": "Grilled chicken breast with rice", "calories": 450, "protein": 45.0, "carbs": 35.0, "fat": 12.0}

workout:
{"type": "workout", "confidence": 0.95, "activity_type": "Running", "duration_mins": 30, "distance_km": 5.0, "notes": "Morning run, felt strong"}

## Food estimates
- calories is a whole number; protein, carbs and fat are grams.
- Use standard portions: chicken breast about 150g (250 kcal), a pizza slice about 280 kcal, a banana about 100 kcal.
- Assume a medium portion when the quantity is vague and estimate conservatively.
- When the user states numbers, use them.

## Workout extraction
- Approximate durations become whole minutes ("about 30 mins" -> 30). The minimum is 1.
- distance_km only for cardio; null for strength, yoga and similar.

## Examples

Input: "Just had a chicken caesar salad for lunch"
Output: {"type": "food", "confidence": 0.96, "food_description": "Chicken caesar salad", "calories": 450, "protein": 35.0, "carbs": 20.0, "fat": 28.0}

Input: "How many calories in a chicken caesar salad?"
Output: {"type": "question", "confidence": 0.98, "answer": "A typical chicken caesar salad has 400-500 calories: roughly 35g protein, 20g carbs and 25-30g fat depending on the dressing."}

Input: "30 min run this morning, felt great!"
Output: {"type": "workout", "confidence": 0.98, "activity_type": "Running", "duration_mins": 30, "distance_km": null, "notes": "Felt great"}

Input: "Need to remember to call mom tomorrow"
Output: {"type": "note", "confidence": 0.95, "content": "Need to remember to call mom tomorrow", "summary": "Reminder: call mom tomorrow", "tags": ["reminder", "family"]}

Input: "Feeling drained today, barely got anything done"
Output: {"type": "note", "confidence": 0.9, "content": "Feeling drained today, barely got anything done", "summary": "Low energy and productivity", "tags": ["energy", "productivity"]}

Input: "hi"
Output: {"type": "question", "confidence": 0.99, "answer": "Hey! Send me what you ate, a workout, or a thought to save, or ask me anything. Type /help to see all commands."}

Input: "Am I on track with my calories today?"
Output: {"type": "question", "confidence": 0.97, "answer": "Use /summary to see today's calories against your target."}

Output JSON only."#;

pub fn classification_prompt(utterance: &str) -> String {
    format!(
        "Classify this message and respond with JSON only:\n\n\"{}\"",
        utterance
    )
}

/// Meal slot for the local hour: breakfast before 11, lunch before 15,
/// dinner before 20, evening snack after.
pub fn meal_slot(hour: u32) -> &'static str {
    match hour {
        0..=10 => "breakfast",
        11..=14 => "lunch",
        15..=19 => "dinner",
        _ => "evening snack",
    }
}

pub fn summary_prompt(summary: &DailySummary) -> String {
    let target = summary
        .calories_target
        .map(|t| t.to_string())
        .unwrap_or_else(|| "no target".into());

    format!(
        "Write a friendly daily summary from this data.\n\n\
         Date: {date}\n\n\
         Nutrition:\n\
         - Calories: {total} / {target} kcal\n\
         - Protein: {protein}g\n\
         - Carbs: {carbs}g\n\
         - Fat: {fat}g\n\
         - Food entries: {food}\n\n\
         Activity:\n\
         - Workouts: {workouts}\n\
         - Workout time: {minutes} minutes\n\n\
         Notes recorded: {notes}\n\n\
         Keep it to 3-4 encouraging sentences. Point out progress and one thing to focus on. \
         Be motivating but realistic.",
        date = summary.date.format("%A, %B %d, %Y"),
        total = summary.total_calories,
        target = target,
        protein = summary.total_protein,
        carbs = summary.total_carbs,
        fat = summary.total_fat,
        food = summary.food_entry_count,
        workouts = summary.workout_count,
        minutes = summary.workout_minutes,
        notes = summary.note_count,
    )
}

pub fn recommendation_prompt(
    profile: &Profile,
    summary: &DailySummary,
    foods: &[FoodLog],
    slot: &str,
) -> String {
    let mut p = String::new();
    let _ = writeln!(
        p,
        "Suggest what I should eat for {} today. Keep it practical: two or three concrete options with rough calories and macros, then one sentence on why they fit.",
        slot
    );

    p.push_str("\nEaten so far today:\n");
    if foods.is_empty() {
        p.push_str("- nothing logged yet\n");
    }
    for f in foods {
        let _ = writeln!(
            p,
            "- {}: {} kcal, P {}g, C {}g, F {}g",
            f.food_description, f.calories, f.protein, f.carbs, f.fat
        );
    }

    p.push_str("\nBudget for the rest of the day:\n");
    match (summary.calories_target, summary.calories_remaining) {
        (Some(target), Some(remaining)) if remaining >= 0 => {
            let _ = writeln!(p, "- Calories: {} kcal left of {}", remaining, target);
        }
        (Some(target), Some(remaining)) => {
            let _ = writeln!(
                p,
                "- Calories: already {} kcal over the {} target, suggest something light",
                -remaining, target
            );
        }
        _ => {
            let _ = writeln!(
                p,
                "- Calories: no target set ({} kcal eaten)",
                summary.total_calories
            );
        }
    }
    match profile.macro_targets() {
        Some(t) => {
            for (label, eaten, target) in [
                ("Protein", summary.total_protein, t.protein),
                ("Carbs", summary.total_carbs, t.carbs),
                ("Fat", summary.total_fat, t.fat),
            ] {
                match target {
                    Some(target) => {
                        let _ = writeln!(p, "- {}: {}g left", label, round1(target - eaten));
                    }
                    None => {
                        let _ = writeln!(p, "- {}: no target ({}g so far)", label, eaten);
                    }
                }
            }
        }
        None => {
            let _ = writeln!(
                p,
                "- No macro targets set (so far: P {}g, C {}g, F {}g)",
                summary.total_protein, summary.total_carbs, summary.total_fat
            );
        }
    }

    if let Some(diff) = profile.weight_to_goal().filter(|d| *d > 0.0) {
        let _ = writeln!(p, "\nI want to lose another {}kg.", diff);
    }
    p
}

pub fn insights_prompt(ctx: &WellnessContext, profile: &Profile) -> String {
    let mut p = String::new();
    let _ = writeln!(
        p,
        "Here is my tracking data for the last {} days ({} to {}). \
         Find patterns between what I eat, how I train, and how I feel. \
         Give 3-5 specific insights, each backed by the data, and finish with two actionable suggestions.",
        ctx.days,
        fmt_date(ctx.start_date),
        fmt_date(ctx.end_date)
    );

    p.push_str("\n## Nutrition by day\n");
    if ctx.daily_nutrition.is_empty() {
        p.push_str("No food logged.\n");
    }
    for d in &ctx.daily_nutrition {
        let _ = writeln!(
            p,
            "- {}: {} kcal, P {}g, C {}g, F {}g ({} entries)",
            fmt_date(d.date),
            d.calories,
            d.protein,
            d.carbs,
            d.fat,
            d.entries
        );
    }
    if let Some(target) = profile.calorie_target() {
        let _ = writeln!(p, "Daily calorie target: {} kcal", target);
    }
    let _ = writeln!(
        p,
        "Average on logged days: {} kcal",
        ctx.totals.avg_daily_calories
    );

    p.push_str("\n## Workouts\n");
    if ctx.workouts.is_empty() {
        p.push_str("No workouts logged.\n");
    }
    for w in &ctx.workouts {
        let _ = write!(p, "- {}: {} for {} mins", fmt_date(w.date), w.activity_type, w.duration_mins);
        if let Some(km) = w.distance_km {
            let _ = write!(p, ", {} km", km);
        }
        if let Some(notes) = w.notes.as_deref().filter(|n| !n.is_empty()) {
            let _ = write!(p, " ({})", notes);
        }
        p.push('\n');
    }

    p.push_str("\n## Notes\n");
    if ctx.tagged_notes.is_empty() {
        p.push_str("No tagged notes.\n");
    }
    for n in &ctx.tagged_notes {
        let _ = writeln!(
            p,
            "- {} [{}] {}: {}",
            fmt_date(n.date),
            n.tags.join(", "),
            n.summary,
            n.content
        );
    }

    let _ = writeln!(
        p,
        "\nTotals: {} food entries, {} workouts, {} notes.",
        ctx.totals.food_entries, ctx.totals.workout_count, ctx.totals.note_count
    );
    p
}

fn fmt_date(d: NaiveDate) -> String {
    d.format("%a %b %d").to_string()
}
