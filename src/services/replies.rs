//! Outbound chat text and the 4096-character chunking the transport needs.

use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::models::food_log::FoodLog;
use crate::models::note::Note;
use crate::models::profile::{round1, Profile};
use crate::models::workout::Workout;
use crate::services::aggregation::DailySummary;
use crate::services::calendar::Calendar;

pub const MAX_CHUNK_CHARS: usize = 4096;
pub const LOG_PREVIEW_CHARS: usize = 70;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub text: String,
    /// Whether `text` carries chat markup. Oracle answers never do.
    pub markdown: bool,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markdown: false,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markdown: true,
        }
    }

    pub fn chunks(&self) -> Vec<String> {
        chunk_text(&self.text)
    }
}

pub fn chunk_text(text: &str) -> Vec<String> {
    chunk_with_limit(text, MAX_CHUNK_CHARS)
}

/// Split on line boundaries so no chunk exceeds `limit` characters.
/// A single line longer than `limit` is cut at character boundaries.
fn chunk_with_limit(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut buf = String::new();
    let mut buf_len = 0;

    let flush = |buf: &mut String, chunks: &mut Vec<String>| {
        let trimmed = buf.trim_end_matches('\n');
        if !trimmed.trim().is_empty() {
            chunks.push(trimmed.to_string());
        }
        buf.clear();
    };

    for line in text.split_inclusive('\n') {
        let len = line.chars().count();

        if len > limit {
            flush(&mut buf, &mut chunks);
            buf_len = 0;
            let chars: Vec<char> = line.trim_end_matches('\n').chars().collect();
            for piece in chars.chunks(limit) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        if buf_len + len > limit {
            flush(&mut buf, &mut chunks);
            buf_len = 0;
        }
        buf.push_str(line);
        buf_len += len;
    }
    flush(&mut buf, &mut chunks);
    chunks
}

/// First `LOG_PREVIEW_CHARS` characters, for log lines.
pub fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(LOG_PREVIEW_CHARS).collect();
    if text.chars().nth(LOG_PREVIEW_CHARS).is_some() {
        out.push('…');
    }
    out
}

pub fn format_timestamp(calendar: &Calendar, ts: DateTime<Utc>) -> String {
    ts.with_timezone(&calendar.timezone())
        .format("%b %d, %Y · %I:%M %p")
        .to_string()
}

pub fn welcome_text() -> String {
    "👋 *Welcome to your personal tracker!*\n\n\
     Send me a message and I'll work out what to do with it:\n\
     📝 Save notes and brain dumps\n\
     🍽️ Log meals with macro estimates\n\
     💪 Track workouts\n\
     💬 Answer health and fitness questions\n\n\
     *Commands:*\n\
     `/notes` recent notes\n\
     `/notes <keyword>` search notes\n\
     `/notes today` / `yesterday` / `week` / `month`\n\
     `/summary` today's stats\n\
     `/profile` your settings\n\
     `/recommend` what to eat next\n\
     `/insights` patterns from the last week\n\
     `/help` this message\n\n\
     *Examples:*\n\
     • _Had eggs and toast for breakfast_\n\
     • _30 min run this morning_\n\
     • _Remember to call the dentist tomorrow_\n\
     • _How many calories in a banana?_"
        .to_string()
}

pub fn help_text() -> String {
    "🤖 *Help*\n\n\
     *Saved automatically:*\n\
     • Food → `had pizza for dinner`\n\
     • Workouts → `45 min gym session`\n\
     • Notes and reminders → `remember to call dentist`\n\
     • How you feel → `slept badly, low energy`\n\n\
     *Answered directly:*\n\
     • Nutrition questions → `how many calories in X?`\n\
     • Fitness advice → `good protein goal for my weight?`\n\n\
     *Commands:*\n\
     `/notes` last 10 notes\n\
     `/notes dentist` search by keyword\n\
     `/notes today` / `yesterday` / `week` / `month`\n\
     `/summary` today's calorie and workout report\n\
     `/profile` view settings\n\
     `/setweight 80` current weight (kg)\n\
     `/setgoal 75` goal weight (kg)\n\
     `/settarget 2000` daily calorie target\n\
     `/setmacros 150 200 60` protein, carbs, fat (g)\n\
     `/recommend` meal suggestion for now\n\
     `/insights` weekly patterns"
        .to_string()
}

pub fn notes_listing(header: &str, notes: &[Note], calendar: &Calendar) -> String {
    if notes.is_empty() {
        return format!("{}\n\n_No notes found._", header);
    }

    let mut out = format!("{}\n\n", header);
    for (i, note) in notes.iter().enumerate() {
        let _ = writeln!(out, "*{}. {}*", i + 1, note.summary);
        let _ = writeln!(out, "_{}_", format_timestamp(calendar, note.created_at));
        if !note.tags.is_empty() {
            let _ = writeln!(out, "🏷 {}", note.tags.join(", "));
        }
        let _ = writeln!(out, "{}\n", note.content);
    }
    out.trim_end().to_string()
}

pub fn summary_report(summary: &DailySummary, profile: &Profile) -> String {
    let mut out = format!(
        "📊 *Daily Summary*\n_{}_\n\n*🍽️ Nutrition*\n",
        summary.date.format("%A, %B %d, %Y")
    );

    if summary.food_entry_count > 0 {
        let _ = write!(out, "Calories: {}", summary.total_calories);
        if let (Some(target), Some(remaining)) = (summary.calories_target, summary.calories_remaining) {
            let _ = write!(out, " / {} {}", target, remaining_phrase(remaining));
        }
        let _ = write!(
            out,
            "\nProtein: {}g · Carbs: {}g · Fat: {}g\nMeals logged: {}\n",
            summary.total_protein, summary.total_carbs, summary.total_fat, summary.food_entry_count
        );
    } else {
        out.push_str("_No meals logged yet_\n");
    }

    out.push_str("\n*💪 Activity*\n");
    if summary.workout_count > 0 {
        let _ = writeln!(
            out,
            "Sessions: {} · Total: {} mins",
            summary.workout_count, summary.workout_minutes
        );
    } else {
        out.push_str("_No workouts logged yet_\n");
    }

    out.push_str("\n*📝 Notes*\n");
    if summary.note_count > 0 {
        let _ = writeln!(
            out,
            "Entries today: {}. Use /notes to read them",
            summary.note_count
        );
    } else {
        out.push_str("_No notes today_\n");
    }

    if let (Some(current), Some(goal), Some(diff)) =
        (profile.current_weight, profile.goal_weight, profile.weight_to_goal())
    {
        let _ = writeln!(out, "\n*⚖️ Weight*\nCurrent: {}kg · Goal: {}kg", current, goal);
        if diff > 0.0 {
            let _ = writeln!(out, "To lose: {}kg", diff);
        } else {
            out.push_str("🎉 Goal reached!\n");
        }
    }

    out.trim_end().to_string()
}

pub fn profile_text(profile: &Profile) -> String {
    let mut lines = vec!["👤 *Your Profile*".to_string(), String::new()];
    lines.push(match profile.current_weight {
        Some(w) => format!("Current Weight: {}kg", w),
        None => "Current Weight: _Not set_".into(),
    });
    lines.push(match profile.goal_weight {
        Some(w) => format!("Goal Weight: {}kg", w),
        None => "Goal Weight: _Not set_".into(),
    });
    lines.push(match profile.calorie_target() {
        Some(t) => format!("Daily Calorie Target: {} kcal", t),
        None => "Daily Calorie Target: _Not set_".into(),
    });
    lines.push(format!("Macro Targets: {}", profile.macro_summary()));
    lines.push(String::new());
    lines.push(
        "*Update:* `/setweight [kg]` · `/setgoal [kg]` · `/settarget [kcal]` · `/setmacros [p] [c] [f]`"
            .into(),
    );
    lines.join("\n")
}

pub fn note_saved(summary: &str, tags: &[String], wellness: bool) -> String {
    let mut out = format!("📝 *Note saved*\n_{}_", summary);
    if !tags.is_empty() {
        let _ = write!(out, "\n🏷 {}", tags.join(", "));
    }
    out.push_str("\n\nUse /notes to read your notes.");
    if wellness {
        out.push_str("\n💡 Tip: wellness notes feed /insights, which looks for patterns with your meals and workouts.");
    }
    out
}

pub fn food_logged(entry: &FoodLog, day: &DailySummary, profile: &Profile) -> String {
    let mut out = format!(
        "🍽️ *Logged:* {}\n\n• {} kcal\n• Protein: {}g · Carbs: {}g · Fat: {}g\n\n",
        entry.food_description, entry.calories, entry.protein, entry.carbs, entry.fat
    );
    let _ = writeln!(
        out,
        "*Today's total:* {} kcal ({} {})",
        day.total_calories,
        day.food_entry_count,
        if day.food_entry_count == 1 { "entry" } else { "entries" }
    );

    match (day.calories_target, day.calories_remaining) {
        (Some(target), Some(remaining)) => {
            let _ = writeln!(out, "Calories: {} / {} {}", day.total_calories, target, remaining_phrase(remaining));
        }
        _ => out.push_str("No calorie target set. Use /settarget\n"),
    }

    if let Some(t) = profile.macro_targets() {
        for (label, eaten, target) in [
            ("Protein", day.total_protein, t.protein),
            ("Carbs", day.total_carbs, t.carbs),
            ("Fat", day.total_fat, t.fat),
        ] {
            let Some(target) = target else {
                continue;
            };
            let left = round1(target - eaten);
            let _ = writeln!(
                out,
                "{}: {} / {}g ({}g {})",
                label,
                eaten,
                target,
                round1(left.abs()),
                if left >= 0.0 { "remaining" } else { "over" }
            );
        }
    }
    out.trim_end().to_string()
}

pub fn workout_logged(entry: &Workout, total_minutes: i64) -> String {
    let mut out = format!(
        "💪 *Logged:* {}\n\n⏱ {} mins",
        entry.activity_type, entry.duration_mins
    );
    if let Some(km) = entry.distance_km.filter(|d| *d > 0.0) {
        let _ = write!(out, " · 📏 {} km", km);
    }
    if let Some(notes) = &entry.notes {
        let _ = write!(out, "\n_{}_", notes);
    }
    let _ = write!(out, "\n\n*Today's activity:* {} mins total", total_minutes);
    out
}

pub fn narrative_fallback(summary: &DailySummary) -> String {
    let target = summary
        .calories_target
        .map(|t| t.to_string())
        .unwrap_or_else(|| "no target".into());
    format!(
        "Summary for {}: {}/{} kcal, {} workout(s).",
        summary.date, summary.total_calories, target, summary.workout_count
    )
}

pub fn range_header(label: &str, start: NaiveDate, end: NaiveDate) -> String {
    if start == end {
        format!("📝 *Notes from {}* ({})", label, start.format("%B %d"))
    } else {
        format!("📝 *Notes, {}*", label)
    }
}

fn remaining_phrase(remaining: i64) -> String {
    if remaining >= 0 {
        format!("✅ ({} remaining)", remaining)
    } else {
        format!("⚠️ ({} over)", -remaining)
    }
}
