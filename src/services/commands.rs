//! Explicit chat commands (`/notes`, `/setgoal 75`, ...).

use chrono::Duration;

use crate::db::RecordStore;
use crate::error::{AppError, AppResult};
use crate::models::profile::ProfilePatch;
use crate::services::advisor::{self, DEFAULT_INSIGHT_DAYS, MAX_INSIGHT_DAYS};
use crate::services::aggregation::daily_summary;
use crate::services::calendar::Calendar;
use crate::services::oracle::Oracle;
use crate::services::replies::{self, Reply};

pub const RECENT_NOTES_LIMIT: i64 = 10;
pub const SEARCH_NOTES_LIMIT: i64 = 8;

pub const WEIGHT_RANGE_KG: (f64, f64) = (20.0, 300.0);
pub const CALORIE_TARGET_RANGE: (i32, i32) = (500, 5000);
pub const MACRO_RANGE_G: (f64, f64) = (0.0, 1000.0);

/// Everything a command needs from the running service.
pub struct CommandContext<'a> {
    pub store: &'a dyn RecordStore,
    pub oracle: &'a dyn Oracle,
    pub calendar: &'a Calendar,
    pub owner_id: i64,
}

/// `/Notes@SomeBot` and `notes` both name the `notes` command.
pub fn normalize_command(raw: &str) -> String {
    let name = raw.trim().trim_start_matches('/');
    let name = name.split('@').next().unwrap_or(name);
    name.to_lowercase()
}

pub async fn run_command(ctx: &CommandContext<'_>, command: &str, args: &[String]) -> AppResult<Reply> {
    let name = normalize_command(command);
    tracing::info!(owner_id = ctx.owner_id, command = %name, args = args.len(), "Command");

    match name.as_str() {
        "start" => {
            ctx.store.get_or_create_owner(ctx.owner_id).await?;
            Ok(Reply::markdown(replies::welcome_text()))
        }
        "help" => Ok(Reply::markdown(replies::help_text())),
        "notes" => notes(ctx, args).await,
        "summary" => {
            let profile = ctx.store.get_or_create_owner(ctx.owner_id).await?;
            let summary =
                daily_summary(ctx.store, ctx.calendar, ctx.owner_id, ctx.calendar.today()).await?;
            Ok(Reply::markdown(replies::summary_report(&summary, &profile)))
        }
        "profile" => {
            let profile = ctx.store.get_or_create_owner(ctx.owner_id).await?;
            Ok(Reply::markdown(replies::profile_text(&profile)))
        }
        "setweight" => {
            let kg = parse_weight(args, "/setweight 80")?;
            update(ctx, ProfilePatch {
                current_weight: Some(kg),
                ..Default::default()
            })
            .await?;
            Ok(Reply::markdown(format!("✅ Current weight set to *{} kg*", kg)))
        }
        "setgoal" => {
            let kg = parse_weight(args, "/setgoal 75")?;
            update(ctx, ProfilePatch {
                goal_weight: Some(kg),
                ..Default::default()
            })
            .await?;
            Ok(Reply::markdown(format!("✅ Goal weight set to *{} kg*", kg)))
        }
        "settarget" => {
            let kcal = parse_calorie_target(args)?;
            update(ctx, ProfilePatch {
                daily_calorie_target: Some(kcal),
                ..Default::default()
            })
            .await?;
            Ok(Reply::markdown(format!(
                "✅ Daily calorie target set to *{} kcal*",
                kcal
            )))
        }
        "setmacros" => {
            let (protein, carbs, fat) = parse_macros(args)?;
            let profile = ctx
                .store
                .update_owner_profile(
                    ctx.owner_id,
                    &ProfilePatch {
                        protein_target: Some(protein),
                        carbs_target: Some(carbs),
                        fat_target: Some(fat),
                        ..Default::default()
                    },
                )
                .await?;
            Ok(Reply::markdown(format!(
                "✅ Macro targets set: {}",
                profile.macro_summary()
            )))
        }
        "recommend" => {
            let text = advisor::recommend(ctx.store, ctx.oracle, ctx.calendar, ctx.owner_id).await?;
            Ok(Reply::plain(text))
        }
        "insights" => {
            let days = parse_days(args)?;
            let text =
                advisor::insights(ctx.store, ctx.oracle, ctx.calendar, ctx.owner_id, days).await?;
            Ok(Reply::plain(text))
        }
        other => Err(AppError::Validation(format!(
            "Unknown command /{}. Use /help to see what I can do.",
            other
        ))),
    }
}

async fn update(ctx: &CommandContext<'_>, patch: ProfilePatch) -> AppResult<()> {
    ctx.store.update_owner_profile(ctx.owner_id, &patch).await?;
    Ok(())
}

async fn notes(ctx: &CommandContext<'_>, args: &[String]) -> AppResult<Reply> {
    let today = ctx.calendar.today();
    let keyword = args.join(" ").trim().to_lowercase();

    let range = match keyword.as_str() {
        "" => None,
        "today" => Some(("today", today, today)),
        "yesterday" => {
            let y = today - Duration::days(1);
            Some(("yesterday", y, y))
        }
        "week" | "this week" => Some(("last 7 days", today - Duration::days(7), today)),
        "month" | "this month" => Some(("last 30 days", today - Duration::days(30), today)),
        _ => {
            let found = ctx
                .store
                .search_notes(ctx.owner_id, &keyword, SEARCH_NOTES_LIMIT)
                .await?;
            let header = format!("🔍 *Notes matching \"{}\"*", keyword);
            return Ok(Reply::markdown(replies::notes_listing(
                &header,
                &found,
                ctx.calendar,
            )));
        }
    };

    let (header, found) = match range {
        None => (
            format!("📝 *Your last {} notes*", RECENT_NOTES_LIMIT),
            ctx.store
                .recent_notes(ctx.owner_id, RECENT_NOTES_LIMIT)
                .await?,
        ),
        Some((label, start, end)) => {
            let window = ctx.calendar.window(start, end)?;
            (
                replies::range_header(label, start, end),
                ctx.store.notes_in_window(ctx.owner_id, window).await?,
            )
        }
    };
    Ok(Reply::markdown(replies::notes_listing(
        &header,
        &found,
        ctx.calendar,
    )))
}

fn single_arg<'a>(args: &'a [String], usage: &str) -> AppResult<&'a str> {
    match args {
        [only] => Ok(only.trim()),
        _ => Err(AppError::Validation(format!("Usage: {}", usage))),
    }
}

fn parse_weight(args: &[String], usage: &str) -> AppResult<f64> {
    let (min, max) = WEIGHT_RANGE_KG;
    let raw = single_arg(args, usage)?;
    match raw.parse::<f64>() {
        Ok(kg) if (min..=max).contains(&kg) => Ok(kg),
        _ => Err(AppError::Validation(format!(
            "Weight must be between {} and {} kg. Example: {}",
            min, max, usage
        ))),
    }
}

fn parse_calorie_target(args: &[String]) -> AppResult<i32> {
    let (min, max) = CALORIE_TARGET_RANGE;
    let raw = single_arg(args, "/settarget 2000")?;
    match raw.parse::<i32>() {
        Ok(kcal) if (min..=max).contains(&kcal) => Ok(kcal),
        _ => Err(AppError::Validation(format!(
            "Calorie target must be a whole number between {} and {}. Example: /settarget 2000",
            min, max
        ))),
    }
}

fn parse_macros(args: &[String]) -> AppResult<(f64, f64, f64)> {
    let usage = || AppError::Validation("Usage: /setmacros <protein> <carbs> <fat>, e.g. /setmacros 150 200 60".into());
    let [p, c, f] = args else {
        return Err(usage());
    };

    let (min, max) = MACRO_RANGE_G;
    let mut grams = [0.0; 3];
    for (slot, (label, raw)) in grams
        .iter_mut()
        .zip([("Protein", p), ("Carbs", c), ("Fat", f)])
    {
        let value: f64 = raw.trim().parse().map_err(|_| usage())?;
        if !(min..=max).contains(&value) {
            return Err(AppError::Validation(format!(
                "{} must be between {} and {} g",
                label, min, max
            )));
        }
        *slot = value;
    }

    if grams.iter().all(|g| *g == 0.0) {
        return Err(AppError::Validation(
            "At least one macro target must be above zero".into(),
        ));
    }
    Ok((grams[0], grams[1], grams[2]))
}

fn parse_days(args: &[String]) -> AppResult<u32> {
    match args {
        [] => Ok(DEFAULT_INSIGHT_DAYS),
        [raw] => match raw.trim().parse::<u32>() {
            Ok(days) if (1..=MAX_INSIGHT_DAYS).contains(&days) => Ok(days),
            _ => Err(AppError::Validation(format!(
                "Days must be between 1 and {}",
                MAX_INSIGHT_DAYS
            ))),
        },
        _ => Err(AppError::Validation("Usage: /insights [days]".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::models::note::NewNote;
    use crate::services::oracle::ScriptedOracle;
    use chrono::Utc;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    async fn run(store: &MemoryStore, oracle: &ScriptedOracle, cmd: &str, a: &[&str]) -> AppResult<Reply> {
        let calendar = Calendar::new(chrono_tz::UTC);
        let ctx = CommandContext {
            store,
            oracle,
            calendar: &calendar,
            owner_id: 1,
        };
        run_command(&ctx, cmd, &args(a)).await
    }

    #[test]
    fn test_normalize_command() {
        assert_eq!(normalize_command("/Notes@LifeBot"), "notes");
        assert_eq!(normalize_command("summary"), "summary");
    }

    #[tokio::test]
    async fn test_start_creates_profile() {
        let store = MemoryStore::new(2000);
        let reply = run(&store, &ScriptedOracle::new(), "/start", &[]).await.unwrap();
        assert!(reply.text.contains("Welcome"));
        assert_eq!(store.profile_count(), 1);
    }

    #[tokio::test]
    async fn test_weight_bounds_are_inclusive() {
        let store = MemoryStore::new(2000);
        let oracle = ScriptedOracle::new();
        assert!(run(&store, &oracle, "setweight", &["20"]).await.is_ok());
        assert!(run(&store, &oracle, "setgoal", &["300"]).await.is_ok());

        for bad in ["19.9", "300.1", "abc", "NaN"] {
            let err = run(&store, &oracle, "setgoal", &[bad]).await.unwrap_err();
            assert!(
                matches!(err, AppError::Validation(ref m) if m.contains("between 20 and 300")),
                "{}",
                bad
            );
        }
        let err = run(&store, &oracle, "setgoal", &[]).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.starts_with("Usage")));

        let profile = store.get_or_create_owner(1).await.unwrap();
        assert_eq!(profile.current_weight, Some(20.0));
        assert_eq!(profile.goal_weight, Some(300.0));
    }

    #[tokio::test]
    async fn test_calorie_target_range() {
        let store = MemoryStore::new(2000);
        let oracle = ScriptedOracle::new();
        for bad in ["499", "5001", "1800.5"] {
            let err = run(&store, &oracle, "settarget", &[bad]).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(ref m) if m.contains("500 and 5000")));
        }
        run(&store, &oracle, "settarget", &["1800"]).await.unwrap();
        let profile = store.get_or_create_owner(1).await.unwrap();
        assert_eq!(profile.daily_calorie_target, Some(1800));
    }

    #[tokio::test]
    async fn test_setmacros_rules() {
        let store = MemoryStore::new(2000);
        let oracle = ScriptedOracle::new();

        let err = run(&store, &oracle, "setmacros", &["0", "0", "0"]).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("above zero")));
        let err = run(&store, &oracle, "setmacros", &["150", "2000", "60"]).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.starts_with("Carbs")));
        let err = run(&store, &oracle, "setmacros", &["150", "200"]).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.starts_with("Usage")));

        run(&store, &oracle, "setmacros", &["150", "200", "60"]).await.unwrap();
        let profile = store.get_or_create_owner(1).await.unwrap();
        assert_eq!(profile.fat_target, Some(60.0));

        let reply = run(&store, &oracle, "profile", &[]).await.unwrap();
        assert!(reply.text.contains("P: 150g | C: 200g | F: 60g"));
    }

    #[tokio::test]
    async fn test_setmacros_with_zero_fat_matches_profile() {
        let store = MemoryStore::new(2000);
        let oracle = ScriptedOracle::new();

        let reply = run(&store, &oracle, "setmacros", &["150", "200", "0"]).await.unwrap();
        assert!(reply.text.contains("P: 150g | C: 200g | F: not set"), "{}", reply.text);

        let reply = run(&store, &oracle, "profile", &[]).await.unwrap();
        assert!(reply.text.contains("P: 150g | C: 200g | F: not set"), "{}", reply.text);
        assert!(!reply.text.contains("No macro targets set"));
    }

    #[tokio::test]
    async fn test_unknown_command_is_validation_error() {
        let store = MemoryStore::new(2000);
        let err = run(&store, &ScriptedOracle::new(), "/dance", &[]).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("/dance")));
    }

    #[tokio::test]
    async fn test_notes_keyword_and_ranges() {
        let store = MemoryStore::new(2000);
        let oracle = ScriptedOracle::new();
        store
            .insert_note(
                1,
                NewNote {
                    content: "Call the dentist".into(),
                    summary: "Dentist reminder".into(),
                    tags: vec!["reminder".into()],
                },
            )
            .await
            .unwrap();
        let old = store
            .insert_note(
                1,
                NewNote {
                    content: "Buy milk".into(),
                    summary: "Groceries".into(),
                    tags: vec![],
                },
            )
            .await
            .unwrap();
        store.set_created_at(old.id, Utc::now() - Duration::days(1));

        let reply = run(&store, &oracle, "notes", &["dentist"]).await.unwrap();
        assert!(reply.text.contains("Notes matching \"dentist\""));
        assert!(reply.text.contains("Dentist reminder"));
        assert!(!reply.text.contains("Groceries"));

        let reply = run(&store, &oracle, "notes", &["yesterday"]).await.unwrap();
        assert!(reply.text.contains("Groceries"));
        assert!(!reply.text.contains("Dentist reminder"));

        let reply = run(&store, &oracle, "notes", &["this", "week"]).await.unwrap();
        assert!(reply.text.contains("last 7 days"));
        assert!(reply.text.contains("Groceries") && reply.text.contains("Dentist reminder"));

        let reply = run(&store, &oracle, "notes", &[]).await.unwrap();
        assert!(reply.text.contains("1. Dentist reminder"));
        assert!(reply.text.contains("2. Groceries"));

        let reply = run(&store, &oracle, "notes", &["nothing-here"]).await.unwrap();
        assert!(reply.text.contains("No notes found"));
    }

    #[tokio::test]
    async fn test_summary_command_is_deterministic() {
        let store = MemoryStore::new(2000);
        let oracle = ScriptedOracle::new();
        run(&store, &oracle, "setweight", &["82"]).await.unwrap();
        run(&store, &oracle, "setgoal", &["78"]).await.unwrap();

        let reply = run(&store, &oracle, "summary", &[]).await.unwrap();
        assert!(reply.text.contains("Daily Summary"));
        assert!(reply.text.contains("To lose: 4kg"));
        assert!(oracle.requests().is_empty());
    }

    #[tokio::test]
    async fn test_insights_days_argument() {
        let store = MemoryStore::new(2000);
        let oracle = ScriptedOracle::new();
        let err = run(&store, &oracle, "insights", &["0"]).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let reply = run(&store, &oracle, "insights", &[]).await.unwrap();
        assert_eq!(reply.text, advisor::NOT_ENOUGH_DATA);
    }

    #[tokio::test]
    async fn test_recommend_is_plain_oracle_text() {
        let store = MemoryStore::new(2000);
        let oracle = ScriptedOracle::replying("Have a salad.");
        let reply = run(&store, &oracle, "recommend", &[]).await.unwrap();
        assert_eq!(reply, Reply::plain("Have a salad."));
    }
}
