use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Calorie target given to an owner on first contact.
pub const DEFAULT_CALORIE_TARGET: i32 = 2000;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub telegram_id: i64,
    pub current_weight: Option<f64>,
    pub goal_weight: Option<f64>,
    pub daily_calorie_target: Option<i32>,
    pub protein_target: Option<f64>,
    pub carbs_target: Option<f64>,
    pub fat_target: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial profile update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    pub current_weight: Option<f64>,
    pub goal_weight: Option<f64>,
    pub daily_calorie_target: Option<i32>,
    pub protein_target: Option<f64>,
    pub carbs_target: Option<f64>,
    pub fat_target: Option<f64>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.current_weight.is_none()
            && self.goal_weight.is_none()
            && self.daily_calorie_target.is_none()
            && self.protein_target.is_none()
            && self.carbs_target.is_none()
            && self.fat_target.is_none()
    }

    pub fn apply_to(&self, profile: &mut Profile) {
        if let Some(v) = self.current_weight {
            profile.current_weight = Some(v);
        }
        if let Some(v) = self.goal_weight {
            profile.goal_weight = Some(v);
        }
        if let Some(v) = self.daily_calorie_target {
            profile.daily_calorie_target = Some(v);
        }
        if let Some(v) = self.protein_target {
            profile.protein_target = Some(v);
        }
        if let Some(v) = self.carbs_target {
            profile.carbs_target = Some(v);
        }
        if let Some(v) = self.fat_target {
            profile.fat_target = Some(v);
        }
    }
}

/// Per-macro gram targets. A macro without a positive target is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroTargets {
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
}

impl Profile {
    /// The calorie target, treating a non-positive stored value as unset.
    pub fn calorie_target(&self) -> Option<i32> {
        self.daily_calorie_target.filter(|t| *t > 0)
    }

    /// Targets for whichever macros are set, or `None` when none are.
    pub fn macro_targets(&self) -> Option<MacroTargets> {
        let positive = |v: Option<f64>| v.filter(|g| *g > 0.0);
        let targets = MacroTargets {
            protein: positive(self.protein_target),
            carbs: positive(self.carbs_target),
            fat: positive(self.fat_target),
        };
        if targets.protein.is_none() && targets.carbs.is_none() && targets.fat.is_none() {
            return None;
        }
        Some(targets)
    }

    pub fn macro_summary(&self) -> String {
        let Some(t) = self.macro_targets() else {
            return "No macro targets set. Use /setmacros".into();
        };
        let grams = |v: Option<f64>| v.map_or_else(|| "not set".to_string(), |g| format!("{}g", g));
        format!(
            "P: {} | C: {} | F: {}",
            grams(t.protein),
            grams(t.carbs),
            grams(t.fat)
        )
    }

    /// Kilograms still to lose, when both weights are known.
    pub fn weight_to_goal(&self) -> Option<f64> {
        match (self.current_weight, self.goal_weight) {
            (Some(current), Some(goal)) if current > 0.0 && goal > 0.0 => {
                Some(round1(current - goal))
            }
            _ => None,
        }
    }
}

/// Round to one decimal place.
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Profile {
        Profile {
            id: Uuid::new_v4(),
            telegram_id: 42,
            current_weight: None,
            goal_weight: None,
            daily_calorie_target: Some(DEFAULT_CALORIE_TARGET),
            protein_target: None,
            carbs_target: None,
            fat_target: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_macro_targets_allow_partial() {
        let mut p = profile();
        assert_eq!(p.macro_targets(), None);
        assert_eq!(p.macro_summary(), "No macro targets set. Use /setmacros");

        p.protein_target = Some(150.0);
        p.carbs_target = Some(200.0);
        p.fat_target = Some(0.0);
        assert_eq!(
            p.macro_targets(),
            Some(MacroTargets {
                protein: Some(150.0),
                carbs: Some(200.0),
                fat: None,
            })
        );
        assert_eq!(p.macro_summary(), "P: 150g | C: 200g | F: not set");

        p.fat_target = Some(70.0);
        assert_eq!(p.macro_summary(), "P: 150g | C: 200g | F: 70g");
    }

    #[test]
    fn test_patch_only_touches_provided_fields() {
        let mut p = profile();
        p.goal_weight = Some(75.0);
        let patch = ProfilePatch {
            current_weight: Some(82.4),
            ..Default::default()
        };
        patch.apply_to(&mut p);
        assert_eq!(p.current_weight, Some(82.4));
        assert_eq!(p.goal_weight, Some(75.0));
        assert_eq!(p.daily_calorie_target, Some(2000));
        assert_eq!(p.weight_to_goal(), Some(7.4));
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(10.04), 10.0);
        assert_eq!(round1(10.06), 10.1);
        assert_eq!(round1(7.0), 7.0);
    }
}
