//! Turns one utterance into a typed [`Classification`].
//!
//! The oracle's wire format stops here: fences are stripped, JSON is parsed,
//! the `type` discriminator selects a payload, and the payload is validated
//! before anything downstream sees it.

use serde::{de, Deserialize, Deserializer};
use serde_json::Value;
use validator::{Validate, ValidationError};

use crate::error::{AppError, AppResult};
use crate::models::note::normalize_tags;
use crate::models::profile::round1;
use crate::services::oracle::{Oracle, OracleRequest};
use crate::services::prompts::{
    classification_prompt, CLASSIFICATION_MAX_TOKENS, CLASSIFICATION_SYSTEM_PROMPT,
};

#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct QuestionPayload {
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence: f64,
    #[validate(custom = "non_blank")]
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct NotePayload {
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence: f64,
    #[validate(custom = "non_blank")]
    pub content: String,
    #[validate(custom = "non_blank")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct FoodPayload {
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence: f64,
    #[validate(custom = "non_blank")]
    pub food_description: String,
    #[serde(deserialize_with = "whole_number")]
    #[validate(range(min = 0))]
    pub calories: i32,
    #[validate(range(min = 0.0))]
    pub protein: f64,
    #[validate(range(min = 0.0))]
    pub carbs: f64,
    #[validate(range(min = 0.0))]
    pub fat: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct WorkoutPayload {
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence: f64,
    #[validate(custom = "non_blank")]
    pub activity_type: String,
    #[serde(deserialize_with = "whole_number")]
    #[validate(range(min = 1))]
    pub duration_mins: i32,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Question(QuestionPayload),
    Note(NotePayload),
    Food(FoodPayload),
    Workout(WorkoutPayload),
}

impl Classification {
    pub fn kind(&self) -> &'static str {
        match self {
            Classification::Question(_) => "question",
            Classification::Note(_) => "note",
            Classification::Food(_) => "food",
            Classification::Workout(_) => "workout",
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            Classification::Question(p) => p.confidence,
            Classification::Note(p) => p.confidence,
            Classification::Food(p) => p.confidence,
            Classification::Workout(p) => p.confidence,
        }
    }
}

fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Integer fields accept `450` or `450.0`, never `450.5`.
fn whole_number<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let n = serde_json::Number::deserialize(deserializer)?;
    let value = match n.as_i64() {
        Some(i) => i,
        None => match n.as_f64() {
            Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() <= i64::MAX as f64 => f as i64,
            _ => {
                return Err(de::Error::custom(format!(
                    "expected a whole number, got {}",
                    n
                )))
            }
        },
    };
    i32::try_from(value).map_err(|_| de::Error::custom(format!("{} is out of range", value)))
}

/// Ask the oracle to classify `utterance`.
pub async fn classify(oracle: &dyn Oracle, utterance: &str) -> AppResult<Classification> {
    let request = OracleRequest::new(classification_prompt(utterance), CLASSIFICATION_MAX_TOKENS)
        .with_system(CLASSIFICATION_SYSTEM_PROMPT);
    let raw = oracle.complete(request).await?;
    parse_classification(&raw)
}

/// Drop a surrounding Markdown code fence, with or without a `json` label.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

pub fn parse_classification(raw: &str) -> AppResult<Classification> {
    let body = strip_code_fences(raw);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| AppError::ClassificationParse(e.to_string()))?;
    if !value.is_object() {
        return Err(AppError::ClassificationParse(
            "expected a JSON object".into(),
        ));
    }

    let kind = value.get("type").and_then(Value::as_str).map(str::to_owned);
    match kind.as_deref() {
        Some("question") => {
            let mut p: QuestionPayload = payload(value)?;
            p.answer = p.answer.trim().to_string();
            Ok(Classification::Question(p))
        }
        Some("note") => {
            let mut p: NotePayload = payload(value)?;
            p.content = p.content.trim().to_string();
            p.summary = p.summary.trim().to_string();
            p.tags = normalize_tags(&p.tags);
            Ok(Classification::Note(p))
        }
        Some("food") => {
            let mut p: FoodPayload = payload(value)?;
            p.food_description = p.food_description.trim().to_string();
            p.protein = round1(p.protein);
            p.carbs = round1(p.carbs);
            p.fat = round1(p.fat);
            Ok(Classification::Food(p))
        }
        Some("workout") => {
            let mut p: WorkoutPayload = payload(value)?;
            p.activity_type = p.activity_type.trim().to_string();
            p.notes = p
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty());
            Ok(Classification::Workout(p))
        }
        other => Err(AppError::ClassificationUnknownType(format!("{:?}", other))),
    }
}

fn payload<T>(value: Value) -> AppResult<T>
where
    T: for<'de> Deserialize<'de> + Validate,
{
    let p: T = serde_json::from_value(value)
        .map_err(|e| AppError::ClassificationSchema(e.to_string()))?;
    p.validate()
        .map_err(|e| AppError::ClassificationSchema(e.to_string()))?;
    Ok(p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::oracle::ScriptedOracle;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  {}  "), "{}");
    }

    #[test]
    fn test_food_macros_rounded_calories_kept() {
        let raw = r#"{"type":"food","confidence":0.9,"food_description":"Oatmeal","calories":350,"protein":10.04,"carbs":59.96,"fat":8.0}"#;
        let Classification::Food(f) = parse_classification(raw).unwrap() else {
            panic!("expected food");
        };
        assert_eq!(f.calories, 350);
        assert_eq!(f.protein, 10.0);
        assert_eq!(f.carbs, 60.0);
        assert_eq!(f.fat, 8.0);
    }

    #[test]
    fn test_integral_floats_accepted_as_whole_numbers() {
        let raw = r#"{"type":"food","confidence":0.9,"food_description":"Pasta","calories":450.0,"protein":15,"carbs":80,"fat":9}"#;
        let Classification::Food(f) = parse_classification(raw).unwrap() else {
            panic!("expected food");
        };
        assert_eq!(f.calories, 450);

        let raw = r#"{"type":"workout","confidence":0.9,"activity_type":"Running","duration_mins":30.0}"#;
        let Classification::Workout(w) = parse_classification(raw).unwrap() else {
            panic!("expected workout");
        };
        assert_eq!(w.duration_mins, 30);
    }

    #[test]
    fn test_non_integer_counts_rejected() {
        let cases = [
            r#"{"type":"food","confidence":0.9,"food_description":"x","calories":"450","protein":1,"carbs":1,"fat":1}"#,
            r#"{"type":"food","confidence":0.9,"food_description":"x","calories":1e12,"protein":1,"carbs":1,"fat":1}"#,
            r#"{"type":"workout","confidence":0.9,"activity_type":"Run","duration_mins":12.25}"#,
        ];
        for raw in cases {
            let err = parse_classification(raw).unwrap_err();
            assert!(matches!(err, AppError::ClassificationSchema(_)), "{} gave {:?}", raw, err);
        }
    }

    #[test]
    fn test_fenced_payload_parses() {
        let raw = "```json\n{\"type\":\"question\",\"confidence\":0.99,\"answer\":\"About 95 kcal.\"}\n```";
        let c = parse_classification(raw).unwrap();
        assert_eq!(c.kind(), "question");
        assert_eq!(c.confidence(), 0.99);
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = parse_classification("Sure! Here's the JSON: {").unwrap_err();
        assert!(matches!(err, AppError::ClassificationParse(_)));
        let err = parse_classification("[1, 2]").unwrap_err();
        assert!(matches!(err, AppError::ClassificationParse(_)));
    }

    #[test]
    fn test_missing_or_unknown_type() {
        let err = parse_classification(r#"{"confidence":0.5,"answer":"x"}"#).unwrap_err();
        assert!(matches!(err, AppError::ClassificationUnknownType(_)));
        let err = parse_classification(r#"{"type":"recipe","confidence":0.5}"#).unwrap_err();
        assert!(matches!(err, AppError::ClassificationUnknownType(_)));
    }

    #[test]
    fn test_schema_violations() {
        let cases = [
            r#"{"type":"question","confidence":1.2,"answer":"x"}"#,
            r#"{"type":"question","confidence":0.9,"answer":"   "}"#,
            r#"{"type":"note","confidence":0.9,"content":"x"}"#,
            r#"{"type":"food","confidence":0.9,"food_description":"x","calories":-5,"protein":1,"carbs":1,"fat":1}"#,
            r#"{"type":"food","confidence":0.9,"food_description":"x","calories":350.5,"protein":1,"carbs":1,"fat":1}"#,
            r#"{"type":"food","confidence":0.9,"food_description":"x","calories":100,"protein":-1,"carbs":1,"fat":1}"#,
            r#"{"type":"workout","confidence":0.9,"activity_type":"Run","duration_mins":0}"#,
            r#"{"type":"workout","confidence":0.9,"activity_type":"Run","duration_mins":10,"distance_km":-2}"#,
        ];
        for raw in cases {
            let err = parse_classification(raw).unwrap_err();
            assert!(
                matches!(err, AppError::ClassificationSchema(_)),
                "{} gave {:?}",
                raw,
                err
            );
        }
    }

    #[test]
    fn test_note_tags_normalized_and_null_allowed() {
        let raw = r#"{"type":"note","confidence":0.9,"content":"slept 5h","summary":"Short sleep","tags":[" sleep","Sleep",""]}"#;
        let Classification::Note(n) = parse_classification(raw).unwrap() else {
            panic!("expected note");
        };
        assert_eq!(n.tags, vec!["sleep".to_string()]);

        let raw = r#"{"type":"note","confidence":0.9,"content":"idea","summary":"An idea","tags":null}"#;
        let Classification::Note(n) = parse_classification(raw).unwrap() else {
            panic!("expected note");
        };
        assert!(n.tags.is_empty());
    }

    #[test]
    fn test_workout_optional_fields() {
        let raw = r#"{"type":"workout","confidence":0.95,"activity_type":"Yoga","duration_mins":45,"distance_km":null,"notes":""}"#;
        let Classification::Workout(w) = parse_classification(raw).unwrap() else {
            panic!("expected workout");
        };
        assert_eq!(w.duration_mins, 45);
        assert_eq!(w.distance_km, None);
        assert_eq!(w.notes, None);
    }

    #[tokio::test]
    async fn test_classify_sends_instruction_and_utterance() {
        let oracle = ScriptedOracle::replying(
            r#"{"type":"question","confidence":0.98,"answer":"About 95 kcal."}"#,
        );
        let c = classify(&oracle, "How many calories in an apple?").await.unwrap();
        assert_eq!(c.kind(), "question");

        let seen = oracle.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].system.as_deref(), Some(CLASSIFICATION_SYSTEM_PROMPT));
        assert!(seen[0].prompt.contains("How many calories in an apple?"));
    }

    #[tokio::test]
    async fn test_classify_oracle_failure_is_unavailable() {
        let oracle = ScriptedOracle::failing();
        let err = classify(&oracle, "hello").await.unwrap_err();
        assert!(matches!(err, AppError::OracleUnavailable(_)));
    }
}
