//! Domain types and the `PlanGenerator` / `NutritionChat` traits, plus a
//! reqwest-based Gemini implementation of both.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub mod config;
pub mod http_client;
pub mod observability;
pub mod prompts;
pub mod retry;
pub mod utils;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("generator api error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("generator rate limited: {0}")]
    RateLimited(String),
    #[error("generator returned no content")]
    EmptyResponse,
    #[error("decoding generator output: {0}")]
    Decode(String),
    #[error("generated plan has no breakfast time")]
    SchemaViolation,
    #[error("configuration error: {0}")]
    Config(String),
}

impl GenerationError {
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            429 => GenerationError::RateLimited(message),
            _ => GenerationError::Api { status, message },
        }
    }

    /// Transport failures, throttling and server-side errors are worth another attempt;
    /// anything the service rejected or we failed to decode is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::Http(_) | GenerationError::RateLimited(_) => true,
            GenerationError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityLevel {
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
    ExtraActive,
}

impl ActivityLevel {
    /// Human-readable (pt-BR) label used in prompts.
    pub fn label(self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "Sedentário (Trabalho de escritório, pouco exercício)",
            ActivityLevel::LightlyActive => "Levemente Ativo (1-3 dias/semana)",
            ActivityLevel::ModeratelyActive => "Moderadamente Ativo (3-5 dias/semana)",
            ActivityLevel::VeryActive => "Muito Ativo (6-7 dias/semana)",
            ActivityLevel::ExtraActive => "Extremamente Ativo (Trabalho físico + treino)",
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Goal {
    LoseWeight,
    Maintain,
    GainMuscle,
}

impl Goal {
    pub fn label(self) -> &'static str {
        match self {
            Goal::LoseWeight => "Perder Peso",
            Goal::Maintain => "Manter Peso",
            Goal::GainMuscle => "Ganhar Músculo",
        }
    }
}

/// Snapshot collected once during onboarding. Replaced wholesale, never patched.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub age: u32,
    /// Centimetres.
    pub height: f64,
    /// Kilograms.
    pub current_weight: f64,
    /// Kilograms.
    pub target_weight: f64,
    pub gender: Gender,
    pub region: String,
    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub restrictions: String,
    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub preferences: String,
    pub activity_level: ActivityLevel,
    pub goal: Goal,
}

impl UserProfile {
    pub fn validate(&self) -> Result<(), String> {
        if self.age == 0 {
            return Err("age must be a positive integer".into());
        }
        let positive = [
            ("height", self.height),
            ("currentWeight", self.current_weight),
            ("targetWeight", self.target_weight),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{field} must be a positive number"));
            }
        }
        Ok(())
    }
}

fn deserialize_null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub item: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<String>,
}

/// Every field defaults so plans stored in older shapes still load.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Meal {
    /// "HH:MM". Plans cached before this field existed deserialize with an empty value.
    pub time: String,
    pub name: String,
    pub description: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub ingredients: Vec<Ingredient>,
    pub preparation_time: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Meals {
    pub breakfast: Meal,
    pub lunch: Meal,
    /// Afternoon snack.
    pub snack: Meal,
    pub dinner: Meal,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MacroTargets {
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct WorkoutExercise {
    pub name: String,
    #[serde(default)]
    pub sets: String,
    #[serde(default)]
    pub reps: String,
    #[serde(default)]
    pub instructions: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Workout {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub exercises: Vec<WorkoutExercise>,
}

/// One generated day of meals and training. Replaced by the next generation, never patched.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DailyPlan {
    pub date: String,
    pub motivational_quote: String,
    pub total_calories: f64,
    pub macro_targets: MacroTargets,
    pub meals: Meals,
    pub shopping_list: Vec<Ingredient>,
    pub workout: Workout,
    pub tips: Vec<String>,
}

impl DailyPlan {
    /// A plan matches the current shape iff the first meal carries a time.
    pub fn is_schema_valid(&self) -> bool {
        !self.meals.breakfast.time.is_empty()
    }
}

#[async_trait]
pub trait PlanGenerator: Send + Sync + 'static {
    /// Produce a fresh plan for `today`, the caller's local calendar day.
    /// `previous_plan` is only a variety hint; it is never returned.
    async fn generate(
        &self,
        profile: &UserProfile,
        previous_plan: Option<&DailyPlan>,
        today: NaiveDate,
    ) -> Result<DailyPlan, GenerationError>;
}

#[async_trait]
pub trait NutritionChat: Send + Sync + 'static {
    async fn ask(
        &self,
        profile: &UserProfile,
        plan: Option<&DailyPlan>,
        question: &str,
    ) -> Result<String, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile_json() -> serde_json::Value {
        json!({
            "age": 34,
            "height": 175,
            "currentWeight": 80,
            "targetWeight": 74,
            "gender": "male",
            "region": "São Paulo, Brazil",
            "restrictions": null,
            "preferences": "frango",
            "activityLevel": "MODERATELY_ACTIVE",
            "goal": "LOSE_WEIGHT"
        })
    }

    #[test]
    fn profile_null_restrictions_become_empty() {
        let p: UserProfile = serde_json::from_value(profile_json()).expect("profile");
        assert_eq!(p.restrictions, "");
        assert_eq!(p.preferences, "frango");
        assert_eq!(p.goal, Goal::LoseWeight);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn profile_validation_rejects_non_positive_values() {
        let mut p: UserProfile = serde_json::from_value(profile_json()).expect("profile");
        p.height = 0.0;
        assert_eq!(p.validate().unwrap_err(), "height must be a positive number");
        p.height = 175.0;
        p.age = 0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn plan_without_meal_time_parses_but_is_not_schema_valid() {
        let meal = json!({"name": "Tapioca", "calories": 320, "ingredients": []});
        let payload = json!({
            "motivationalQuote": "Bora!",
            "totalCalories": 1900,
            "macroTargets": {"protein": 140, "carbs": 180, "fats": 60},
            "meals": {"breakfast": meal, "lunch": meal, "snack": meal, "dinner": meal}
        });
        let plan: DailyPlan = serde_json::from_value(payload).expect("legacy plan");
        assert!(!plan.is_schema_valid());
        assert!(plan.shopping_list.is_empty());
    }

    #[test]
    fn older_plan_shapes_load_with_missing_fields_defaulted() {
        let payload = json!({
            "meals": {"breakfast": {"name": "Pão com ovo"}, "dinner": {"name": "Sopa"}},
            "tips": ["Beba água"]
        });
        let plan: DailyPlan = serde_json::from_value(payload).expect("old shape");
        assert_eq!(plan.total_calories, 0.0);
        assert_eq!(plan.meals.breakfast.name, "Pão com ovo");
        assert_eq!(plan.meals.lunch, Meal::default());
        assert!(!plan.is_schema_valid());

        assert!(serde_json::from_value::<DailyPlan>(json!([1, 2])).is_err());
    }

    #[test]
    fn workout_kind_serializes_as_type() {
        let w = Workout {
            kind: "HIIT".into(),
            duration: "30 min".into(),
            exercises: vec![],
        };
        let v = serde_json::to_value(&w).expect("serialize");
        assert_eq!(v.get("type").and_then(|t| t.as_str()), Some("HIIT"));
    }

    #[test]
    fn retryable_classification() {
        assert!(GenerationError::from_status(503, "down".into()).is_retryable());
        assert!(GenerationError::from_status(429, "slow".into()).is_retryable());
        assert!(!GenerationError::from_status(400, "bad".into()).is_retryable());
        assert!(!GenerationError::SchemaViolation.is_retryable());
    }
}
