//! Shared test fixtures and scripted `PlanGenerator` / `NutritionChat` implementations.
#![cfg(test)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use nutrigpt_client::{
    ActivityLevel, DailyPlan, Gender, GenerationError, Goal, MacroTargets, Meal, Meals,
    NutritionChat, PlanGenerator, UserProfile, Workout,
};

pub fn sample_profile() -> UserProfile {
    UserProfile {
        age: 34,
        height: 175.0,
        current_weight: 80.0,
        target_weight: 74.0,
        gender: Gender::Female,
        region: "Recife, Brazil".into(),
        restrictions: String::new(),
        preferences: "peixe".into(),
        activity_level: ActivityLevel::LightlyActive,
        goal: Goal::LoseWeight,
    }
}

fn meal(name: &str, time: &str) -> Meal {
    Meal {
        time: time.into(),
        name: name.into(),
        calories: 400.0,
        ..Meal::default()
    }
}

/// A plan whose breakfast is `breakfast` at `time`; an empty `time` yields a stale-schema plan.
pub fn sample_plan(breakfast: &str, time: &str) -> DailyPlan {
    DailyPlan {
        date: "Segunda-feira, 19 de Outubro".into(),
        motivational_quote: "Constância vence intensidade.".into(),
        total_calories: 1800.0,
        macro_targets: MacroTargets {
            protein: 130.0,
            carbs: 180.0,
            fats: 60.0,
        },
        meals: Meals {
            breakfast: meal(breakfast, time),
            lunch: meal("Frango com salada", "12:30"),
            snack: meal("Iogurte", "16:00"),
            dinner: meal("Sopa de legumes", "19:30"),
        },
        workout: Workout {
            kind: "Caminhada".into(),
            duration: "30 min".into(),
            exercises: vec![],
        },
        ..DailyPlan::default()
    }
}

/// Pops queued results first, then falls back to cloning `fallback`; with neither it fails.
#[derive(Default)]
pub struct ScriptedGenerator {
    queue: Mutex<VecDeque<Result<DailyPlan, GenerationError>>>,
    fallback: Option<DailyPlan>,
    previous: Mutex<Vec<Option<String>>>,
    days: Mutex<Vec<NaiveDate>>,
}

impl ScriptedGenerator {
    pub fn returning(plan: DailyPlan) -> Self {
        Self {
            fallback: Some(plan),
            ..Self::default()
        }
    }

    pub fn push(&self, result: Result<DailyPlan, GenerationError>) {
        self.queue.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> usize {
        self.previous.lock().unwrap().len()
    }

    /// Breakfast name of the `previous_plan` passed on each call.
    pub fn previous_breakfasts(&self) -> Vec<Option<String>> {
        self.previous.lock().unwrap().clone()
    }

    /// The `today` argument passed on each call.
    pub fn days(&self) -> Vec<NaiveDate> {
        self.days.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlanGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        _profile: &UserProfile,
        previous_plan: Option<&DailyPlan>,
        today: NaiveDate,
    ) -> Result<DailyPlan, GenerationError> {
        self.days.lock().unwrap().push(today);
        self.previous
            .lock()
            .unwrap()
            .push(previous_plan.map(|p| p.meals.breakfast.name.clone()));
        if let Some(next) = self.queue.lock().unwrap().pop_front() {
            return next;
        }
        self.fallback.clone().ok_or(GenerationError::EmptyResponse)
    }
}

pub struct ScriptedChat {
    pub answer: Option<String>,
}

#[async_trait]
impl NutritionChat for ScriptedChat {
    async fn ask(
        &self,
        _profile: &UserProfile,
        plan: Option<&DailyPlan>,
        question: &str,
    ) -> Result<String, GenerationError> {
        match &self.answer {
            Some(a) => Ok(format!(
                "{a} [{question}] plan={}",
                plan.map(|p| p.total_calories).unwrap_or_default()
            )),
            None => Err(GenerationError::from_status(503, "unavailable".into())),
        }
    }
}
