//! Middleware layer for cross-cutting concerns around the generator.
//!
//! Wraps any `PlanGenerator` / `NutritionChat` with debug logging and the
//! generation counters/histograms, so mocked and real generators are measured
//! the same way.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::NaiveDate;
use nutrigpt_client::observability::{GenerationKind, record_generation};
use nutrigpt_client::{DailyPlan, GenerationError, NutritionChat, PlanGenerator, UserProfile};
use tracing::debug;

pub struct LoggingGenerator<G> {
    inner: Arc<G>,
}

impl<G: Send + Sync + 'static> LoggingGenerator<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    async fn with_logging<F, Fut, T>(
        &self,
        kind: GenerationKind,
        operation: F,
    ) -> Result<T, GenerationError>
    where
        F: FnOnce(Arc<G>) -> Fut,
        Fut: std::future::Future<Output = Result<T, GenerationError>>,
    {
        let start = Instant::now();
        debug!(kind = kind.as_str(), "generation started");

        let result = operation(self.inner.clone()).await;

        let elapsed = start.elapsed();
        record_generation(kind, result.is_ok(), elapsed);
        match &result {
            Ok(_) => debug!(
                kind = kind.as_str(),
                elapsed_ms = elapsed.as_millis() as u64,
                "generation completed"
            ),
            Err(e) => debug!(
                kind = kind.as_str(),
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "generation failed"
            ),
        }
        result
    }
}

#[async_trait]
impl<G: PlanGenerator> PlanGenerator for LoggingGenerator<G> {
    async fn generate(
        &self,
        profile: &UserProfile,
        previous_plan: Option<&DailyPlan>,
        today: NaiveDate,
    ) -> Result<DailyPlan, GenerationError> {
        self.with_logging(GenerationKind::Plan, |g| async move {
            g.generate(profile, previous_plan, today).await
        })
        .await
    }
}

#[async_trait]
impl<G: NutritionChat> NutritionChat for LoggingGenerator<G> {
    async fn ask(
        &self,
        profile: &UserProfile,
        plan: Option<&DailyPlan>,
        question: &str,
    ) -> Result<String, GenerationError> {
        self.with_logging(GenerationKind::Chat, |g| async move {
            g.ask(profile, plan, question).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ScriptedChat, ScriptedGenerator, sample_plan, sample_profile};

    #[tokio::test]
    async fn passes_results_through() {
        let generator =
            LoggingGenerator::new(ScriptedGenerator::returning(sample_plan("Ovos", "07:00")));
        let plan = generator
            .generate(
                &sample_profile(),
                None,
                NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            )
            .await
            .expect("plan");
        assert_eq!(plan.meals.breakfast.name, "Ovos");
        assert_eq!(generator.inner.calls(), 1);
    }

    #[tokio::test]
    async fn passes_errors_through() {
        let chat = LoggingGenerator::new(ScriptedChat { answer: None });
        let err = chat
            .ask(&sample_profile(), None, "oi")
            .await
            .expect_err("error");
        assert!(err.is_retryable());
    }
}
