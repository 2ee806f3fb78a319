//! Question/answer chat with the nutritionist persona.
//!
//! Each question is answered independently; no conversation history is sent
//! to the generator.

use std::sync::Arc;

use chrono::Utc;
use nutrigpt_client::{NutritionChat, UserProfile};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::PlanCache;
use crate::error::{AppError, AppResult};

pub const CHAT_FAILURE_MESSAGE: &str =
    "Tive um problema ao consultar o nutricionista. Tente novamente.";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
}

impl ChatMessage {
    fn assistant(content: String) -> Self {
        Self {
            role: ChatRole::Assistant,
            content,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

pub struct ChatService {
    chat: Arc<dyn NutritionChat>,
    plans: Arc<PlanCache>,
}

impl ChatService {
    pub fn new(chat: Arc<dyn NutritionChat>, plans: Arc<PlanCache>) -> Self {
        Self { chat, plans }
    }

    pub fn welcome(&self, profile: &UserProfile) -> ChatMessage {
        ChatMessage::assistant(format!(
            "Olá! Sou seu NutriGPT. Vi que seu objetivo é {}. Como posso ajudar com sua dieta ou treino hoje?",
            profile.goal.label().to_lowercase()
        ))
    }

    /// Answer one question using today's cached plan, if any, as context.
    /// Generator failures become an apology message rather than an error.
    pub async fn ask(&self, profile: &UserProfile, question: &str) -> AppResult<ChatMessage> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::Validation("question must not be empty".into()));
        }
        let plan = self.plans.current_plan();
        let content = match self.chat.ask(profile, plan.as_ref(), question).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "chat generation failed");
                CHAT_FAILURE_MESSAGE.to_string()
            }
        };
        Ok(ChatMessage::assistant(content))
    }
}
