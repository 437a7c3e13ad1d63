use super::filter::is_health_related;
use super::llm::{ChatCompletion, ChatMessage, OpenAiClient};
use super::prompts::{
    initial_message, mock_response, system_prompt, FALLBACK_RESPONSE, HEALTH_FOCUS_REMINDER,
};
use crate::config::ChatConfig;
use crate::error::{AppError, Result};
use crate::metrics::CHAT_MESSAGES_TOTAL;
use crate::models::{ChatContext, ChatLog, ConversationSummary, Disease, Prediction};
use crate::state::HealthStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Reply returned to the client for one user message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub conversation_id: String,
    pub response: String,
    pub is_health_related: bool,
    /// Set when the LLM call failed and the fallback text was used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Context for a conversation anchored to a prediction
pub fn context_for(prediction: &Prediction, disease: &Disease) -> ChatContext {
    ChatContext {
        prediction_id: prediction.id,
        disease: prediction.disease,
        disease_name: disease.name.clone(),
        description: disease.description.clone(),
        symptoms: disease.symptoms.clone(),
        prevention: disease.prevention.clone(),
        risk_level: prediction.risk_level,
    }
}

/// Health chat broker
pub struct ChatService {
    store: Arc<dyn HealthStore>,
    backend: Option<Arc<dyn ChatCompletion>>,
    history_limit: usize,
}

impl ChatService {
    pub fn new(
        store: Arc<dyn HealthStore>,
        backend: Option<Arc<dyn ChatCompletion>>,
        history_limit: usize,
    ) -> Self {
        Self {
            store,
            backend,
            history_limit,
        }
    }

    /// Build from configuration. Without an API key in the configured
    /// environment variable, replies come from the offline mock.
    pub fn from_config(store: Arc<dyn HealthStore>, config: &ChatConfig) -> Result<Self> {
        let backend: Option<Arc<dyn ChatCompletion>> = match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => {
                tracing::info!(model = %config.model, "✅ Chat broker using LLM endpoint");
                Some(Arc::new(OpenAiClient::new(config, key)?))
            }
            _ => {
                tracing::info!(
                    env = %config.api_key_env,
                    "⚠️  No LLM API key configured, chat uses offline responses"
                );
                None
            }
        };

        Ok(Self::new(store, backend, config.history_limit))
    }

    pub fn uses_llm(&self) -> bool {
        self.backend.is_some()
    }

    /// Open a conversation with a greeting that names the prediction
    pub async fn start_conversation(&self, user_id: Uuid, context: &ChatContext) -> Result<ChatReply> {
        let conversation_id = Uuid::new_v4().to_string();
        let greeting = initial_message(context);

        let log = ChatLog::assistant_message(user_id, &conversation_id, Some(context), greeting.clone());
        self.store.save_chat_log(&log).await?;

        tracing::info!(
            user_id = %user_id,
            conversation_id = %conversation_id,
            disease = %context.disease,
            "💬 Conversation started"
        );

        Ok(ChatReply {
            conversation_id,
            response: greeting,
            is_health_related: true,
            error: None,
        })
    }

    pub async fn send_message(
        &self,
        user_id: Uuid,
        message: &str,
        context: Option<&ChatContext>,
        conversation_id: Option<String>,
    ) -> Result<ChatReply> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::Validation("Message cannot be empty".to_string()));
        }

        let conversation_id = conversation_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        if !is_health_related(message) {
            CHAT_MESSAGES_TOTAL.with_label_values(&["off_topic"]).inc();
            self.record(user_id, &conversation_id, context, message, HEALTH_FOCUS_REMINDER)
                .await?;
            return Ok(ChatReply {
                conversation_id,
                response: HEALTH_FOCUS_REMINDER.to_string(),
                is_health_related: false,
                error: None,
            });
        }

        let (response, error) = match &self.backend {
            Some(backend) => {
                let messages = self.build_messages(user_id, &conversation_id, context, message).await?;
                match backend.complete(&messages).await {
                    Ok(reply) => {
                        CHAT_MESSAGES_TOTAL.with_label_values(&["llm"]).inc();
                        (reply, None)
                    }
                    Err(e) => {
                        tracing::warn!(
                            conversation_id = %conversation_id,
                            error = %e,
                            "Chat completion failed, using fallback response"
                        );
                        CHAT_MESSAGES_TOTAL.with_label_values(&["fallback"]).inc();
                        (FALLBACK_RESPONSE.to_string(), Some(e.to_string()))
                    }
                }
            }
            None => {
                CHAT_MESSAGES_TOTAL.with_label_values(&["mock"]).inc();
                (mock_response(message, context), None)
            }
        };

        self.record(user_id, &conversation_id, context, message, &response)
            .await?;

        Ok(ChatReply {
            conversation_id,
            response,
            is_health_related: true,
            error,
        })
    }

    /// System prompt, the last `history_limit` logs in order, then the new message
    async fn build_messages(
        &self,
        user_id: Uuid,
        conversation_id: &str,
        context: Option<&ChatContext>,
        message: &str,
    ) -> Result<Vec<ChatMessage>> {
        let logs = self
            .store
            .list_chat_logs(&user_id, Some(conversation_id))
            .await?;
        let skip = logs.len().saturating_sub(self.history_limit);

        let mut messages = vec![ChatMessage::system(system_prompt(context))];
        messages.extend(logs.into_iter().skip(skip).map(|log| {
            if log.is_user_message {
                ChatMessage::user(log.message)
            } else {
                ChatMessage::assistant(log.response)
            }
        }));
        messages.push(ChatMessage::user(message));
        Ok(messages)
    }

    async fn record(
        &self,
        user_id: Uuid,
        conversation_id: &str,
        context: Option<&ChatContext>,
        message: &str,
        response: &str,
    ) -> Result<()> {
        let question = ChatLog::user_message(user_id, conversation_id, context, message.to_string());
        self.store.save_chat_log(&question).await?;

        let mut answer =
            ChatLog::assistant_message(user_id, conversation_id, context, response.to_string());
        // Logs are replayed by timestamp; the answer must sort after its question
        if answer.timestamp <= question.timestamp {
            answer.timestamp = question.timestamp + chrono::Duration::microseconds(1);
        }
        self.store.save_chat_log(&answer).await
    }

    /// A user's conversations, most recently started first
    pub async fn list_conversations(&self, user_id: Uuid) -> Result<Vec<ConversationSummary>> {
        let logs = self.store.list_chat_logs(&user_id, None).await?;

        let mut grouped: BTreeMap<String, Vec<ChatLog>> = BTreeMap::new();
        for log in logs {
            grouped
                .entry(log.conversation_id.clone())
                .or_default()
                .push(log);
        }

        let mut summaries: Vec<ConversationSummary> = grouped
            .values()
            .filter_map(|logs| ConversationSummary::from_logs(logs))
            .collect();
        summaries.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(summaries)
    }

    pub async fn conversation(&self, user_id: Uuid, conversation_id: &str) -> Result<Vec<ChatLog>> {
        let logs = self
            .store
            .list_chat_logs(&user_id, Some(conversation_id))
            .await?;
        if logs.is_empty() {
            return Err(AppError::NotFound(format!(
                "Conversation {} not found",
                conversation_id
            )));
        }
        Ok(logs)
    }

    pub async fn delete_conversation(&self, user_id: Uuid, conversation_id: &str) -> Result<usize> {
        let removed = self
            .store
            .delete_conversation(&user_id, conversation_id)
            .await?;
        if removed == 0 {
            return Err(AppError::NotFound(format!(
                "Conversation {} not found",
                conversation_id
            )));
        }
        tracing::info!(user_id = %user_id, conversation_id, removed, "Conversation deleted");
        Ok(removed)
    }
}
