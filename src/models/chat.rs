use crate::models::{DiseaseKind, RiskLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One side of a chat exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub disease: Option<DiseaseKind>,
    pub prediction_id: Option<Uuid>,
    pub conversation_id: String,

    /// Set on user messages
    pub message: String,

    /// Set on assistant messages
    pub response: String,

    pub is_user_message: bool,
    pub timestamp: DateTime<Utc>,
}

impl ChatLog {
    pub fn user_message(
        user_id: Uuid,
        conversation_id: &str,
        context: Option<&ChatContext>,
        message: String,
    ) -> Self {
        Self::build(user_id, conversation_id, context, message, String::new(), true)
    }

    pub fn assistant_message(
        user_id: Uuid,
        conversation_id: &str,
        context: Option<&ChatContext>,
        response: String,
    ) -> Self {
        Self::build(user_id, conversation_id, context, String::new(), response, false)
    }

    fn build(
        user_id: Uuid,
        conversation_id: &str,
        context: Option<&ChatContext>,
        message: String,
        response: String,
        is_user_message: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            disease: context.map(|c| c.disease),
            prediction_id: context.map(|c| c.prediction_id),
            conversation_id: conversation_id.to_string(),
            message,
            response,
            is_user_message,
            timestamp: Utc::now(),
        }
    }

    /// Text of whichever side this entry records
    pub fn text(&self) -> &str {
        if self.is_user_message {
            &self.message
        } else {
            &self.response
        }
    }
}

/// Prediction a conversation is anchored to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatContext {
    pub prediction_id: Uuid,
    pub disease: DiseaseKind,
    pub disease_name: String,
    pub description: String,
    pub symptoms: String,
    pub prevention: String,
    pub risk_level: RiskLevel,
}

/// Listing entry for a user's conversations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub disease: Option<DiseaseKind>,
    pub prediction_id: Option<Uuid>,
    pub started_at: DateTime<Utc>,
    pub message_count: usize,

    /// First assistant line, or a placeholder when the user spoke first
    pub first_message: String,
}

impl ConversationSummary {
    /// Summarize one conversation's logs, given in chronological order
    pub fn from_logs(logs: &[ChatLog]) -> Option<Self> {
        let first = logs.first()?;
        let first_message = if first.is_user_message {
            "Conversation started".to_string()
        } else {
            first.response.clone()
        };

        Some(Self {
            conversation_id: first.conversation_id.clone(),
            disease: logs.iter().find_map(|l| l.disease),
            prediction_id: logs.iter().find_map(|l| l.prediction_id),
            started_at: first.timestamp,
            message_count: logs.len(),
            first_message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_from_logs() {
        let user = Uuid::new_v4();
        let logs = vec![
            ChatLog::assistant_message(user, "c1", None, "Hello!".to_string()),
            ChatLog::user_message(user, "c1", None, "What is BMI?".to_string()),
        ];

        let summary = ConversationSummary::from_logs(&logs).unwrap();
        assert_eq!(summary.conversation_id, "c1");
        assert_eq!(summary.message_count, 2);
        assert_eq!(summary.first_message, "Hello!");
        assert!(ConversationSummary::from_logs(&[]).is_none());
    }

    #[test]
    fn test_text_picks_side() {
        let user = Uuid::new_v4();
        let question = ChatLog::user_message(user, "c", None, "hi".to_string());
        let answer = ChatLog::assistant_message(user, "c", None, "hello".to_string());

        assert_eq!(question.text(), "hi");
        assert_eq!(answer.text(), "hello");
        assert!(question.response.is_empty());
    }
}
