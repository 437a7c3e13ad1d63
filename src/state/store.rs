use crate::error::{AppError, Result};
use crate::models::{
    ChatLog, Disease, DiseaseKind, Prediction, PredictionFilter, Review, ReviewFilter, Session,
    UserProfile,
};
use crate::state::{paginate, username_key, HealthStore};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// In-memory store (for development and testing)
#[derive(Clone, Default)]
pub struct InMemoryStore {
    users: Arc<DashMap<Uuid, UserProfile>>,
    username_index: Arc<DashMap<String, Uuid>>,
    sessions: Arc<DashMap<String, Session>>,
    diseases: Arc<DashMap<Uuid, Disease>>,
    predictions: Arc<DashMap<Uuid, Prediction>>,
    reviews: Arc<DashMap<Uuid, Review>>,
    /// (user, prediction) -> review
    review_index: Arc<DashMap<(Uuid, Uuid), Uuid>>,
    chat_logs: Arc<DashMap<Uuid, ChatLog>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn matching_predictions(&self, filter: &PredictionFilter) -> Vec<Prediction> {
        self.predictions
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn matching_reviews(&self, filter: &ReviewFilter) -> Vec<Review> {
        self.reviews
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }
}

#[async_trait]
impl HealthStore for InMemoryStore {
    async fn create_user(&self, user: &UserProfile) -> Result<()> {
        match self.username_index.entry(username_key(&user.username)) {
            Entry::Occupied(existing) => Err(AppError::Conflict {
                message: format!("Username '{}' is already taken", user.username),
                existing_id: Some(*existing.get()),
            }),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.users.insert(user.id, user.clone());
                tracing::debug!(user_id = %user.id, "User created");
                Ok(())
            }
        }
    }

    async fn update_user(&self, user: &UserProfile) -> Result<()> {
        match self.users.get_mut(&user.id) {
            Some(mut entry) => {
                if username_key(&entry.username) != username_key(&user.username) {
                    return Err(AppError::Validation("Username cannot be changed".to_string()));
                }
                *entry = user.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("User {} not found", user.id))),
        }
    }

    async fn get_user(&self, id: &Uuid) -> Result<Option<UserProfile>> {
        Ok(self.users.get(id).map(|entry| entry.clone()))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserProfile>> {
        let id = match self.username_index.get(&username_key(username)) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.users.get(&id).map(|entry| entry.clone()))
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>> {
        let mut users: Vec<UserProfile> = self.users.iter().map(|e| e.value().clone()).collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn save_session(&self, session: &Session) -> Result<()> {
        self.sessions.insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn get_session(&self, token: &str) -> Result<Option<Session>> {
        Ok(self.sessions.get(token).map(|entry| entry.clone()))
    }

    async fn delete_session(&self, token: &str) -> Result<()> {
        self.sessions.remove(token);
        Ok(())
    }

    async fn save_disease(&self, disease: &Disease) -> Result<()> {
        self.diseases.insert(disease.id, disease.clone());
        Ok(())
    }

    async fn get_disease(&self, id: &Uuid) -> Result<Option<Disease>> {
        Ok(self.diseases.get(id).map(|entry| entry.clone()))
    }

    async fn get_disease_by_kind(&self, kind: DiseaseKind) -> Result<Option<Disease>> {
        Ok(self
            .diseases
            .iter()
            .find(|entry| entry.kind == kind)
            .map(|entry| entry.value().clone()))
    }

    async fn list_diseases(&self) -> Result<Vec<Disease>> {
        let mut diseases: Vec<Disease> =
            self.diseases.iter().map(|e| e.value().clone()).collect();
        diseases.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(diseases)
    }

    async fn save_prediction(&self, prediction: &Prediction) -> Result<()> {
        self.predictions.insert(prediction.id, prediction.clone());
        tracing::debug!(prediction_id = %prediction.id, "Prediction saved");
        Ok(())
    }

    async fn get_prediction(&self, id: &Uuid) -> Result<Option<Prediction>> {
        Ok(self.predictions.get(id).map(|entry| entry.clone()))
    }

    async fn list_predictions(
        &self,
        filter: &PredictionFilter,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Prediction>> {
        let mut predictions = self.matching_predictions(filter);
        predictions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(predictions, page, page_size))
    }

    async fn count_predictions(&self, filter: &PredictionFilter) -> Result<u64> {
        Ok(self
            .predictions
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .count() as u64)
    }

    async fn create_review(&self, review: &Review) -> Result<()> {
        match self.review_index.entry((review.user_id, review.prediction_id)) {
            Entry::Occupied(existing) => Err(AppError::Conflict {
                message: "You have already reviewed this prediction".to_string(),
                existing_id: Some(*existing.get()),
            }),
            Entry::Vacant(slot) => {
                slot.insert(review.id);
                self.reviews.insert(review.id, review.clone());
                tracing::debug!(review_id = %review.id, "Review saved");
                Ok(())
            }
        }
    }

    async fn update_review(&self, review: &Review) -> Result<()> {
        if self.reviews.contains_key(&review.id) {
            self.reviews.insert(review.id, review.clone());
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Review {} not found", review.id)))
        }
    }

    async fn get_review(&self, id: &Uuid) -> Result<Option<Review>> {
        Ok(self.reviews.get(id).map(|entry| entry.clone()))
    }

    async fn delete_review(&self, id: &Uuid) -> Result<()> {
        match self.reviews.remove(id) {
            Some((_, review)) => {
                self.review_index
                    .remove(&(review.user_id, review.prediction_id));
                tracing::debug!(review_id = %id, "Review deleted");
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Review {} not found", id))),
        }
    }

    async fn list_reviews(
        &self,
        filter: &ReviewFilter,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Review>> {
        let mut reviews = self.matching_reviews(filter);
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(reviews, page, page_size))
    }

    async fn count_reviews(&self, filter: &ReviewFilter) -> Result<u64> {
        Ok(self
            .reviews
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .count() as u64)
    }

    async fn save_chat_log(&self, log: &ChatLog) -> Result<()> {
        self.chat_logs.insert(log.id, log.clone());
        Ok(())
    }

    async fn list_chat_logs(
        &self,
        user_id: &Uuid,
        conversation_id: Option<&str>,
    ) -> Result<Vec<ChatLog>> {
        let mut logs: Vec<ChatLog> = self
            .chat_logs
            .iter()
            .filter(|entry| {
                entry.user_id == *user_id
                    && conversation_id.map_or(true, |c| entry.conversation_id == c)
            })
            .map(|entry| entry.value().clone())
            .collect();
        logs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(logs)
    }

    async fn delete_conversation(&self, user_id: &Uuid, conversation_id: &str) -> Result<usize> {
        let before = self.chat_logs.len();
        self.chat_logs.retain(|_, log| {
            !(log.user_id == *user_id && log.conversation_id == conversation_id)
        });
        Ok(before.saturating_sub(self.chat_logs.len()))
    }

    async fn count_chat_logs(&self) -> Result<u64> {
        Ok(self.chat_logs.len() as u64)
    }
}
