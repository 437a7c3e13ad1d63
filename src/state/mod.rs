pub mod factory;
pub mod sled_store;
pub mod store;

pub use factory::{create_in_memory_store, create_store};
pub use sled_store::SledStore;
pub use store::InMemoryStore;

use crate::error::Result;
use crate::models::{
    ChatLog, Disease, DiseaseKind, Prediction, PredictionFilter, Review, ReviewFilter, Session,
    UserProfile,
};
use async_trait::async_trait;
use uuid::Uuid;

/// Trait for SymptoScan storage operations
#[async_trait]
pub trait HealthStore: Send + Sync {
    // Users

    /// Insert a new user. Fails with `Conflict` when the username is taken
    /// (compared case-insensitively).
    async fn create_user(&self, user: &UserProfile) -> Result<()>;

    /// Replace an existing user. The username cannot change.
    async fn update_user(&self, user: &UserProfile) -> Result<()>;

    async fn get_user(&self, id: &Uuid) -> Result<Option<UserProfile>>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserProfile>>;

    /// All users, newest first
    async fn list_users(&self) -> Result<Vec<UserProfile>>;

    // Sessions

    async fn save_session(&self, session: &Session) -> Result<()>;

    async fn get_session(&self, token: &str) -> Result<Option<Session>>;

    async fn delete_session(&self, token: &str) -> Result<()>;

    // Diseases

    /// Insert or replace a disease record
    async fn save_disease(&self, disease: &Disease) -> Result<()>;

    async fn get_disease(&self, id: &Uuid) -> Result<Option<Disease>>;

    async fn get_disease_by_kind(&self, kind: DiseaseKind) -> Result<Option<Disease>>;

    /// All diseases, by name
    async fn list_diseases(&self) -> Result<Vec<Disease>>;

    // Predictions

    async fn save_prediction(&self, prediction: &Prediction) -> Result<()>;

    async fn get_prediction(&self, id: &Uuid) -> Result<Option<Prediction>>;

    /// Matching predictions, newest first
    async fn list_predictions(
        &self,
        filter: &PredictionFilter,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Prediction>>;

    async fn count_predictions(&self, filter: &PredictionFilter) -> Result<u64>;

    // Reviews

    /// Insert a review. A second review of the same prediction by the same
    /// user fails with `Conflict` carrying the existing review id.
    async fn create_review(&self, review: &Review) -> Result<()>;

    async fn update_review(&self, review: &Review) -> Result<()>;

    async fn get_review(&self, id: &Uuid) -> Result<Option<Review>>;

    async fn delete_review(&self, id: &Uuid) -> Result<()>;

    /// Matching reviews, newest first
    async fn list_reviews(
        &self,
        filter: &ReviewFilter,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Review>>;

    async fn count_reviews(&self, filter: &ReviewFilter) -> Result<u64>;

    // Chat logs

    async fn save_chat_log(&self, log: &ChatLog) -> Result<()>;

    /// A user's logs, oldest first, optionally restricted to one conversation
    async fn list_chat_logs(
        &self,
        user_id: &Uuid,
        conversation_id: Option<&str>,
    ) -> Result<Vec<ChatLog>>;

    /// Remove a user's conversation, returning how many logs were deleted
    async fn delete_conversation(&self, user_id: &Uuid, conversation_id: &str) -> Result<usize>;

    async fn count_chat_logs(&self) -> Result<u64>;
}

/// Page through an already-sorted list
pub(crate) fn paginate<T>(items: Vec<T>, page: u32, page_size: u32) -> Vec<T> {
    let start = (page as usize).saturating_mul(page_size as usize);
    items
        .into_iter()
        .skip(start)
        .take(page_size as usize)
        .collect()
}

/// Lower-cased key used for username uniqueness
pub(crate) fn username_key(username: &str) -> String {
    username.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate() {
        let items: Vec<u32> = (0..25).collect();
        assert_eq!(paginate(items.clone(), 0, 10), (0..10).collect::<Vec<_>>());
        assert_eq!(paginate(items.clone(), 2, 10), (20..25).collect::<Vec<_>>());
        assert!(paginate(items.clone(), 3, 10).is_empty());
        assert_eq!(paginate(items, 0, u32::MAX).len(), 25);
    }

    #[test]
    fn test_username_key() {
        assert_eq!(username_key("  Alice "), "alice");
    }
}
