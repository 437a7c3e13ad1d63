use crate::error::{AppError, Result};
use crate::models::{
    ChatLog, Disease, DiseaseKind, Prediction, PredictionFilter, Review, ReviewFilter, Session,
    UserProfile,
};
use crate::state::{paginate, username_key, HealthStore};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::Db;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Persistent store using the Sled embedded database.
///
/// One tree per record type, values bincode-encoded, keyed by id bytes.
/// Uniqueness (usernames, one review per user and prediction) is claimed in
/// an index tree with compare-and-swap before the record is written.
#[derive(Clone)]
pub struct SledStore {
    db: Arc<Db>,
    users: sled::Tree,
    usernames: sled::Tree,
    sessions: sled::Tree,
    diseases: sled::Tree,
    predictions: sled::Tree,
    reviews: sled::Tree,
    review_index: sled::Tree,
    chat_logs: sled::Tree,
}

impl SledStore {
    /// Create a new Sled store at the specified path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref).map_err(|e| {
            AppError::Database(format!("Failed to open Sled database: {}", e))
        })?;

        let open = |name: &str| {
            db.open_tree(name).map_err(|e| {
                AppError::Database(format!("Failed to open {} tree: {}", name, e))
            })
        };

        let store = Self {
            users: open("users")?,
            usernames: open("usernames")?,
            sessions: open("sessions")?,
            diseases: open("diseases")?,
            predictions: open("predictions")?,
            reviews: open("reviews")?,
            review_index: open("review_index")?,
            chat_logs: open("chat_logs")?,
            db: Arc::new(db),
        };

        tracing::info!("Initialized Sled store at {:?}", path_ref);
        Ok(store)
    }

    fn put<T: Serialize>(tree: &sled::Tree, key: &[u8], value: &T) -> Result<()> {
        let bytes = bincode::serialize(value)?;
        tree.insert(key, bytes)
            .map_err(|e| AppError::Database(format!("Failed to write record: {}", e)))?;
        Ok(())
    }

    fn fetch<T: DeserializeOwned>(tree: &sled::Tree, key: &[u8]) -> Result<Option<T>> {
        match tree.get(key) {
            Ok(Some(bytes)) => Ok(Some(bincode::deserialize(&bytes)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(AppError::Database(format!("Failed to read record: {}", e))),
        }
    }

    fn scan<T: DeserializeOwned>(tree: &sled::Tree) -> Result<Vec<T>> {
        tree.iter()
            .values()
            .map(|value| {
                let bytes = value
                    .map_err(|e| AppError::Database(format!("Failed to scan tree: {}", e)))?;
                Ok(bincode::deserialize(&bytes)?)
            })
            .collect()
    }

    /// Atomically claim `key` for `id` in an index tree.
    /// Returns the id already holding the key, if any.
    fn claim(tree: &sled::Tree, key: &[u8], id: &Uuid) -> Result<Option<Uuid>> {
        let swapped = tree
            .compare_and_swap(key, None::<&[u8]>, Some(id.as_bytes().to_vec()))
            .map_err(|e| AppError::Database(format!("Failed to update index: {}", e)))?;

        match swapped {
            Ok(()) => Ok(None),
            Err(conflict) => Ok(conflict
                .current
                .and_then(|current| Uuid::from_slice(&current).ok())),
        }
    }

    fn review_key(user_id: &Uuid, prediction_id: &Uuid) -> Vec<u8> {
        let mut key = user_id.as_bytes().to_vec();
        key.extend_from_slice(prediction_id.as_bytes());
        key
    }

    /// Flush pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        self.db.flush_async().await.map_err(|e| {
            AppError::Database(format!("Failed to flush database: {}", e))
        })?;
        Ok(())
    }

    /// Get database size in bytes
    pub fn size_on_disk(&self) -> Result<u64> {
        self.db.size_on_disk().map_err(|e| {
            AppError::Database(format!("Failed to get database size: {}", e))
        })
    }
}

#[async_trait]
impl HealthStore for SledStore {
    async fn create_user(&self, user: &UserProfile) -> Result<()> {
        let key = username_key(&user.username);
        if let Some(existing) = Self::claim(&self.usernames, key.as_bytes(), &user.id)? {
            return Err(AppError::Conflict {
                message: format!("Username '{}' is already taken", user.username),
                existing_id: Some(existing),
            });
        }

        Self::put(&self.users, user.id.as_bytes(), user)?;
        tracing::debug!(user_id = %user.id, "User saved to Sled");
        Ok(())
    }

    async fn update_user(&self, user: &UserProfile) -> Result<()> {
        let current: UserProfile = Self::fetch(&self.users, user.id.as_bytes())?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.id)))?;

        if username_key(&current.username) != username_key(&user.username) {
            return Err(AppError::Validation("Username cannot be changed".to_string()));
        }
        Self::put(&self.users, user.id.as_bytes(), user)
    }

    async fn get_user(&self, id: &Uuid) -> Result<Option<UserProfile>> {
        Self::fetch(&self.users, id.as_bytes())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserProfile>> {
        let id = self
            .usernames
            .get(username_key(username).as_bytes())
            .map_err(|e| AppError::Database(format!("Failed to read username index: {}", e)))?
            .and_then(|bytes| Uuid::from_slice(&bytes).ok());

        match id {
            Some(id) => Self::fetch(&self.users, id.as_bytes()),
            None => Ok(None),
        }
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>> {
        let mut users: Vec<UserProfile> = Self::scan(&self.users)?;
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn save_session(&self, session: &Session) -> Result<()> {
        Self::put(&self.sessions, session.token.as_bytes(), session)
    }

    async fn get_session(&self, token: &str) -> Result<Option<Session>> {
        Self::fetch(&self.sessions, token.as_bytes())
    }

    async fn delete_session(&self, token: &str) -> Result<()> {
        self.sessions
            .remove(token.as_bytes())
            .map_err(|e| AppError::Database(format!("Failed to delete session: {}", e)))?;
        Ok(())
    }

    async fn save_disease(&self, disease: &Disease) -> Result<()> {
        Self::put(&self.diseases, disease.id.as_bytes(), disease)
    }

    async fn get_disease(&self, id: &Uuid) -> Result<Option<Disease>> {
        Self::fetch(&self.diseases, id.as_bytes())
    }

    async fn get_disease_by_kind(&self, kind: DiseaseKind) -> Result<Option<Disease>> {
        let diseases: Vec<Disease> = Self::scan(&self.diseases)?;
        Ok(diseases.into_iter().find(|d| d.kind == kind))
    }

    async fn list_diseases(&self) -> Result<Vec<Disease>> {
        let mut diseases: Vec<Disease> = Self::scan(&self.diseases)?;
        diseases.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(diseases)
    }

    async fn save_prediction(&self, prediction: &Prediction) -> Result<()> {
        Self::put(&self.predictions, prediction.id.as_bytes(), prediction)?;
        self.predictions.flush().map_err(|e| {
            AppError::Database(format!("Failed to flush predictions tree: {}", e))
        })?;
        tracing::debug!(prediction_id = %prediction.id, "Prediction saved to Sled");
        Ok(())
    }

    async fn get_prediction(&self, id: &Uuid) -> Result<Option<Prediction>> {
        Self::fetch(&self.predictions, id.as_bytes())
    }

    async fn list_predictions(
        &self,
        filter: &PredictionFilter,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Prediction>> {
        let mut predictions: Vec<Prediction> = Self::scan::<Prediction>(&self.predictions)?
            .into_iter()
            .filter(|p| filter.matches(p))
            .collect();
        predictions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(predictions, page, page_size))
    }

    async fn count_predictions(&self, filter: &PredictionFilter) -> Result<u64> {
        Ok(Self::scan::<Prediction>(&self.predictions)?
            .iter()
            .filter(|p| filter.matches(p))
            .count() as u64)
    }

    async fn create_review(&self, review: &Review) -> Result<()> {
        let key = Self::review_key(&review.user_id, &review.prediction_id);
        if let Some(existing) = Self::claim(&self.review_index, &key, &review.id)? {
            return Err(AppError::Conflict {
                message: "You have already reviewed this prediction".to_string(),
                existing_id: Some(existing),
            });
        }

        Self::put(&self.reviews, review.id.as_bytes(), review)?;
        tracing::debug!(review_id = %review.id, "Review saved to Sled");
        Ok(())
    }

    async fn update_review(&self, review: &Review) -> Result<()> {
        let exists = self
            .reviews
            .contains_key(review.id.as_bytes())
            .map_err(|e| AppError::Database(format!("Failed to check review: {}", e)))?;
        if !exists {
            return Err(AppError::NotFound(format!("Review {} not found", review.id)));
        }
        Self::put(&self.reviews, review.id.as_bytes(), review)
    }

    async fn get_review(&self, id: &Uuid) -> Result<Option<Review>> {
        Self::fetch(&self.reviews, id.as_bytes())
    }

    async fn delete_review(&self, id: &Uuid) -> Result<()> {
        let removed = self
            .reviews
            .remove(id.as_bytes())
            .map_err(|e| AppError::Database(format!("Failed to delete review: {}", e)))?
            .ok_or_else(|| AppError::NotFound(format!("Review {} not found", id)))?;

        let review: Review = bincode::deserialize(&removed)?;
        self.review_index
            .remove(Self::review_key(&review.user_id, &review.prediction_id))
            .map_err(|e| AppError::Database(format!("Failed to update index: {}", e)))?;

        tracing::debug!(review_id = %id, "Review deleted from Sled");
        Ok(())
    }

    async fn list_reviews(
        &self,
        filter: &ReviewFilter,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Review>> {
        let mut reviews: Vec<Review> = Self::scan::<Review>(&self.reviews)?
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(reviews, page, page_size))
    }

    async fn count_reviews(&self, filter: &ReviewFilter) -> Result<u64> {
        Ok(Self::scan::<Review>(&self.reviews)?
            .iter()
            .filter(|r| filter.matches(r))
            .count() as u64)
    }

    async fn save_chat_log(&self, log: &ChatLog) -> Result<()> {
        Self::put(&self.chat_logs, log.id.as_bytes(), log)
    }

    async fn list_chat_logs(
        &self,
        user_id: &Uuid,
        conversation_id: Option<&str>,
    ) -> Result<Vec<ChatLog>> {
        let mut logs: Vec<ChatLog> = Self::scan::<ChatLog>(&self.chat_logs)?
            .into_iter()
            .filter(|log| {
                log.user_id == *user_id
                    && conversation_id.map_or(true, |c| log.conversation_id == c)
            })
            .collect();
        logs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(logs)
    }

    async fn delete_conversation(&self, user_id: &Uuid, conversation_id: &str) -> Result<usize> {
        let logs = self.list_chat_logs(user_id, Some(conversation_id)).await?;
        for log in &logs {
            self.chat_logs
                .remove(log.id.as_bytes())
                .map_err(|e| AppError::Database(format!("Failed to delete chat log: {}", e)))?;
        }
        Ok(logs.len())
    }

    async fn count_chat_logs(&self) -> Result<u64> {
        Ok(self.chat_logs.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeatureInput, RiskLevel};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let owner = Uuid::new_v4();
        let prediction = Prediction::new(
            owner,
            Uuid::new_v4(),
            DiseaseKind::HeartDisease,
            [("age".to_string(), 61.0)].into_iter().collect::<FeatureInput>(),
            RiskLevel::High,
            91.0,
        );

        {
            let store = SledStore::new(dir.path()).unwrap();
            store.save_prediction(&prediction).await.unwrap();
            store.flush().await.unwrap();
        }

        let store = SledStore::new(dir.path()).unwrap();
        let loaded = store.get_prediction(&prediction.id).await.unwrap().unwrap();
        assert_eq!(loaded.risk_level, RiskLevel::High);
        assert_eq!(loaded.symptoms_data["age"], 61.0);
    }

    #[tokio::test]
    async fn test_username_claim_is_exclusive() {
        let dir = TempDir::new().unwrap();
        let store = SledStore::new(dir.path()).unwrap();

        let bob = UserProfile::new(
            "bob".to_string(),
            "bob@example.com".to_string(),
            "h".to_string(),
            "s".to_string(),
        );
        store.create_user(&bob).await.unwrap();

        let impostor = UserProfile::new(
            "BOB".to_string(),
            "other@example.com".to_string(),
            "h".to_string(),
            "s".to_string(),
        );
        let result = store.create_user(&impostor).await;
        assert!(matches!(
            result,
            Err(AppError::Conflict { existing_id: Some(id), .. }) if id == bob.id
        ));
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_review_index_released_on_delete() {
        let dir = TempDir::new().unwrap();
        let store = SledStore::new(dir.path()).unwrap();
        let owner = Uuid::new_v4();
        let prediction_id = Uuid::new_v4();

        let first = Review::new(
            owner,
            Uuid::new_v4(),
            DiseaseKind::Asthma,
            prediction_id,
            5,
            "Accurate".to_string(),
        );
        store.create_review(&first).await.unwrap();
        assert!(store.create_review(&first).await.is_err());

        store.delete_review(&first.id).await.unwrap();
        assert!(store.get_review(&first.id).await.unwrap().is_none());
        store.create_review(&first).await.unwrap();
        assert!(matches!(
            store.delete_review(&Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
