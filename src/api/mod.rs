pub mod admin;
pub mod auth;
pub mod chat;
pub mod handlers;
pub mod routes;

pub use auth::{AuthUser, StaffUser};
pub use routes::*;

use crate::accounts::AccountService;
use crate::chat::ChatService;
use crate::config::Config;
use crate::error::Result;
use crate::ml::{ClassifierStore, PredictionService};
use crate::state::HealthStore;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn HealthStore>,
    pub predictions: PredictionService,
    pub accounts: Arc<AccountService>,
    pub chat: Arc<ChatService>,
    pub chat_enabled: bool,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<dyn HealthStore>,
        predictions: PredictionService,
        accounts: Arc<AccountService>,
        chat: Arc<ChatService>,
    ) -> Self {
        Self {
            store,
            predictions,
            accounts,
            chat,
            chat_enabled: true,
            started_at: Instant::now(),
        }
    }

    /// Wire every service from configuration around an existing store
    pub fn from_config(config: &Config, store: Arc<dyn HealthStore>) -> Result<Self> {
        let classifiers = Arc::new(ClassifierStore::new(config.models.clone()));
        let predictions = PredictionService::new(classifiers);
        let accounts = Arc::new(AccountService::new(store.clone(), config.accounts.clone()));
        let chat = Arc::new(ChatService::from_config(store.clone(), &config.chat)?);

        Ok(Self::new(store, predictions, accounts, chat).with_chat_enabled(config.chat.enabled))
    }

    /// Mount or hide the chat routes
    pub fn with_chat_enabled(mut self, enabled: bool) -> Self {
        self.chat_enabled = enabled;
        self
    }

    pub fn classifiers(&self) -> &Arc<ClassifierStore> {
        self.predictions.classifiers()
    }
}
