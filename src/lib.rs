//! SymptoScan: disease-risk prediction with reviews, a health chat and a
//! staff back-office.
//!
//! - `ml`: schemas, vectorizer, bagged-tree classifiers and risk buckets
//! - `state`: persistence behind the `HealthStore` trait (memory or sled)
//! - `accounts`, `forms`, `catalog`: users, form validation, disease records
//! - `chat`: topic filter, prompts and the LLM broker
//! - `insights`: word cloud, dashboard and mock statistics
//! - `api`: the axum router

pub mod accounts;
pub mod api;
pub mod catalog;
pub mod chat;
pub mod config;
pub mod error;
pub mod forms;
pub mod insights;
pub mod metrics;
pub mod ml;
pub mod models;
pub mod state;

pub use error::{AppError, Result};
