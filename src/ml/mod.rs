//! Disease-risk prediction pipeline
//!
//! - `schema`: per-disease inputs, training columns and file names
//! - `features`: named inputs to the ordered vector a classifier expects
//! - `dataset`: CSV loading and the seeded train/test split
//! - `classifier`: bagged smartcore decision trees
//! - `store`: load-or-train-and-persist, one shared handle per disease
//! - `risk`: classifier output to LOW / MEDIUM / HIGH
//! - `service`: the orchestrator wiring the pieces together

pub mod classifier;
pub mod dataset;
pub mod features;
pub mod models;
pub mod risk;
pub mod schema;
pub mod service;
pub mod store;

pub use classifier::{Classifier, ForestParams, RandomForestClassifier};
pub use features::FeatureVectorizer;
pub use models::{ClassOutput, ModelMetadata, ModelMetrics, ModelType, TrainingDataset};
pub use schema::{schema_for, DiseaseSchema, FeatureDomain, FeatureSpec};
pub use service::{assess_with, PredictionService, RiskAssessment};
pub use store::{ClassifierStore, ModelSource, ModelStatus, TrainedClassifier};
