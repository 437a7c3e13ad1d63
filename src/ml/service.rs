use crate::error::{AppError, Result};
use crate::metrics::{PREDICTIONS_TOTAL, PREDICTION_DURATION_SECONDS};
use crate::ml::classifier::Classifier;
use crate::ml::features::FeatureVectorizer;
use crate::ml::risk;
use crate::ml::store::{ClassifierStore, ModelStatus};
use crate::ml::models::ModelMetadata;
use crate::models::{DiseaseKind, FeatureInput, RiskLevel};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of one assessment, before it is persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub disease: DiseaseKind,
    pub risk_level: RiskLevel,

    /// Largest class probability as a percentage, in [50, 100]
    pub confidence: f64,

    pub predicted_class: u8,
    pub probabilities: [f64; 2],
}

/// Vectorize, classify and bucket one input
pub fn assess_with(
    kind: DiseaseKind,
    classifier: &dyn Classifier,
    input: &FeatureInput,
) -> Result<RiskAssessment> {
    let features = FeatureVectorizer::for_disease(kind).vectorize(input)?;
    let output = classifier.predict(&features)?;
    let confidence = output.confidence();

    Ok(RiskAssessment {
        disease: kind,
        risk_level: risk::bucket(output.predicted_class, confidence),
        confidence,
        predicted_class: output.predicted_class,
        probabilities: output.probabilities,
    })
}

/// Per-disease prediction orchestrator.
///
/// Stateless apart from the shared classifier store. Persisting the
/// resulting `Prediction` is left to the caller.
#[derive(Clone)]
pub struct PredictionService {
    classifiers: Arc<ClassifierStore>,
}

impl PredictionService {
    pub fn new(classifiers: Arc<ClassifierStore>) -> Self {
        Self { classifiers }
    }

    pub fn classifiers(&self) -> &Arc<ClassifierStore> {
        &self.classifiers
    }

    /// Assess risk for one disease. Loading or training runs off the async runtime.
    pub async fn assess(&self, kind: DiseaseKind, input: FeatureInput) -> Result<RiskAssessment> {
        let started = Instant::now();
        let store = Arc::clone(&self.classifiers);

        let assessment = tokio::task::spawn_blocking(move || {
            let classifier = store.get_or_load(kind)?;
            assess_with(kind, classifier.as_ref(), &input)
        })
        .await
        .map_err(|e| AppError::Internal(format!("Prediction task failed: {}", e)))??;

        PREDICTION_DURATION_SECONDS
            .with_label_values(&[&kind.slug()])
            .observe(started.elapsed().as_secs_f64());
        PREDICTIONS_TOTAL
            .with_label_values(&[&kind.slug(), &assessment.risk_level.to_string()])
            .inc();

        debug!(
            disease = %kind,
            risk_level = %assessment.risk_level,
            confidence = assessment.confidence,
            "Risk assessed"
        );
        Ok(assessment)
    }

    /// Load or train every classifier; failures are logged and left for
    /// request time, where they surface as `ModelUnavailable`.
    pub async fn warm_up(&self) -> Vec<DiseaseKind> {
        let store = Arc::clone(&self.classifiers);
        let failures = match tokio::task::spawn_blocking(move || store.warm_up()).await {
            Ok(failures) => failures,
            Err(e) => {
                warn!(error = %e, "Classifier warm-up task failed");
                return DiseaseKind::all();
            }
        };

        for (kind, error) in &failures {
            warn!(disease = %kind, error = %error, "Classifier not ready after warm-up");
        }
        info!(
            ready = DiseaseKind::all().len() - failures.len(),
            failed = failures.len(),
            "🚀 Classifier warm-up finished"
        );
        failures.into_iter().map(|(kind, _)| kind).collect()
    }

    /// Retrain one disease from its CSV and swap it in
    pub async fn retrain(&self, kind: DiseaseKind) -> Result<ModelMetadata> {
        let store = Arc::clone(&self.classifiers);
        let classifier = tokio::task::spawn_blocking(move || store.retrain(kind))
            .await
            .map_err(|e| AppError::Internal(format!("Training task failed: {}", e)))??;
        Ok(classifier.metadata.clone())
    }

    pub fn status(&self) -> Vec<ModelStatus> {
        self.classifiers.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelsConfig;
    use crate::ml::models::ClassOutput;

    /// Returns fixed probabilities regardless of input
    struct FixedClassifier {
        p_positive: f64,
    }

    impl Classifier for FixedClassifier {
        fn predict(&self, features: &[f64]) -> Result<ClassOutput> {
            assert_eq!(features.len(), 6);
            Ok(ClassOutput::from_positive_probability(self.p_positive))
        }

        fn n_features(&self) -> usize {
            6
        }
    }

    fn heart_input() -> FeatureInput {
        [
            ("age", 63.0),
            ("sex", 1.0),
            ("chest_pain", 3.0),
            ("blood_pressure", 145.0),
            ("cholesterol", 233.0),
            ("max_heart_rate", 150.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    #[test]
    fn test_confident_positive_is_high_risk() {
        let classifier = FixedClassifier { p_positive: 0.9 };
        let result = assess_with(DiseaseKind::HeartDisease, &classifier, &heart_input()).unwrap();

        assert_eq!(result.predicted_class, 1);
        assert!((result.confidence - 90.0).abs() < 1e-9);
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_unsure_negative_is_escalated() {
        let classifier = FixedClassifier { p_positive: 0.4 };
        let result = assess_with(DiseaseKind::HeartDisease, &classifier, &heart_input()).unwrap();

        assert_eq!(result.predicted_class, 0);
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_confidence_always_at_least_half() {
        for tenth in 0..=10 {
            let classifier = FixedClassifier {
                p_positive: tenth as f64 / 10.0,
            };
            let result =
                assess_with(DiseaseKind::HeartDisease, &classifier, &heart_input()).unwrap();
            assert!((50.0..=100.0).contains(&result.confidence));
        }
    }

    #[test]
    fn test_missing_feature_propagates() {
        let classifier = FixedClassifier { p_positive: 0.9 };
        let mut input = heart_input();
        input.remove("sex");

        let result = assess_with(DiseaseKind::HeartDisease, &classifier, &input);
        assert!(matches!(result, Err(AppError::MissingFeature(f)) if f == "sex"));
    }

    #[tokio::test]
    async fn test_assess_without_training_data_is_unavailable() {
        let dir = tempfile::TempDir::new().unwrap();
        let service = PredictionService::new(Arc::new(ClassifierStore::new(ModelsConfig {
            model_dir: dir.path().join("models"),
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        })));

        let result = service.assess(DiseaseKind::HeartDisease, heart_input()).await;
        assert!(matches!(result, Err(AppError::ModelUnavailable(_))));
        assert_eq!(service.warm_up().await.len(), 5);
    }
}
