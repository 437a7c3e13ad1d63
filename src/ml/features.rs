use crate::error::{AppError, Result};
use crate::ml::schema::{schema_for, DiseaseSchema};
use crate::models::{DiseaseKind, FeatureInput};

/// Turns a named input mapping into the column order the classifier was trained on.
///
/// Range and type checks happen in the form layer; this only looks keys up.
#[derive(Debug, Clone, Copy)]
pub struct FeatureVectorizer {
    schema: &'static DiseaseSchema,
}

impl FeatureVectorizer {
    pub fn new(schema: &'static DiseaseSchema) -> Self {
        Self { schema }
    }

    pub fn for_disease(kind: DiseaseKind) -> Self {
        Self::new(schema_for(kind))
    }

    pub fn feature_names(&self) -> Vec<&'static str> {
        self.schema.feature_names()
    }

    pub fn n_features(&self) -> usize {
        self.schema.n_features()
    }

    /// Ordered feature vector, or the first missing key
    pub fn vectorize(&self, input: &FeatureInput) -> Result<Vec<f64>> {
        self.schema
            .features
            .iter()
            .map(|spec| {
                input
                    .get(spec.name)
                    .copied()
                    .ok_or_else(|| AppError::MissingFeature(spec.name.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heart_input() -> FeatureInput {
        [
            ("max_heart_rate", 150.0),
            ("cholesterol", 250.0),
            ("age", 55.0),
            ("chest_pain", 2.0),
            ("sex", 1.0),
            ("blood_pressure", 140.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    #[test]
    fn test_vectorize_follows_training_order() {
        let vectorizer = FeatureVectorizer::for_disease(DiseaseKind::HeartDisease);
        let vector = vectorizer.vectorize(&heart_input()).unwrap();

        assert_eq!(vector, vec![55.0, 1.0, 2.0, 140.0, 250.0, 150.0]);
    }

    #[test]
    fn test_vectorize_ignores_extra_keys() {
        let vectorizer = FeatureVectorizer::for_disease(DiseaseKind::HeartDisease);
        let mut input = heart_input();
        input.insert("glucose".to_string(), 99.0);

        assert_eq!(vectorizer.vectorize(&input).unwrap().len(), 6);
    }

    #[test]
    fn test_vectorize_fails_on_missing_key() {
        let vectorizer = FeatureVectorizer::for_disease(DiseaseKind::HeartDisease);
        let mut input = heart_input();
        input.remove("cholesterol");

        match vectorizer.vectorize(&input) {
            Err(AppError::MissingFeature(name)) => assert_eq!(name, "cholesterol"),
            other => panic!("expected MissingFeature, got {:?}", other),
        }
    }

    #[test]
    fn test_vectorize_does_not_range_check() {
        let vectorizer = FeatureVectorizer::for_disease(DiseaseKind::HeartDisease);
        let mut input = heart_input();
        input.insert("age".to_string(), -5.0);

        assert_eq!(vectorizer.vectorize(&input).unwrap()[0], -5.0);
    }
}
