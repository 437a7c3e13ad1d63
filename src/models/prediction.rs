use crate::models::DiseaseKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};
use uuid::Uuid;

/// Named numeric inputs submitted for one assessment
pub type FeatureInput = BTreeMap<String, f64>;

/// User-facing risk bucket
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low Risk",
            RiskLevel::Medium => "Medium Risk",
            RiskLevel::High => "High Risk",
        }
    }
}

/// One persisted risk assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub disease_id: Uuid,
    pub disease: DiseaseKind,

    /// Validated form inputs, as submitted
    pub symptoms_data: FeatureInput,

    pub risk_level: RiskLevel,

    /// Percentage in [0, 100]
    pub confidence_score: f64,

    pub created_at: DateTime<Utc>,
}

impl Prediction {
    pub fn new(
        user_id: Uuid,
        disease_id: Uuid,
        disease: DiseaseKind,
        symptoms_data: FeatureInput,
        risk_level: RiskLevel,
        confidence_score: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            disease_id,
            disease,
            symptoms_data,
            risk_level,
            confidence_score,
            created_at: Utc::now(),
        }
    }
}

/// Filter for querying predictions
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionFilter {
    pub user_id: Option<Uuid>,
    pub disease: Option<DiseaseKind>,
    pub risk_level: Option<RiskLevel>,
}

impl PredictionFilter {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, prediction: &Prediction) -> bool {
        let user_match = self.user_id.map_or(true, |id| prediction.user_id == id);
        let disease_match = self.disease.map_or(true, |d| prediction.disease == d);
        let risk_match = self.risk_level.map_or(true, |r| prediction.risk_level == r);

        user_match && disease_match && risk_match
    }
}

/// Count of predictions per risk bucket
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskDistribution {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
}

impl RiskDistribution {
    pub fn record(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::Low => self.low += 1,
            RiskLevel::Medium => self.medium += 1,
            RiskLevel::High => self.high += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.low + self.medium + self.high
    }
}

impl<'a> FromIterator<&'a Prediction> for RiskDistribution {
    fn from_iter<I: IntoIterator<Item = &'a Prediction>>(iter: I) -> Self {
        let mut distribution = RiskDistribution::default();
        for prediction in iter {
            distribution.record(prediction.risk_level);
        }
        distribution
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(user_id: Uuid, disease: DiseaseKind, risk: RiskLevel) -> Prediction {
        Prediction::new(
            user_id,
            Uuid::new_v4(),
            disease,
            FeatureInput::new(),
            risk,
            75.0,
        )
    }

    #[test]
    fn test_risk_level_serialization() {
        assert_eq!(
            serde_json::to_string(&RiskLevel::Medium).unwrap(),
            "\"medium\""
        );
        assert_eq!(RiskLevel::High.to_string(), "high");
        assert_eq!("low".parse::<RiskLevel>().unwrap(), RiskLevel::Low);
        assert_eq!(RiskLevel::High.label(), "High Risk");
    }

    #[test]
    fn test_filter_matches() {
        let user = Uuid::new_v4();
        let p = prediction(user, DiseaseKind::Stroke, RiskLevel::High);

        assert!(PredictionFilter::default().matches(&p));
        assert!(PredictionFilter::for_user(user).matches(&p));
        assert!(!PredictionFilter::for_user(Uuid::new_v4()).matches(&p));

        let filter = PredictionFilter {
            disease: Some(DiseaseKind::Asthma),
            ..Default::default()
        };
        assert!(!filter.matches(&p));
    }

    #[test]
    fn test_risk_distribution_from_predictions() {
        let user = Uuid::new_v4();
        let predictions = vec![
            prediction(user, DiseaseKind::Diabetes, RiskLevel::Low),
            prediction(user, DiseaseKind::Diabetes, RiskLevel::High),
            prediction(user, DiseaseKind::Stroke, RiskLevel::High),
        ];

        let distribution: RiskDistribution = predictions.iter().collect();
        assert_eq!(distribution.low, 1);
        assert_eq!(distribution.medium, 0);
        assert_eq!(distribution.high, 2);
        assert_eq!(distribution.total(), 3);
    }
}
