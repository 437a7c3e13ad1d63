//! Admin dashboard aggregations

use crate::error::Result;
use crate::models::{
    average_rating, DiseaseKind, Prediction, PredictionFilter, Review, ReviewFilter,
    RiskDistribution,
};
use crate::state::HealthStore;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Days covered by the daily prediction series
pub const DAILY_WINDOW_DAYS: i64 = 7;

/// Entries in each recent-activity list
pub const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardTotals {
    pub users: u64,
    pub staff_users: u64,
    pub predictions: u64,
    pub reviews: u64,
    pub flagged_reviews: u64,
    pub chat_messages: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiseaseActivity {
    pub disease: DiseaseKind,
    pub predictions: u64,
    pub reviews: u64,
    pub average_rating: f64,
    pub risk_distribution: RiskDistribution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCount {
    pub day: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardData {
    pub totals: DashboardTotals,
    pub risk_distribution: RiskDistribution,
    pub per_disease: Vec<DiseaseActivity>,
    /// Oldest day first, zero-filled
    pub daily_predictions: Vec<DailyCount>,
    pub recent_predictions: Vec<Prediction>,
    pub recent_reviews: Vec<Review>,
    pub updated_at: DateTime<Utc>,
}

/// Builds dashboard snapshots from the store
pub struct DashboardProvider<'a> {
    store: &'a dyn HealthStore,
}

impl<'a> DashboardProvider<'a> {
    pub fn new(store: &'a dyn HealthStore) -> Self {
        Self { store }
    }

    pub async fn snapshot(&self) -> Result<DashboardData> {
        let users = self.store.list_users().await?;
        let predictions = self
            .store
            .list_predictions(&PredictionFilter::default(), 0, u32::MAX)
            .await?;
        let reviews = self
            .store
            .list_reviews(&ReviewFilter::default(), 0, u32::MAX)
            .await?;
        let chat_messages = self.store.count_chat_logs().await?;

        let totals = DashboardTotals {
            users: users.len() as u64,
            staff_users: users.iter().filter(|u| u.is_staff).count() as u64,
            predictions: predictions.len() as u64,
            reviews: reviews.len() as u64,
            flagged_reviews: reviews.iter().filter(|r| r.flagged).count() as u64,
            chat_messages,
        };

        let now = Utc::now();
        Ok(DashboardData {
            totals,
            risk_distribution: predictions.iter().collect(),
            per_disease: per_disease(&predictions, &reviews),
            daily_predictions: daily_counts(&predictions, now),
            recent_predictions: predictions.iter().take(RECENT_LIMIT).cloned().collect(),
            recent_reviews: reviews.iter().take(RECENT_LIMIT).cloned().collect(),
            updated_at: now,
        })
    }
}

fn per_disease(predictions: &[Prediction], reviews: &[Review]) -> Vec<DiseaseActivity> {
    DiseaseKind::all()
        .into_iter()
        .map(|kind| {
            let disease_predictions: Vec<&Prediction> =
                predictions.iter().filter(|p| p.disease == kind).collect();
            let disease_reviews: Vec<Review> = reviews
                .iter()
                .filter(|r| r.disease == kind)
                .cloned()
                .collect();

            DiseaseActivity {
                disease: kind,
                predictions: disease_predictions.len() as u64,
                reviews: disease_reviews.len() as u64,
                average_rating: average_rating(&disease_reviews),
                risk_distribution: disease_predictions.into_iter().collect(),
            }
        })
        .collect()
}

/// Predictions per UTC day over the window ending today
pub fn daily_counts(predictions: &[Prediction], now: DateTime<Utc>) -> Vec<DailyCount> {
    let today = now.date_naive();
    let first = today - Duration::days(DAILY_WINDOW_DAYS - 1);

    let mut buckets: BTreeMap<NaiveDate, u64> = (0..DAILY_WINDOW_DAYS)
        .map(|offset| (first + Duration::days(offset), 0))
        .collect();

    for prediction in predictions {
        let day = prediction.created_at.date_naive();
        if let Some(count) = buckets.get_mut(&day) {
            *count += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(day, count)| DailyCount { day, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeatureInput, RiskLevel, UserProfile};
    use crate::state::create_in_memory_store;
    use uuid::Uuid;

    fn prediction(disease: DiseaseKind, risk: RiskLevel, age_days: i64) -> Prediction {
        let mut p = Prediction::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            disease,
            FeatureInput::new(),
            risk,
            80.0,
        );
        p.created_at = Utc::now() - Duration::days(age_days);
        p
    }

    #[test]
    fn test_daily_counts_window() {
        let now = Utc::now();
        let predictions = vec![
            prediction(DiseaseKind::Asthma, RiskLevel::Low, 0),
            prediction(DiseaseKind::Asthma, RiskLevel::Low, 0),
            prediction(DiseaseKind::Stroke, RiskLevel::High, 3),
            prediction(DiseaseKind::Stroke, RiskLevel::High, 30),
        ];

        let days = daily_counts(&predictions, now);
        assert_eq!(days.len(), 7);
        assert_eq!(days[6].day, now.date_naive());
        assert_eq!(days.iter().map(|d| d.count).sum::<u64>(), 3);
        assert!(days.windows(2).all(|w| w[0].day < w[1].day));
    }

    #[tokio::test]
    async fn test_snapshot() {
        let store = create_in_memory_store();

        let mut admin = UserProfile::new(
            "admin".to_string(),
            "admin@example.com".to_string(),
            "hash".to_string(),
            "salt".to_string(),
        );
        admin.is_staff = true;
        store.create_user(&admin).await.unwrap();

        let high = prediction(DiseaseKind::Diabetes, RiskLevel::High, 0);
        let low = prediction(DiseaseKind::Diabetes, RiskLevel::Low, 1);
        store.save_prediction(&high).await.unwrap();
        store.save_prediction(&low).await.unwrap();

        let mut review = Review::new(
            admin.id,
            high.disease_id,
            DiseaseKind::Diabetes,
            high.id,
            4,
            "Clear and quick".to_string(),
        );
        review.flagged = true;
        store.create_review(&review).await.unwrap();

        let data = DashboardProvider::new(store.as_ref()).snapshot().await.unwrap();

        assert_eq!(data.totals.users, 1);
        assert_eq!(data.totals.staff_users, 1);
        assert_eq!(data.totals.predictions, 2);
        assert_eq!(data.totals.flagged_reviews, 1);
        assert_eq!(data.risk_distribution.high, 1);
        assert_eq!(data.risk_distribution.low, 1);

        let diabetes = data
            .per_disease
            .iter()
            .find(|d| d.disease == DiseaseKind::Diabetes)
            .unwrap();
        assert_eq!(diabetes.predictions, 2);
        assert_eq!(diabetes.average_rating, 4.0);
        assert_eq!(data.recent_predictions[0].id, high.id);
    }
}
