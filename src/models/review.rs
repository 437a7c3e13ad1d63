use crate::models::DiseaseKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's opinion of one prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub disease_id: Uuid,
    pub disease: DiseaseKind,
    pub prediction_id: Uuid,

    /// 1 to 5 stars
    pub rating: u8,

    pub comment: String,

    /// Set by staff moderation
    pub flagged: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    pub fn new(
        user_id: Uuid,
        disease_id: Uuid,
        disease: DiseaseKind,
        prediction_id: Uuid,
        rating: u8,
        comment: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            disease_id,
            disease,
            prediction_id,
            rating,
            comment,
            flagged: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace rating and comment
    pub fn edit(&mut self, rating: u8, comment: String) {
        self.rating = rating;
        self.comment = comment;
        self.updated_at = Utc::now();
    }

    pub fn set_flagged(&mut self, flagged: bool) {
        self.flagged = flagged;
        self.updated_at = Utc::now();
    }
}

/// Filter for querying reviews
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewFilter {
    pub user_id: Option<Uuid>,
    pub disease: Option<DiseaseKind>,
    pub prediction_id: Option<Uuid>,
    pub flagged: Option<bool>,
}

impl ReviewFilter {
    pub fn for_disease(disease: DiseaseKind) -> Self {
        Self {
            disease: Some(disease),
            ..Default::default()
        }
    }

    pub fn matches(&self, review: &Review) -> bool {
        self.user_id.map_or(true, |id| review.user_id == id)
            && self.disease.map_or(true, |d| review.disease == d)
            && self.prediction_id.map_or(true, |id| review.prediction_id == id)
            && self.flagged.map_or(true, |f| review.flagged == f)
    }
}

/// Mean rating rounded to one decimal, 0 when there are no reviews
pub fn average_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let total: u32 = reviews.iter().map(|r| r.rating as u32).sum();
    let mean = total as f64 / reviews.len() as f64;
    (mean * 10.0).round() / 10.0
}
