use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use uuid::Uuid;
use validator::Validate;

/// Diseases with a bundled risk classifier
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DiseaseKind {
    Diabetes,
    HeartDisease,
    Hypertension,
    Asthma,
    Stroke,
}

impl DiseaseKind {
    /// URL slug, e.g. `heart_disease`
    pub fn slug(&self) -> String {
        self.to_string()
    }

    /// Human-readable name, e.g. `Heart Disease`
    pub fn display_name(&self) -> &'static str {
        match self {
            DiseaseKind::Diabetes => "Diabetes",
            DiseaseKind::HeartDisease => "Heart Disease",
            DiseaseKind::Hypertension => "Hypertension",
            DiseaseKind::Asthma => "Asthma",
            DiseaseKind::Stroke => "Stroke",
        }
    }

    /// Parse a slug or display name, tolerating case, spaces and dashes
    pub fn from_slug(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase().replace([' ', '-'], "_");
        DiseaseKind::from_str(&normalized).ok()
    }

    pub fn all() -> Vec<DiseaseKind> {
        DiseaseKind::iter().collect()
    }
}

/// Descriptive disease record
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Disease {
    pub id: Uuid,

    /// Classifier this record is bound to
    pub kind: DiseaseKind,

    #[validate(length(min = 1, max = 100))]
    pub name: String,

    pub description: String,

    /// Comma-separated symptom list
    pub symptoms: String,

    /// Comma-separated prevention tips
    pub prevention: String,

    pub global_cases: u64,

    /// Serialized classifier artifact, once one has been written
    pub model_path: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Disease {
    pub fn new(
        kind: DiseaseKind,
        description: String,
        symptoms: String,
        prevention: String,
        global_cases: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name: kind.display_name().to_string(),
            description,
            symptoms,
            prevention,
            global_cases,
            model_path: None,
            created_at: Utc::now(),
        }
    }

    pub fn symptom_list(&self) -> Vec<String> {
        split_list(&self.symptoms)
    }

    pub fn prevention_list(&self) -> Vec<String> {
        split_list(&self.prevention)
    }
}

fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
