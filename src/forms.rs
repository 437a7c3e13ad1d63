//! Per-disease prediction request bodies.
//!
//! Each form validates ranges and choice codes, then flattens into the named
//! [`FeatureInput`] the prediction pipeline consumes.

use crate::error::{AppError, Result};
use crate::ml::schema_for;
use crate::models::{DiseaseKind, FeatureInput};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use validator::Validate;

/// A validated form that can be flattened into model inputs
pub trait PredictionForm: DeserializeOwned + Validate {
    fn into_features(self) -> FeatureInput;
}

fn features<const N: usize>(pairs: [(&str, f64); N]) -> FeatureInput {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DiabetesForm {
    #[validate(range(min = 0.0, max = 300.0))]
    pub glucose: f64,
    #[validate(range(min = 0.0, max = 200.0))]
    pub blood_pressure: f64,
    #[validate(range(min = 10.0, max = 50.0))]
    pub bmi: f64,
    #[validate(range(min = 1, max = 120))]
    pub age: u32,
    #[validate(range(min = 0, max = 20))]
    pub pregnancies: u32,
    #[validate(range(min = 0.0, max = 1000.0))]
    pub insulin: f64,
}

impl PredictionForm for DiabetesForm {
    fn into_features(self) -> FeatureInput {
        features([
            ("glucose", self.glucose),
            ("blood_pressure", self.blood_pressure),
            ("bmi", self.bmi),
            ("age", self.age as f64),
            ("pregnancies", self.pregnancies as f64),
            ("insulin", self.insulin),
        ])
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct HeartDiseaseForm {
    #[validate(range(min = 1, max = 120))]
    pub age: u32,
    /// 1 male, 0 female
    #[validate(range(min = 0, max = 1))]
    pub sex: u8,
    /// 0 typical angina .. 3 asymptomatic
    #[validate(range(min = 0, max = 3))]
    pub chest_pain: u8,
    #[validate(range(min = 0.0, max = 300.0))]
    pub blood_pressure: f64,
    #[validate(range(min = 0.0, max = 600.0))]
    pub cholesterol: f64,
    #[validate(range(min = 50.0, max = 250.0))]
    pub max_heart_rate: f64,
}

impl PredictionForm for HeartDiseaseForm {
    fn into_features(self) -> FeatureInput {
        features([
            ("age", self.age as f64),
            ("sex", self.sex as f64),
            ("chest_pain", self.chest_pain as f64),
            ("blood_pressure", self.blood_pressure),
            ("cholesterol", self.cholesterol),
            ("max_heart_rate", self.max_heart_rate),
        ])
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct HypertensionForm {
    #[validate(range(min = 1, max = 120))]
    pub age: u32,
    #[validate(range(min = 10.0, max = 50.0))]
    pub bmi: f64,
    #[serde(alias = "currentSmoker")]
    #[validate(range(min = 0, max = 1))]
    pub current_smoker: u8,
    #[serde(alias = "sysBP")]
    #[validate(range(min = 10.0, max = 250.0))]
    pub sys_bp: f64,
    #[serde(alias = "diaBP")]
    #[validate(range(min = 10.0, max = 200.0))]
    pub dia_bp: f64,
    #[serde(alias = "heartRate")]
    #[validate(range(min = 10.0, max = 120.0))]
    pub heart_rate: f64,
}

impl PredictionForm for HypertensionForm {
    fn into_features(self) -> FeatureInput {
        features([
            ("age", self.age as f64),
            ("bmi", self.bmi),
            ("current_smoker", self.current_smoker as f64),
            ("sys_bp", self.sys_bp),
            ("dia_bp", self.dia_bp),
            ("heart_rate", self.heart_rate),
        ])
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AsthmaForm {
    #[validate(range(min = 1, max = 120))]
    pub age: u32,
    #[validate(range(min = 0, max = 1))]
    pub gender: u8,
    #[validate(range(min = 0, max = 1))]
    pub shortness_of_breath: u8,
    #[validate(range(min = 0, max = 1))]
    pub coughing: u8,
    #[validate(range(min = 0, max = 1))]
    pub chest_tightness: u8,
    #[validate(range(min = 0, max = 1))]
    pub wheezing: u8,
    #[validate(range(min = 0, max = 1))]
    pub allergy_history: u8,
}

impl PredictionForm for AsthmaForm {
    fn into_features(self) -> FeatureInput {
        features([
            ("age", self.age as f64),
            ("gender", self.gender as f64),
            ("shortness_of_breath", self.shortness_of_breath as f64),
            ("coughing", self.coughing as f64),
            ("chest_tightness", self.chest_tightness as f64),
            ("wheezing", self.wheezing as f64),
            ("allergy_history", self.allergy_history as f64),
        ])
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StrokeForm {
    #[validate(range(min = 1, max = 120))]
    pub age: u32,
    /// 0 female, 1 male, 2 other
    #[validate(range(min = 0, max = 2))]
    pub gender: u8,
    #[validate(range(min = 0, max = 1))]
    pub hypertension: u8,
    #[validate(range(min = 0, max = 1))]
    pub heart_disease: u8,
    #[validate(range(min = 50.0, max = 300.0))]
    pub avg_glucose_level: f64,
    #[validate(range(min = 10.0, max = 60.0))]
    pub bmi: f64,
    /// 0 never, 1 formerly, 2 currently, 3 unknown
    #[validate(range(min = 0, max = 3))]
    pub smoking_status: u8,
}

impl PredictionForm for StrokeForm {
    fn into_features(self) -> FeatureInput {
        features([
            ("age", self.age as f64),
            ("gender", self.gender as f64),
            ("hypertension", self.hypertension as f64),
            ("heart_disease", self.heart_disease as f64),
            ("avg_glucose_level", self.avg_glucose_level),
            ("bmi", self.bmi),
            ("smoking_status", self.smoking_status as f64),
        ])
    }
}

fn parse_as<F: PredictionForm>(body: serde_json::Value) -> Result<FeatureInput> {
    let form: F = serde_json::from_value(body)
        .map_err(|e| AppError::Validation(format!("Invalid form data: {}", e)))?;
    form.validate()?;
    Ok(form.into_features())
}

/// Validate a JSON form body for `kind` and return its named inputs
pub fn parse_form(kind: DiseaseKind, body: serde_json::Value) -> Result<FeatureInput> {
    let input = match kind {
        DiseaseKind::Diabetes => parse_as::<DiabetesForm>(body)?,
        DiseaseKind::HeartDisease => parse_as::<HeartDiseaseForm>(body)?,
        DiseaseKind::Hypertension => parse_as::<HypertensionForm>(body)?,
        DiseaseKind::Asthma => parse_as::<AsthmaForm>(body)?,
        DiseaseKind::Stroke => parse_as::<StrokeForm>(body)?,
    };
    check_domains(kind, &input)?;
    Ok(input)
}

/// Reject values outside the schema's accepted domains
pub fn check_domains(kind: DiseaseKind, input: &FeatureInput) -> Result<()> {
    for spec in schema_for(kind).features {
        match input.get(spec.name) {
            Some(value) if !spec.accepts(*value) => {
                return Err(AppError::Validation(format!(
                    "{}: value {} is out of range",
                    spec.name, value
                )));
            }
            Some(_) => {}
            None => return Err(AppError::MissingFeature(spec.name.to_string())),
        }
    }
    Ok(())
}
