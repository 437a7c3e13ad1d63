use crate::models::DiseaseKind;

/// Accepted values for one input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureDomain {
    /// Inclusive numeric range
    Range { min: f64, max: f64 },
    /// Discrete codes with their labels
    Choice(&'static [(u8, &'static str)]),
}

/// One model input: form field name, training column, accepted values
#[derive(Debug, Clone, Copy)]
pub struct FeatureSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub column: &'static str,
    pub domain: FeatureDomain,
}

impl FeatureSpec {
    pub fn accepts(&self, value: f64) -> bool {
        match self.domain {
            FeatureDomain::Range { min, max } => value >= min && value <= max,
            FeatureDomain::Choice(choices) => choices
                .iter()
                .any(|(code, _)| (*code as f64 - value).abs() < f64::EPSILON),
        }
    }
}

/// Text values found in a training column and the code each maps to
#[derive(Debug, Clone, Copy)]
pub struct ColumnMapping {
    pub column: &'static str,
    pub values: &'static [(&'static str, f64)],
}

/// Everything the pipeline needs to know about one disease's classifier
#[derive(Debug, Clone, Copy)]
pub struct DiseaseSchema {
    pub kind: DiseaseKind,

    /// Inputs in training column order
    pub features: &'static [FeatureSpec],

    pub target_column: &'static str,
    pub csv_file: &'static str,
    pub artifact_file: &'static str,
    pub mappings: &'static [ColumnMapping],
}

impl DiseaseSchema {
    pub fn feature_names(&self) -> Vec<&'static str> {
        self.features.iter().map(|f| f.name).collect()
    }

    pub fn columns(&self) -> Vec<&'static str> {
        self.features.iter().map(|f| f.column).collect()
    }

    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    pub fn mapping_for(&self, column: &str) -> Option<&'static ColumnMapping> {
        self.mappings.iter().find(|m| m.column == column)
    }
}

const fn range(min: f64, max: f64) -> FeatureDomain {
    FeatureDomain::Range { min, max }
}

const YES_NO: &[(u8, &str)] = &[(0, "No"), (1, "Yes")];
const FEMALE_MALE: &[(u8, &str)] = &[(0, "Female"), (1, "Male")];

const DIABETES_FEATURES: &[FeatureSpec] = &[
    FeatureSpec { name: "glucose", label: "Glucose Level (mg/dL)", column: "Glucose", domain: range(0.0, 300.0) },
    FeatureSpec { name: "blood_pressure", label: "Blood Pressure (mmHg)", column: "BloodPressure", domain: range(0.0, 200.0) },
    FeatureSpec { name: "bmi", label: "BMI (Body Mass Index)", column: "BMI", domain: range(10.0, 50.0) },
    FeatureSpec { name: "age", label: "Age", column: "Age", domain: range(1.0, 120.0) },
    FeatureSpec { name: "pregnancies", label: "Number of Pregnancies", column: "Pregnancies", domain: range(0.0, 20.0) },
    FeatureSpec { name: "insulin", label: "Insulin Level", column: "Insulin", domain: range(0.0, 1000.0) },
];

const HEART_FEATURES: &[FeatureSpec] = &[
    FeatureSpec { name: "age", label: "Age", column: "age", domain: range(1.0, 120.0) },
    FeatureSpec { name: "sex", label: "Sex", column: "sex", domain: FeatureDomain::Choice(&[(1, "Male"), (0, "Female")]) },
    FeatureSpec {
        name: "chest_pain",
        label: "Chest Pain Type",
        column: "cp",
        domain: FeatureDomain::Choice(&[
            (0, "Typical Angina"),
            (1, "Atypical Angina"),
            (2, "Non-anginal Pain"),
            (3, "Asymptomatic"),
        ]),
    },
    FeatureSpec { name: "blood_pressure", label: "Resting Blood Pressure", column: "trestbps", domain: range(0.0, 300.0) },
    FeatureSpec { name: "cholesterol", label: "Cholesterol Level", column: "chol", domain: range(0.0, 600.0) },
    FeatureSpec { name: "max_heart_rate", label: "Maximum Heart Rate", column: "thalach", domain: range(50.0, 250.0) },
];

const HYPERTENSION_FEATURES: &[FeatureSpec] = &[
    FeatureSpec { name: "age", label: "Age", column: "age", domain: range(1.0, 120.0) },
    FeatureSpec { name: "bmi", label: "BMI", column: "BMI", domain: range(10.0, 50.0) },
    FeatureSpec { name: "current_smoker", label: "Smoking Status", column: "currentSmoker", domain: FeatureDomain::Choice(YES_NO) },
    FeatureSpec { name: "sys_bp", label: "Systolic Blood Pressure", column: "sysBP", domain: range(10.0, 250.0) },
    FeatureSpec { name: "dia_bp", label: "Diastolic Blood Pressure", column: "diaBP", domain: range(10.0, 200.0) },
    FeatureSpec { name: "heart_rate", label: "Heart Rate", column: "heartRate", domain: range(10.0, 120.0) },
];

const ASTHMA_FEATURES: &[FeatureSpec] = &[
    FeatureSpec { name: "age", label: "Age", column: "Age", domain: range(1.0, 120.0) },
    FeatureSpec { name: "gender", label: "Gender", column: "Gender", domain: FeatureDomain::Choice(FEMALE_MALE) },
    FeatureSpec { name: "shortness_of_breath", label: "Shortness of Breath", column: "ShortnessOfBreath", domain: FeatureDomain::Choice(YES_NO) },
    FeatureSpec { name: "coughing", label: "Frequent Coughing", column: "Coughing", domain: FeatureDomain::Choice(YES_NO) },
    FeatureSpec { name: "chest_tightness", label: "Chest Tightness", column: "ChestTightness", domain: FeatureDomain::Choice(YES_NO) },
    FeatureSpec { name: "wheezing", label: "Wheezing", column: "Wheezing", domain: FeatureDomain::Choice(YES_NO) },
    FeatureSpec { name: "allergy_history", label: "History of Allergies", column: "FamilyHistoryAsthma", domain: FeatureDomain::Choice(YES_NO) },
];

const STROKE_FEATURES: &[FeatureSpec] = &[
    FeatureSpec { name: "age", label: "Age", column: "age", domain: range(1.0, 120.0) },
    FeatureSpec {
        name: "gender",
        label: "Gender",
        column: "gender",
        domain: FeatureDomain::Choice(&[(0, "Female"), (1, "Male"), (2, "Other")]),
    },
    FeatureSpec { name: "hypertension", label: "Hypertension (High BP)", column: "hypertension", domain: FeatureDomain::Choice(YES_NO) },
    FeatureSpec { name: "heart_disease", label: "Heart Disease", column: "heart_disease", domain: FeatureDomain::Choice(YES_NO) },
    FeatureSpec { name: "avg_glucose_level", label: "Average Glucose Level (mg/dL)", column: "avg_glucose_level", domain: range(50.0, 300.0) },
    FeatureSpec { name: "bmi", label: "BMI (Body Mass Index)", column: "bmi", domain: range(10.0, 60.0) },
    FeatureSpec {
        name: "smoking_status",
        label: "Smoking Status",
        column: "smoking_status",
        domain: FeatureDomain::Choice(&[
            (0, "Never Smoked"),
            (1, "Formerly Smoked"),
            (2, "Currently Smokes"),
            (3, "Unknown"),
        ]),
    },
];

const STROKE_MAPPINGS: &[ColumnMapping] = &[
    ColumnMapping {
        column: "gender",
        values: &[("Female", 0.0), ("Male", 1.0), ("Other", 2.0)],
    },
    ColumnMapping {
        column: "smoking_status",
        values: &[
            ("never smoked", 0.0),
            ("formerly smoked", 1.0),
            ("smokes", 2.0),
            ("Unknown", 3.0),
        ],
    },
];

static DIABETES: DiseaseSchema = DiseaseSchema {
    kind: DiseaseKind::Diabetes,
    features: DIABETES_FEATURES,
    target_column: "Outcome",
    csv_file: "diabetes.csv",
    artifact_file: "diabetes_model.bin",
    mappings: &[],
};

static HEART_DISEASE: DiseaseSchema = DiseaseSchema {
    kind: DiseaseKind::HeartDisease,
    features: HEART_FEATURES,
    target_column: "target",
    csv_file: "heart.csv",
    artifact_file: "heart_disease_model.bin",
    mappings: &[],
};

static HYPERTENSION: DiseaseSchema = DiseaseSchema {
    kind: DiseaseKind::Hypertension,
    features: HYPERTENSION_FEATURES,
    target_column: "Risk",
    csv_file: "hypertension.csv",
    artifact_file: "hypertension_model.bin",
    mappings: &[],
};

static ASTHMA: DiseaseSchema = DiseaseSchema {
    kind: DiseaseKind::Asthma,
    features: ASTHMA_FEATURES,
    target_column: "Diagnosis",
    csv_file: "asthma.csv",
    artifact_file: "asthma_model.bin",
    mappings: &[],
};

static STROKE: DiseaseSchema = DiseaseSchema {
    kind: DiseaseKind::Stroke,
    features: STROKE_FEATURES,
    target_column: "stroke",
    csv_file: "stroke-data.csv",
    artifact_file: "stroke_model.bin",
    mappings: STROKE_MAPPINGS,
};

/// Schema for a disease
pub fn schema_for(kind: DiseaseKind) -> &'static DiseaseSchema {
    match kind {
        DiseaseKind::Diabetes => &DIABETES,
        DiseaseKind::HeartDisease => &HEART_DISEASE,
        DiseaseKind::Hypertension => &HYPERTENSION,
        DiseaseKind::Asthma => &ASTHMA,
        DiseaseKind::Stroke => &STROKE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_disease_has_six_or_seven_features() {
        for kind in DiseaseKind::all() {
            let schema = schema_for(kind);
            assert_eq!(schema.kind, kind);
            assert!((6..=7).contains(&schema.n_features()), "{kind}");
        }
    }

    #[test]
    fn test_heart_disease_column_order() {
        let schema = schema_for(DiseaseKind::HeartDisease);
        assert_eq!(
            schema.columns(),
            vec!["age", "sex", "cp", "trestbps", "chol", "thalach"]
        );
        assert_eq!(
            schema.feature_names(),
            vec!["age", "sex", "chest_pain", "blood_pressure", "cholesterol", "max_heart_rate"]
        );
    }

    #[test]
    fn test_accepts_range_and_choice() {
        let schema = schema_for(DiseaseKind::HeartDisease);
        let age = &schema.features[0];
        let chest_pain = &schema.features[2];

        assert!(age.accepts(1.0));
        assert!(age.accepts(120.0));
        assert!(!age.accepts(0.0));
        assert!(chest_pain.accepts(3.0));
        assert!(!chest_pain.accepts(4.0));
        assert!(!chest_pain.accepts(1.5));
    }

    #[test]
    fn test_stroke_text_mappings() {
        let schema = schema_for(DiseaseKind::Stroke);
        let smoking = schema.mapping_for("smoking_status").unwrap();
        assert!(smoking.values.contains(&("formerly smoked", 1.0)));
        assert!(schema.mapping_for("bmi").is_none());
    }
}
