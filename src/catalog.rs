//! Descriptive text for the supported diseases and startup seeding of the
//! disease records.

use crate::error::Result;
use crate::insights::disease_stats;
use crate::ml::ClassifierStore;
use crate::models::{Disease, DiseaseKind};
use crate::state::HealthStore;

/// Static description of one disease
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub kind: DiseaseKind,
    pub description: &'static str,
    /// Comma-separated
    pub symptoms: &'static str,
    /// Comma-separated
    pub prevention: &'static str,
}

impl CatalogEntry {
    pub fn to_disease(&self) -> Disease {
        Disease::new(
            self.kind,
            self.description.to_string(),
            self.symptoms.to_string(),
            self.prevention.to_string(),
            disease_stats::baseline(self.kind).global_cases,
        )
    }
}

static DIABETES: CatalogEntry = CatalogEntry {
    kind: DiseaseKind::Diabetes,
    description: "Diabetes is a group of metabolic disorders characterized by a high blood sugar \
        level over a prolonged period. It occurs when the pancreas does not produce enough insulin \
        or when the body cannot effectively use the insulin it produces. There are three main \
        types: Type 1, Type 2, and gestational diabetes.",
    symptoms: "Frequent urination, Excessive thirst, Unexplained weight loss, Extreme hunger, \
        Sudden vision changes, Tingling or numbness in hands or feet, Feeling very tired much of \
        the time, Very dry skin, Sores that are slow to heal, More infections than usual",
    prevention: "Maintain a healthy weight, Stay physically active, Eat a healthy diet, Limit \
        refined carbohydrates and sugar, Quit smoking, Watch portion sizes, Make healthy food \
        choices, Get regular health screenings",
};

static HEART_DISEASE: CatalogEntry = CatalogEntry {
    kind: DiseaseKind::HeartDisease,
    description: "Heart disease refers to several types of heart conditions. The most common type \
        is coronary artery disease, which affects blood flow to the heart. It is one of the \
        leading causes of death worldwide and includes conditions like heart attacks, heart \
        failure, and arrhythmias.",
    symptoms: "Chest pain or discomfort, Upper back or neck pain, Heartburn, Nausea or vomiting, \
        Extreme fatigue, Upper body discomfort, Dizziness, Shortness of breath, Irregular \
        heartbeat, Swelling in legs or feet",
    prevention: "Eat a healthy diet, Maintain a healthy weight, Get regular physical activity, \
        Don't smoke, Limit alcohol use, Get enough sleep, Manage stress, Get regular health \
        screenings, Control blood pressure and cholesterol",
};

static HYPERTENSION: CatalogEntry = CatalogEntry {
    kind: DiseaseKind::Hypertension,
    description: "Hypertension, also known as high blood pressure, is a long-term medical \
        condition in which the blood pressure in the arteries is persistently elevated. It is a \
        major risk factor for cardiovascular disease, stroke, and kidney disease. Often called \
        the \"silent killer\" because it usually has no symptoms.",
    symptoms: "Often no symptoms, Severe headaches, Chest pain, Dizziness, Difficulty breathing, \
        Nausea, Vomiting, Blurred vision, Anxiety, Confusion, Buzzing in ears, Nosebleeds, \
        Abnormal heart rhythm",
    prevention: "Maintain a healthy weight, Exercise regularly, Eat a healthy diet, Reduce sodium \
        intake, Limit alcohol consumption, Don't smoke, Get enough sleep, Manage stress, Monitor \
        blood pressure regularly, Take prescribed medications",
};

static ASTHMA: CatalogEntry = CatalogEntry {
    kind: DiseaseKind::Asthma,
    description: "Asthma is a chronic condition that affects the airways in the lungs, causing \
        them to become inflamed and narrow. This makes it difficult to breathe and can lead to \
        coughing, wheezing, chest tightness, and shortness of breath. Asthma can be triggered by \
        allergens, exercise, cold air, or stress, and it can range from mild to life-threatening.",
    symptoms: "Shortness of breath, Chest tightness or pain, Wheezing when exhaling, Trouble \
        sleeping caused by breathing issues, Coughing or wheezing attacks worsened by respiratory \
        viruses, Symptoms worsening with physical activity or at night",
    prevention: "Identify and avoid asthma triggers such as pollen and dust mites, Follow your \
        asthma action plan, Take medications as prescribed, Monitor breathing with a peak flow \
        meter, Get regular medical checkups, Stay up to date with flu and pneumonia vaccines, \
        Manage stress and anxiety, Maintain good indoor air quality, Exercise with caution under \
        medical advice",
};

static STROKE: CatalogEntry = CatalogEntry {
    kind: DiseaseKind::Stroke,
    description: "A stroke occurs when the blood supply to part of the brain is interrupted or \
        reduced, preventing brain tissue from getting oxygen and nutrients. Brain cells begin to \
        die within minutes, making it a medical emergency. Immediate treatment is crucial to \
        minimize brain damage and complications.",
    symptoms: "Sudden numbness or weakness in the face or arm or leg, Confusion or trouble \
        speaking, Sudden trouble seeing in one or both eyes, Sudden trouble walking, Dizziness or \
        loss of balance, Severe headache with no known cause",
    prevention: "Control high blood pressure, Manage diabetes, Avoid smoking and limit alcohol, \
        Eat a diet rich in fruits and vegetables and whole grains, Exercise regularly and \
        maintain a healthy weight, Take medications as prescribed, Monitor heart conditions such \
        as atrial fibrillation, Get regular health screenings",
};

pub fn entry(kind: DiseaseKind) -> &'static CatalogEntry {
    match kind {
        DiseaseKind::Diabetes => &DIABETES,
        DiseaseKind::HeartDisease => &HEART_DISEASE,
        DiseaseKind::Hypertension => &HYPERTENSION,
        DiseaseKind::Asthma => &ASTHMA,
        DiseaseKind::Stroke => &STROKE,
    }
}

/// Get-or-create one record per disease. Existing records keep their
/// (possibly staff-edited) text; only the artifact path is refreshed.
pub async fn seed_diseases(
    store: &dyn HealthStore,
    classifiers: &ClassifierStore,
) -> Result<Vec<Disease>> {
    let mut seeded = Vec::new();

    for kind in DiseaseKind::all() {
        let artifact = classifiers.artifact_path(kind);
        let model_path = artifact
            .exists()
            .then(|| artifact.display().to_string());

        let disease = match store.get_disease_by_kind(kind).await? {
            Some(mut existing) => {
                if model_path.is_some() && existing.model_path != model_path {
                    existing.model_path = model_path;
                    store.save_disease(&existing).await?;
                }
                existing
            }
            None => {
                let mut disease = entry(kind).to_disease();
                disease.model_path = model_path;
                store.save_disease(&disease).await?;
                tracing::info!(disease = %kind, "📚 Seeded disease record");
                disease
            }
        };

        seeded.push(disease);
    }

    Ok(seeded)
}
