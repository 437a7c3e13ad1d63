use crate::config::ModelsConfig;
use crate::error::{AppError, Result};
use crate::metrics::{MODEL_LOADS_TOTAL, MODEL_TRAINING_DURATION_SECONDS};
use crate::ml::classifier::{Classifier, ForestParams, RandomForestClassifier};
use crate::ml::dataset;
use crate::ml::models::{ClassOutput, ModelMetadata, ModelType};
use crate::ml::schema::{schema_for, DiseaseSchema};
use crate::models::DiseaseKind;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Bumped whenever the artifact layout changes; older files are retrained
const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Where a loaded classifier came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSource {
    Artifact,
    Trained,
}

impl ModelSource {
    fn as_str(&self) -> &'static str {
        match self {
            ModelSource::Artifact => "artifact",
            ModelSource::Trained => "trained",
        }
    }
}

/// A classifier ready to serve, shared read-only across requests
pub struct TrainedClassifier {
    pub kind: DiseaseKind,
    pub metadata: ModelMetadata,
    pub source: ModelSource,
    pub artifact_path: PathBuf,
    forest: RandomForestClassifier,
}

impl Classifier for TrainedClassifier {
    fn predict(&self, features: &[f64]) -> Result<ClassOutput> {
        self.forest.predict(features)
    }

    fn n_features(&self) -> usize {
        self.forest.n_features()
    }
}

#[derive(Serialize, Deserialize)]
struct ClassifierArtifact {
    format_version: u32,
    metadata: ModelMetadata,
    forest: RandomForestClassifier,
}

/// Per-disease view for the admin model listing
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub disease: DiseaseKind,
    pub loaded: bool,
    pub source: Option<ModelSource>,
    pub artifact_path: String,
    pub artifact_exists: bool,
    pub metadata: Option<ModelMetadata>,
}

/// Owns the per-disease classifiers for the life of the process.
///
/// A classifier is loaded from its artifact on first use, or trained from the
/// bundled CSV and written back when the artifact is missing or unreadable.
/// First-time initialization is serialized per disease so concurrent callers
/// never train the same model twice. Loaded handles are immutable; `retrain`
/// swaps in a new handle while in-flight predictions finish on the old one.
pub struct ClassifierStore {
    config: ModelsConfig,
    loaded: DashMap<DiseaseKind, Arc<TrainedClassifier>>,
    init_locks: HashMap<DiseaseKind, Mutex<()>>,
}

impl ClassifierStore {
    pub fn new(config: ModelsConfig) -> Self {
        let init_locks = DiseaseKind::all()
            .into_iter()
            .map(|kind| (kind, Mutex::new(())))
            .collect();

        Self {
            config,
            loaded: DashMap::new(),
            init_locks,
        }
    }

    pub fn config(&self) -> &ModelsConfig {
        &self.config
    }

    pub fn artifact_path(&self, kind: DiseaseKind) -> PathBuf {
        self.config.model_dir.join(schema_for(kind).artifact_file)
    }

    pub fn training_path(&self, kind: DiseaseKind) -> PathBuf {
        self.config.data_dir.join(schema_for(kind).csv_file)
    }

    fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_trees: self.config.n_trees.max(1) as usize,
            seed: self.config.seed,
            max_depth: None,
        }
    }

    /// Already-initialized classifier, without touching disk
    pub fn get(&self, kind: DiseaseKind) -> Option<Arc<TrainedClassifier>> {
        self.loaded.get(&kind).map(|entry| Arc::clone(entry.value()))
    }

    /// Classifier for a disease, initializing it on first use. Blocking.
    pub fn get_or_load(&self, kind: DiseaseKind) -> Result<Arc<TrainedClassifier>> {
        if let Some(classifier) = self.get(kind) {
            return Ok(classifier);
        }

        let _guard = self.lock_for(kind)?;
        if let Some(classifier) = self.get(kind) {
            return Ok(classifier);
        }

        let classifier = Arc::new(self.load_or_train(kind).map_err(|e| {
            MODEL_LOADS_TOTAL
                .with_label_values(&[&kind.slug(), "failed"])
                .inc();
            error!(disease = %kind, error = %e, "❌ No classifier available");
            AppError::ModelUnavailable(format!("{}: {}", kind.display_name(), e))
        })?);
        self.loaded.insert(kind, Arc::clone(&classifier));
        Ok(classifier)
    }

    /// Train from CSV, overwrite the artifact and swap the handle. Blocking.
    pub fn retrain(&self, kind: DiseaseKind) -> Result<Arc<TrainedClassifier>> {
        let _guard = self.lock_for(kind)?;
        let classifier = Arc::new(self.train_and_persist(kind)?);
        self.loaded.insert(kind, Arc::clone(&classifier));
        info!(disease = %kind, "🔄 Classifier replaced");
        Ok(classifier)
    }

    /// Initialize every disease, returning the ones that failed. Blocking.
    pub fn warm_up(&self) -> Vec<(DiseaseKind, AppError)> {
        DiseaseKind::all()
            .into_iter()
            .filter_map(|kind| self.get_or_load(kind).err().map(|e| (kind, e)))
            .collect()
    }

    pub fn status(&self) -> Vec<ModelStatus> {
        DiseaseKind::all()
            .into_iter()
            .map(|kind| {
                let path = self.artifact_path(kind);
                let loaded = self.get(kind);
                ModelStatus {
                    disease: kind,
                    loaded: loaded.is_some(),
                    source: loaded.as_ref().map(|c| c.source),
                    artifact_exists: path.exists(),
                    artifact_path: path.display().to_string(),
                    metadata: loaded.map(|c| c.metadata.clone()),
                }
            })
            .collect()
    }

    fn lock_for(&self, kind: DiseaseKind) -> Result<parking_lot::MutexGuard<'_, ()>> {
        self.init_locks
            .get(&kind)
            .map(|lock| lock.lock())
            .ok_or_else(|| AppError::Internal(format!("No init lock for {}", kind)))
    }

    fn load_or_train(&self, kind: DiseaseKind) -> Result<TrainedClassifier> {
        let path = self.artifact_path(kind);
        if path.exists() {
            match read_artifact(schema_for(kind), &path) {
                Ok(artifact) => {
                    info!(
                        disease = %kind,
                        path = %path.display(),
                        trees = artifact.forest.n_trees(),
                        "📦 Loaded classifier artifact"
                    );
                    MODEL_LOADS_TOTAL
                        .with_label_values(&[&kind.slug(), ModelSource::Artifact.as_str()])
                        .inc();
                    return Ok(TrainedClassifier {
                        kind,
                        metadata: artifact.metadata,
                        source: ModelSource::Artifact,
                        artifact_path: path,
                        forest: artifact.forest,
                    });
                }
                Err(e) => {
                    warn!(
                        disease = %kind,
                        path = %path.display(),
                        error = %e,
                        "Unreadable classifier artifact, retraining"
                    );
                }
            }
        }

        self.train_and_persist(kind)
    }

    fn train_and_persist(&self, kind: DiseaseKind) -> Result<TrainedClassifier> {
        let schema = schema_for(kind);
        let started = Instant::now();
        let params = self.forest_params();

        info!(disease = %kind, n_trees = params.n_trees, "🧠 Training classifier");

        let data = dataset::load_csv(schema, &self.training_path(kind))?;
        let (train, test) = data.train_test_split(self.config.test_size, self.config.seed);
        let forest = RandomForestClassifier::fit(&train, params)?;
        let validation_metrics = forest.evaluate(&test)?;

        let metadata = ModelMetadata {
            disease: kind,
            name: format!("{} risk classifier", kind.display_name()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            model_type: ModelType::RandomForest,
            trained_at: chrono::Utc::now(),
            n_training_samples: train.n_samples,
            n_test_samples: test.n_samples,
            n_features: train.n_features,
            feature_names: schema.feature_names().iter().map(|s| s.to_string()).collect(),
            validation_metrics,
            hyperparameters: params.as_map(),
        };

        let elapsed = started.elapsed();
        MODEL_TRAINING_DURATION_SECONDS
            .with_label_values(&[&kind.slug()])
            .observe(elapsed.as_secs_f64());
        MODEL_LOADS_TOTAL
            .with_label_values(&[&kind.slug(), ModelSource::Trained.as_str()])
            .inc();

        info!(
            disease = %kind,
            accuracy = %format!("{:.2}%", metadata.validation_metrics.accuracy * 100.0),
            train = metadata.n_training_samples,
            test = metadata.n_test_samples,
            elapsed_ms = elapsed.as_millis() as u64,
            "✅ Classifier trained"
        );

        let artifact = ClassifierArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            metadata,
            forest,
        };

        let path = self.artifact_path(kind);
        if let Err(e) = write_artifact(&artifact, &path) {
            warn!(
                disease = %kind,
                path = %path.display(),
                error = %e,
                "Could not persist classifier artifact, serving from memory"
            );
        }

        Ok(TrainedClassifier {
            kind,
            metadata: artifact.metadata,
            source: ModelSource::Trained,
            artifact_path: path,
            forest: artifact.forest,
        })
    }
}

fn read_artifact(schema: &DiseaseSchema, path: &Path) -> Result<ClassifierArtifact> {
    let bytes = std::fs::read(path)?;
    let artifact: ClassifierArtifact = bincode::deserialize(&bytes)?;

    if artifact.format_version != ARTIFACT_FORMAT_VERSION {
        return Err(AppError::Serialization(format!(
            "artifact format {} is not {}",
            artifact.format_version, ARTIFACT_FORMAT_VERSION
        )));
    }
    if artifact.metadata.disease != schema.kind {
        return Err(AppError::Serialization(format!(
            "artifact was trained for {}",
            artifact.metadata.disease
        )));
    }
    if artifact.forest.n_features() != schema.n_features() {
        return Err(AppError::Serialization(format!(
            "artifact expects {} features, schema has {}",
            artifact.forest.n_features(),
            schema.n_features()
        )));
    }
    Ok(artifact)
}

/// Write to a sibling temp file and rename, so readers never see a partial artifact
fn write_artifact(artifact: &ClassifierArtifact, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let bytes = bincode::serialize(artifact)?;
    let tmp = path.with_extension("bin.tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    /// Writes a heart-disease table where high cholesterol means disease
    fn write_heart_csv(dir: &Path) {
        let mut file = std::fs::File::create(dir.join("heart.csv")).unwrap();
        writeln!(file, "age,sex,cp,trestbps,chol,thalach,target").unwrap();
        for i in 0..120 {
            let chol = 150 + (i * 3) % 300;
            let target = (chol > 300) as i32;
            writeln!(
                file,
                "{},{},{},{},{},{},{}",
                30 + i % 40,
                i % 2,
                i % 4,
                110 + i % 50,
                chol,
                120 + i % 60,
                target
            )
            .unwrap();
        }
    }

    fn store(dir: &TempDir) -> ClassifierStore {
        ClassifierStore::new(ModelsConfig {
            model_dir: dir.path().join("models"),
            data_dir: dir.path().to_path_buf(),
            n_trees: 10,
            seed: 42,
            test_size: 0.2,
            warm_up: false,
        })
    }

    #[test]
    fn test_trains_then_loads_artifact() {
        let dir = TempDir::new().unwrap();
        write_heart_csv(dir.path());

        let first = store(&dir);
        let trained = first.get_or_load(DiseaseKind::HeartDisease).unwrap();
        assert_eq!(trained.source, ModelSource::Trained);
        assert_eq!(trained.metadata.n_training_samples, 96);
        assert_eq!(trained.metadata.n_test_samples, 24);
        assert!(first.artifact_path(DiseaseKind::HeartDisease).exists());

        let second = store(&dir);
        let loaded = second.get_or_load(DiseaseKind::HeartDisease).unwrap();
        assert_eq!(loaded.source, ModelSource::Artifact);

        let probe = [50.0, 1.0, 2.0, 130.0, 420.0, 150.0];
        assert_eq!(
            trained.predict(&probe).unwrap(),
            loaded.predict(&probe).unwrap()
        );
    }

    #[test]
    fn test_get_or_load_caches_handle() {
        let dir = TempDir::new().unwrap();
        write_heart_csv(dir.path());
        let store = store(&dir);

        let a = store.get_or_load(DiseaseKind::HeartDisease).unwrap();
        let b = store.get_or_load(DiseaseKind::HeartDisease).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_corrupt_artifact_is_retrained() {
        let dir = TempDir::new().unwrap();
        write_heart_csv(dir.path());
        let store = store(&dir);

        let path = store.artifact_path(DiseaseKind::HeartDisease);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"not a model").unwrap();

        let classifier = store.get_or_load(DiseaseKind::HeartDisease).unwrap();
        assert_eq!(classifier.source, ModelSource::Trained);
        assert!(read_artifact(schema_for(DiseaseKind::HeartDisease), &path).is_ok());
    }

    #[test]
    fn test_missing_training_data_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let result = store.get_or_load(DiseaseKind::Asthma);
        assert!(matches!(result, Err(AppError::ModelUnavailable(_))));
        assert!(store.get(DiseaseKind::Asthma).is_none());
    }

    #[test]
    fn test_retrain_swaps_handle() {
        let dir = TempDir::new().unwrap();
        write_heart_csv(dir.path());
        let store = store(&dir);

        let before = store.get_or_load(DiseaseKind::HeartDisease).unwrap();
        let after = store.retrain(DiseaseKind::HeartDisease).unwrap();

        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.source, ModelSource::Trained);
        assert!(Arc::ptr_eq(
            &after,
            &store.get(DiseaseKind::HeartDisease).unwrap()
        ));
    }

    #[test]
    fn test_warm_up_reports_failures() {
        let dir = TempDir::new().unwrap();
        write_heart_csv(dir.path());
        let store = store(&dir);

        let failures = store.warm_up();
        let failed: Vec<DiseaseKind> = failures.iter().map(|(k, _)| *k).collect();

        assert_eq!(failed.len(), 4);
        assert!(!failed.contains(&DiseaseKind::HeartDisease));

        let status = store.status();
        let heart = status
            .iter()
            .find(|s| s.disease == DiseaseKind::HeartDisease)
            .unwrap();
        assert!(heart.loaded);
        assert!(heart.artifact_exists);
    }
}
