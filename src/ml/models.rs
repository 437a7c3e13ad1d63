use crate::error::{AppError, Result};
use crate::models::DiseaseKind;
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output of a binary classifier for one input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassOutput {
    /// 0 = negative, 1 = positive
    pub predicted_class: u8,

    /// Probability of class 0 and class 1, summing to 1
    pub probabilities: [f64; 2],
}

impl ClassOutput {
    /// Build from the positive-class probability. Ties go to class 0.
    pub fn from_positive_probability(p_positive: f64) -> Self {
        let p_positive = p_positive.clamp(0.0, 1.0);
        let probabilities = [1.0 - p_positive, p_positive];
        let predicted_class = if probabilities[1] > probabilities[0] { 1 } else { 0 };
        Self {
            predicted_class,
            probabilities,
        }
    }

    /// Largest class probability as a percentage
    pub fn confidence(&self) -> f64 {
        self.probabilities[0].max(self.probabilities[1]) * 100.0
    }
}

/// Feature matrix and binary labels loaded from a training table
#[derive(Debug, Clone)]
pub struct TrainingDataset {
    /// Feature matrix (n_samples × n_features)
    pub features: Array2<f64>,

    /// Labels, 0 or 1
    pub labels: Vec<i32>,

    pub n_samples: usize,
    pub n_features: usize,
}

impl TrainingDataset {
    /// Create a dataset from row vectors of equal width
    pub fn from_rows(rows: Vec<Vec<f64>>, labels: Vec<i32>) -> Result<Self> {
        if rows.len() != labels.len() {
            return Err(AppError::Training(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }

        let n_samples = rows.len();
        let n_features = rows.first().map(|r| r.len()).unwrap_or(0);
        if let Some(bad) = rows.iter().position(|r| r.len() != n_features) {
            return Err(AppError::Training(format!(
                "row {} has {} values, expected {}",
                bad,
                rows[bad].len(),
                n_features
            )));
        }

        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let features = Array2::from_shape_vec((n_samples, n_features), flat)
            .map_err(|e| AppError::Training(e.to_string()))?;

        Ok(Self {
            features,
            labels,
            n_samples,
            n_features,
        })
    }

    /// Rows in row-major order, the layout `DenseMatrix::new` expects
    pub fn row_major(&self) -> Vec<f64> {
        self.features.iter().copied().collect()
    }

    /// Subset by row index, duplicates allowed
    pub fn select(&self, indices: &[usize]) -> TrainingDataset {
        TrainingDataset {
            features: self.features.select(Axis(0), indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            n_samples: indices.len(),
            n_features: self.n_features,
        }
    }

    pub fn positive_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == 1).count()
    }

    /// Shuffled train/test split, reproducible for a given seed.
    ///
    /// The test share is rounded up so a non-empty dataset always has a test row.
    pub fn train_test_split(&self, test_size: f64, seed: u64) -> (TrainingDataset, TrainingDataset) {
        let mut indices: Vec<usize> = (0..self.n_samples).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let n_test = ((self.n_samples as f64) * test_size.clamp(0.0, 1.0)).ceil() as usize;
        let n_test = n_test.min(self.n_samples.saturating_sub(1));
        let (test_idx, train_idx) = indices.split_at(n_test);

        (self.select(train_idx), self.select(test_idx))
    }
}

/// Per-class evaluation metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Model evaluation metrics on the held-out split
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: f64,

    /// Macro-averaged over both classes
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,

    /// `confusion_matrix[actual][predicted]`
    pub confusion_matrix: [[usize; 2]; 2],

    pub per_class_metrics: BTreeMap<String, ClassMetrics>,
}

impl ModelMetrics {
    pub fn compute(y_true: &[i32], y_pred: &[i32]) -> Self {
        let mut confusion = [[0usize; 2]; 2];
        for (&actual, &predicted) in y_true.iter().zip(y_pred) {
            let a = (actual == 1) as usize;
            let p = (predicted == 1) as usize;
            confusion[a][p] += 1;
        }

        let total = y_true.len().min(y_pred.len());
        let correct = confusion[0][0] + confusion[1][1];
        let accuracy = if total > 0 {
            correct as f64 / total as f64
        } else {
            0.0
        };

        let mut per_class_metrics = BTreeMap::new();
        for class in 0..2 {
            let tp = confusion[class][class];
            let fp = confusion[1 - class][class];
            let fn_ = confusion[class][1 - class];

            let precision = ratio(tp, tp + fp);
            let recall = ratio(tp, tp + fn_);
            let f1_score = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };

            per_class_metrics.insert(
                class.to_string(),
                ClassMetrics {
                    precision,
                    recall,
                    f1_score,
                    support: tp + fn_,
                },
            );
        }

        let n = per_class_metrics.len() as f64;
        let (precision, recall, f1_score) = per_class_metrics.values().fold(
            (0.0, 0.0, 0.0),
            |(p, r, f), m| (p + m.precision / n, r + m.recall / n, f + m.f1_score / n),
        );

        Self {
            accuracy,
            precision,
            recall,
            f1_score,
            confusion_matrix: confusion,
            per_class_metrics,
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Model type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Bagged decision trees with majority vote
    RandomForest,
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelType::RandomForest => write!(f, "Random Forest"),
        }
    }
}

/// Model metadata, persisted with the artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub disease: DiseaseKind,

    /// Model name
    pub name: String,

    /// Crate version that trained the model
    pub version: String,

    pub model_type: ModelType,

    /// Training timestamp
    pub trained_at: chrono::DateTime<chrono::Utc>,

    pub n_training_samples: usize,
    pub n_test_samples: usize,
    pub n_features: usize,

    /// Training column order
    pub feature_names: Vec<String>,

    /// Metrics on the held-out split
    pub validation_metrics: ModelMetrics,

    pub hyperparameters: BTreeMap<String, String>,
}
