use crate::error::{AppError, Result};
use crate::ml::models::{ClassOutput, ModelMetrics, TrainingDataset};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_classifier::{
    DecisionTreeClassifier, DecisionTreeClassifierParameters, SplitCriterion,
};
use std::collections::BTreeMap;

type Tree = DecisionTreeClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>;

/// Trait for binary classifiers used by the prediction pipeline
pub trait Classifier: Send + Sync {
    /// Classify one ordered feature vector
    fn predict(&self, features: &[f64]) -> Result<ClassOutput>;

    /// Width of the feature vector the model was fit on
    fn n_features(&self) -> usize;
}

/// Forest hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub seed: u64,
    pub max_depth: Option<u16>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            seed: 42,
            max_depth: None,
        }
    }
}

impl ForestParams {
    pub fn as_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("n_trees".to_string(), self.n_trees.to_string());
        map.insert("seed".to_string(), self.seed.to_string());
        map.insert(
            "max_depth".to_string(),
            self.max_depth
                .map(|d| d.to_string())
                .unwrap_or_else(|| "none".to_string()),
        );
        map.insert("criterion".to_string(), "gini".to_string());
        map
    }
}

/// One voter. A bootstrap sample holding a single class cannot be fit as a
/// tree, so it votes for that class unconditionally.
#[derive(Serialize, Deserialize)]
enum Member {
    Tree(Tree),
    Constant(i32),
}

impl Member {
    fn votes(&self, x: &DenseMatrix<f64>, n_rows: usize) -> Result<Vec<i32>> {
        match self {
            Member::Tree(tree) => tree
                .predict(x)
                .map_err(|e| AppError::Internal(format!("Prediction failed: {}", e))),
            Member::Constant(class) => Ok(vec![*class; n_rows]),
        }
    }
}

/// Bagged decision trees over smartcore's CART implementation.
///
/// Each tree is fit on a bootstrap sample drawn with its own seed (`seed + i`),
/// so a fit on the same data with the same params is reproducible. The
/// positive-class probability is the share of trees voting for class 1.
#[derive(Serialize, Deserialize)]
pub struct RandomForestClassifier {
    params: ForestParams,
    members: Vec<Member>,
    n_features: usize,
}

impl RandomForestClassifier {
    /// Fit the forest. Trees are grown in parallel.
    pub fn fit(dataset: &TrainingDataset, params: ForestParams) -> Result<Self> {
        if dataset.n_samples == 0 || dataset.n_features == 0 {
            return Err(AppError::Training("Training set is empty".to_string()));
        }
        if params.n_trees == 0 {
            return Err(AppError::Training("n_trees must be positive".to_string()));
        }
        let positives = dataset.positive_count();
        if positives == 0 || positives == dataset.n_samples {
            return Err(AppError::Training(
                "Training set must contain both classes".to_string(),
            ));
        }

        let members = (0..params.n_trees)
            .into_par_iter()
            .map(|i| Self::fit_member(dataset, params, i))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            params,
            members,
            n_features: dataset.n_features,
        })
    }

    fn fit_member(dataset: &TrainingDataset, params: ForestParams, index: usize) -> Result<Member> {
        let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(index as u64));
        let sample: Vec<usize> = (0..dataset.n_samples)
            .map(|_| rng.gen_range(0..dataset.n_samples))
            .collect();
        let bootstrap = dataset.select(&sample);

        let first = bootstrap.labels[0];
        if bootstrap.labels.iter().all(|&l| l == first) {
            return Ok(Member::Constant(first));
        }

        let x = to_dense(&bootstrap.row_major(), bootstrap.n_samples, bootstrap.n_features);
        let mut tree_params =
            DecisionTreeClassifierParameters::default().with_criterion(SplitCriterion::Gini);
        if let Some(depth) = params.max_depth {
            tree_params = tree_params.with_max_depth(depth);
        }

        let tree = DecisionTreeClassifier::fit(&x, &bootstrap.labels, tree_params)
            .map_err(|e| AppError::Training(format!("Failed to train decision tree: {}", e)))?;
        Ok(Member::Tree(tree))
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_trees(&self) -> usize {
        self.members.len()
    }

    /// Positive-class vote share for each row
    pub fn predict_positive_share(&self, rows: &[f64], n_rows: usize) -> Result<Vec<f64>> {
        if n_rows == 0 {
            return Ok(Vec::new());
        }
        if rows.len() != n_rows * self.n_features {
            return Err(AppError::Internal(format!(
                "Expected {} features per row, got {} values for {} rows",
                self.n_features,
                rows.len(),
                n_rows
            )));
        }

        let x = to_dense(rows, n_rows, self.n_features);
        let mut positive_votes = vec![0usize; n_rows];
        for member in &self.members {
            for (count, vote) in positive_votes.iter_mut().zip(member.votes(&x, n_rows)?) {
                if vote == 1 {
                    *count += 1;
                }
            }
        }

        let n_trees = self.members.len() as f64;
        Ok(positive_votes
            .into_iter()
            .map(|votes| votes as f64 / n_trees)
            .collect())
    }

    /// Evaluate on a held-out split
    pub fn evaluate(&self, dataset: &TrainingDataset) -> Result<ModelMetrics> {
        let shares = self.predict_positive_share(&dataset.row_major(), dataset.n_samples)?;
        let predicted: Vec<i32> = shares
            .into_iter()
            .map(|p| ClassOutput::from_positive_probability(p).predicted_class as i32)
            .collect();
        Ok(ModelMetrics::compute(&dataset.labels, &predicted))
    }
}

impl Classifier for RandomForestClassifier {
    fn predict(&self, features: &[f64]) -> Result<ClassOutput> {
        if features.len() != self.n_features {
            return Err(AppError::Internal(format!(
                "Expected {} features, got {}",
                self.n_features,
                features.len()
            )));
        }
        let share = self.predict_positive_share(features, 1)?;
        Ok(ClassOutput::from_positive_probability(share[0]))
    }

    fn n_features(&self) -> usize {
        self.n_features
    }
}

fn to_dense(row_major: &[f64], n_rows: usize, n_cols: usize) -> DenseMatrix<f64> {
    DenseMatrix::new(n_rows, n_cols, row_major.to_vec(), false)
}
