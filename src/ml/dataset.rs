use crate::error::{AppError, Result};
use crate::ml::models::TrainingDataset;
use crate::ml::schema::DiseaseSchema;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Load a labeled training table for a disease.
///
/// Columns are looked up by header name, so extra columns and column order
/// in the file do not matter. Rows with a blank, `N/A` or unparsable value in
/// any used column are dropped.
pub fn load_csv(schema: &DiseaseSchema, path: &Path) -> Result<TrainingDataset> {
    let file = std::fs::File::open(path).map_err(|e| {
        AppError::Training(format!("Cannot open {}: {}", path.display(), e))
    })?;
    let dataset = read_csv(schema, file)?;

    info!(
        disease = %schema.kind,
        path = %path.display(),
        samples = dataset.n_samples,
        positives = dataset.positive_count(),
        "📊 Loaded training data"
    );
    Ok(dataset)
}

/// Parse a training table from any reader
pub fn read_csv<R: Read>(schema: &DiseaseSchema, reader: R) -> Result<TrainingDataset> {
    let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = csv.headers()?.clone();

    let position = |column: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| AppError::Training(format!("Training data has no '{}' column", column)))
    };

    let feature_idx = schema
        .features
        .iter()
        .map(|f| position(f.column))
        .collect::<Result<Vec<_>>>()?;
    let target_idx = position(schema.target_column)?;

    let mut rows = Vec::new();
    let mut labels = Vec::new();
    let mut dropped = 0usize;

    for record in csv.records() {
        let record = record?;

        let features: Option<Vec<f64>> = schema
            .features
            .iter()
            .zip(&feature_idx)
            .map(|(spec, &idx)| parse_cell(schema, spec.column, record.get(idx)))
            .collect();
        let label = parse_cell(schema, schema.target_column, record.get(target_idx));

        match (features, label) {
            (Some(features), Some(label)) => {
                rows.push(features);
                labels.push((label != 0.0) as i32);
            }
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!(disease = %schema.kind, dropped, "Dropped incomplete training rows");
    }

    TrainingDataset::from_rows(rows, labels)
}

fn parse_cell(schema: &DiseaseSchema, column: &str, raw: Option<&str>) -> Option<f64> {
    let raw = raw?.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("n/a") || raw.eq_ignore_ascii_case("nan") {
        return None;
    }
    if let Ok(value) = raw.parse::<f64>() {
        return value.is_finite().then_some(value);
    }
    schema
        .mapping_for(column)?
        .values
        .iter()
        .find(|(text, _)| *text == raw)
        .map(|(_, code)| *code)
}
