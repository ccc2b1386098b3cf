//! Classifier training pipeline
//!
//! Orchestrates the full training run: load the stored series, derive
//! features, drop rows with incomplete history, derive percentile-adaptive
//! labels, split, scale, fit the forest, evaluate on the held-out split, and
//! persist the artifact bundle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use shared::{
    drop_incomplete_rows, feature_columns, PercentileThresholds, StressLabeler, StressLevel,
    TemporalFeatureDeriver,
};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::model::{
    ClassReport, FeatureImportance, ForestParams, ModelError, RandomForest, StandardScaler,
    StressModel, TrainingMetrics,
};
use crate::services::DatasetService;

/// Training service for fitting and persisting stress models
#[derive(Clone)]
pub struct TrainingService {
    db: PgPool,
    config: Arc<Config>,
}

/// Summary of a completed training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub run_id: Uuid,
    pub total_observations: usize,
    /// Rows remaining after dropping incomplete rolling history
    pub feature_rows: usize,
    /// Labeled rows per ordinal level
    pub label_distribution: [usize; 3],
    pub thresholds: PercentileThresholds,
    pub metrics: TrainingMetrics,
    pub top_features: Vec<FeatureImportance>,
    pub artifact_path: String,
    pub below_recommended_size: bool,
}

/// Database row for a recorded training run
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct TrainingRunRecord {
    pub id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub samples: i32,
    pub train_size: i32,
    pub test_size: i32,
    pub accuracy: f64,
    pub artifact_path: String,
}

impl TrainingService {
    /// Create a new TrainingService instance
    pub fn new(db: PgPool, config: Arc<Config>) -> Self {
        Self { db, config }
    }

    /// Run the full training pipeline over the stored observation series.
    pub async fn train(&self) -> AppResult<(Arc<StressModel>, TrainingReport)> {
        let observations = DatasetService::new(self.db.clone()).load_all().await?;
        if observations.is_empty() {
            return Err(AppError::EmptyTrainingTable);
        }
        tracing::info!("Training on {} stored observation(s)", observations.len());

        // Derive features and keep only rows with complete rolling history
        let deriver = TemporalFeatureDeriver::new(self.config.features.clone());
        let rows = deriver.derive(&observations)?;
        let complete = drop_incomplete_rows(rows);
        if complete.is_empty() {
            return Err(AppError::DatasetError(
                "no rows with complete rolling history; the series must be longer than the largest window"
                    .to_string(),
            ));
        }

        // Percentile-adaptive labels
        let labeler = StressLabeler::new(self.config.labeling);
        let table = labeler.label(&complete)?;
        tracing::info!(
            "Label thresholds: humidity P25 {:.1} / P50 {:.1}, NDVI P25 {:.2} / P50 {:.2}, LST P75 {:.1}",
            table.thresholds.p25_humidity,
            table.thresholds.p50_humidity,
            table.thresholds.p25_ndvi,
            table.thresholds.p50_ndvi,
            table.thresholds.p75_lst,
        );
        tracing::info!(
            "Label distribution: no_stress {} / moderate {} / severe {}",
            table.distribution[0],
            table.distribution[1],
            table.distribution[2],
        );

        // Project into the canonical column order
        let columns = feature_columns(&self.config.features.windows);
        let vectors: Vec<Vec<f64>> = table
            .rows
            .iter()
            .map(|r| r.row.to_vector(&columns))
            .collect::<Result<_, _>>()?;
        let labels: Vec<usize> = table
            .rows
            .iter()
            .map(|r| r.label.level() as usize)
            .collect();

        let n = vectors.len();
        if n < 5 {
            return Err(AppError::DatasetError(format!(
                "need at least 5 labeled rows to train, got {}",
                n
            )));
        }

        // Deterministic shuffled split
        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(self.config.model.seed);
        indices.shuffle(&mut rng);
        let test_size =
            ((n as f64 * self.config.model.test_fraction).round() as usize).clamp(1, n - 1);
        let (test_idx, train_idx) = indices.split_at(test_size);

        let pick = |idx: &[usize]| -> (Vec<Vec<f64>>, Vec<usize>) {
            (
                idx.iter().map(|&i| vectors[i].clone()).collect(),
                idx.iter().map(|&i| labels[i]).collect(),
            )
        };
        let (train_x, train_y) = pick(train_idx);
        let (test_x, test_y) = pick(test_idx);
        tracing::info!("Split: train {} / test {}", train_x.len(), test_x.len());

        // Scale on the training split only
        let scaler = StandardScaler::fit(&train_x)?;
        let train_scaled = scaler.transform(&train_x)?;
        let test_scaled = scaler.transform(&test_x)?;

        // Fit the forest
        let forest = RandomForest::fit(
            &train_scaled,
            &train_y,
            StressLevel::ALL.len(),
            ForestParams {
                n_trees: self.config.model.n_trees,
                max_depth: self.config.model.max_depth,
                min_samples_split: self.config.model.min_samples_split,
                seed: self.config.model.seed,
            },
        )?;

        // Evaluate on the held-out split
        let metrics = evaluate(&forest, &test_scaled, &test_y, train_x.len())?;
        tracing::info!("Held-out accuracy: {:.3}", metrics.accuracy);

        let importances = ranked_importances(&columns, forest.importances());
        for fi in importances.iter().take(5) {
            tracing::debug!("feature importance {}: {:.4}", fi.feature, fi.importance);
        }

        let model = StressModel {
            feature_names: columns,
            scaler,
            forest,
            importances: importances.clone(),
            trained_at: Utc::now(),
            metrics: metrics.clone(),
        };

        let artifact_path = self.config.model.artifact_path.clone();
        model.save(&artifact_path)?;
        tracing::info!("Artifact saved to {}", artifact_path);

        let run_id = self.record_run(&model, n, &artifact_path).await?;

        let report = TrainingReport {
            run_id,
            total_observations: observations.len(),
            feature_rows: n,
            label_distribution: table.distribution,
            thresholds: table.thresholds,
            metrics,
            top_features: importances.into_iter().take(10).collect(),
            artifact_path,
            below_recommended_size: shared::is_below_recommended_size(n),
        };

        Ok((Arc::new(model), report))
    }

    /// List past training runs, newest first.
    pub async fn list_runs(&self) -> AppResult<Vec<TrainingRunRecord>> {
        let rows = sqlx::query_as::<_, TrainingRunRecord>(
            r#"
            SELECT id, trained_at, samples, train_size, test_size, accuracy, artifact_path
            FROM training_runs
            ORDER BY trained_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn record_run(
        &self,
        model: &StressModel,
        samples: usize,
        artifact_path: &str,
    ) -> AppResult<Uuid> {
        let run_id = Uuid::new_v4();
        let metrics_json = serde_json::to_value(&model.metrics)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO training_runs (
                id, trained_at, samples, train_size, test_size, accuracy, metrics, artifact_path
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(run_id)
        .bind(model.trained_at)
        .bind(samples as i32)
        .bind(model.metrics.train_size as i32)
        .bind(model.metrics.test_size as i32)
        .bind(model.metrics.accuracy)
        .bind(&metrics_json)
        .bind(artifact_path)
        .execute(&self.db)
        .await?;

        Ok(run_id)
    }
}

/// Accuracy, confusion matrix, and per-class precision/recall on a held-out
/// split.
fn evaluate(
    forest: &RandomForest,
    samples: &[Vec<f64>],
    labels: &[usize],
    train_size: usize,
) -> Result<TrainingMetrics, ModelError> {
    let n_classes = StressLevel::ALL.len();
    let mut confusion = vec![vec![0usize; n_classes]; n_classes];

    for (sample, &actual) in samples.iter().zip(labels) {
        let predicted = forest.predict(sample)?;
        confusion[actual][predicted] += 1;
    }

    let correct: usize = (0..n_classes).map(|c| confusion[c][c]).sum();
    let accuracy = correct as f64 / samples.len() as f64;

    let per_class = StressLevel::ALL
        .iter()
        .map(|&level| {
            let c = level.level() as usize;
            let support: usize = confusion[c].iter().sum();
            let predicted_count: usize = (0..n_classes).map(|r| confusion[r][c]).sum();
            let hits = confusion[c][c];
            ClassReport {
                label: level,
                precision: ratio(hits, predicted_count),
                recall: ratio(hits, support),
                support,
            }
        })
        .collect();

    Ok(TrainingMetrics {
        accuracy,
        confusion_matrix: confusion,
        per_class,
        train_size,
        test_size: samples.len(),
    })
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Pair importances with their column names, sorted descending.
fn ranked_importances(columns: &[String], importances: &[f64]) -> Vec<FeatureImportance> {
    let mut ranked: Vec<FeatureImportance> = columns
        .iter()
        .zip(importances)
        .map(|(feature, &importance)| FeatureImportance {
            feature: feature.clone(),
            importance,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    ranked
}
