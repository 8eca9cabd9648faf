//! Similarity scoring for identity embeddings.
//!
//! One algorithm serves both the face and the signature comparison paths:
//! each embedding is normalized to unit L2 norm, the distance between the
//! normalized vectors is compared against a caller-supplied threshold, and
//! the confidence expresses how far the sample sits from the decision
//! boundary.
//!
//! # Usage
//!
//! ```
//! use certiva_core::similarity::{compare, DistanceMetric};
//!
//! let a = vec![1.0, 0.0, 0.0];
//! let b = vec![0.0, 1.0, 0.0];
//! let result = compare(&a, &b, DistanceMetric::Euclidean, 0.9).unwrap();
//! assert!(!result.prediction); // orthogonal identities do not match
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CertivaError, Result};

/// Decimal places kept when presenting distance and confidence.
const PRESENTATION_DECIMALS: u32 = 2;

/// Distance metric applied to the normalized embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Euclidean distance between unit vectors (default).
    #[default]
    Euclidean,
    /// Cosine distance (`1 - a.b`) between unit vectors.
    Cosine,
}

impl std::str::FromStr for DistanceMetric {
    type Err = CertivaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "euclidean" => Ok(Self::Euclidean),
            "cosine" => Ok(Self::Cosine),
            other => Err(CertivaError::InvalidEmbedding(format!(
                "Unknown distance metric: {other}"
            ))),
        }
    }
}

/// Two embeddings queued for comparison, with the metric to apply.
///
/// Ephemeral: produced per comparison request, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingPair {
    pub first: Vec<f32>,
    pub second: Vec<f32>,
    #[serde(default)]
    pub metric: DistanceMetric,
}

impl EmbeddingPair {
    pub fn new(first: Vec<f32>, second: Vec<f32>) -> Self {
        Self {
            first,
            second,
            metric: DistanceMetric::default(),
        }
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Score this pair against the given threshold.
    pub fn compare(&self, threshold: f32) -> Result<SimilarityResult> {
        compare(&self.first, &self.second, self.metric, threshold)
    }
}

/// Outcome of a single embedding comparison. Immutable once produced.
///
/// Invariant: `prediction == (distance < threshold)` where `distance` is
/// the unrounded value; the stored `distance` and `confidence` are rounded
/// to two decimals for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// Distance between the normalized embeddings (>= 0).
    pub distance: f32,
    /// Whether the pair is predicted to be the same identity.
    pub prediction: bool,
    /// Distance to the decision boundary, scaled by the threshold and
    /// clamped to `[0, 1]`. This is 0 exactly at the threshold and grows
    /// toward 1 as the sample moves away from it in either direction; it
    /// is not a calibrated probability.
    pub confidence: f32,
    /// Threshold the prediction was made against.
    pub threshold: f32,
}

/// Compare two embeddings against a match threshold.
///
/// Both embeddings are independently normalized to unit L2 norm before the
/// distance is computed. The prediction and confidence are derived from the
/// unrounded distance; only the reported values are rounded.
///
/// # Errors
///
/// - [`CertivaError::InvalidThreshold`] when `threshold <= 0` or non-finite.
/// - [`CertivaError::InvalidEmbedding`] when the embeddings are empty, of
///   mismatched dimensionality, all-zero (normalization undefined), or
///   contain non-finite components.
pub fn compare(
    first: &[f32],
    second: &[f32],
    metric: DistanceMetric,
    threshold: f32,
) -> Result<SimilarityResult> {
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(CertivaError::InvalidThreshold(format!(
            "threshold must be a positive finite number, got {threshold}"
        )));
    }

    if first.is_empty() || second.is_empty() {
        return Err(CertivaError::InvalidEmbedding(
            "empty embedding vector".into(),
        ));
    }

    if first.len() != second.len() {
        return Err(CertivaError::InvalidEmbedding(format!(
            "dimensionality mismatch: {} vs {}",
            first.len(),
            second.len()
        )));
    }

    let a = normalize(first)?;
    let b = normalize(second)?;

    let distance = match metric {
        DistanceMetric::Euclidean => euclidean_distance(&a, &b),
        DistanceMetric::Cosine => cosine_distance(&a, &b),
    };

    let prediction = distance < threshold;
    let confidence = ((distance - threshold).abs() / threshold).min(1.0);

    Ok(SimilarityResult {
        distance: round(distance),
        prediction,
        confidence: round(confidence),
        threshold,
    })
}

/// Normalize an embedding to unit L2 norm.
fn normalize(embedding: &[f32]) -> Result<Vec<f32>> {
    let norm_sq: f32 = embedding.iter().map(|x| x * x).sum();

    if !norm_sq.is_finite() {
        return Err(CertivaError::InvalidEmbedding(
            "embedding contains non-finite components".into(),
        ));
    }
    if norm_sq == 0.0 {
        return Err(CertivaError::InvalidEmbedding(
            "all-zero embedding cannot be normalized".into(),
        ));
    }

    let norm = norm_sq.sqrt();
    Ok(embedding.iter().map(|x| x / norm).collect())
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    // Unit vectors: dot is in [-1, 1], so the distance stays in [0, 2].
    (1.0 - dot).max(0.0)
}

fn round(value: f32) -> f32 {
    let factor = 10f32.powi(PRESENTATION_DECIMALS as i32);
    (value * factor).round() / factor
}
