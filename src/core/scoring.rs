use crate::models::SimilarityMetric;

/// Spread below which distances are treated as identical
const DISTANCE_EPSILON: f64 = 1e-12;

/// Normalize raw backend scores into [0, 1], higher is better
///
/// Scoring per metric:
/// - `Similarity`: clamped as-is
/// - `CosineDistance`: 1 - d/2, clamped (cosine distance lives in [0, 2])
/// - `L2Distance`: inverted min-max rescale across the batch; when every
///   distance is the same each candidate scores 1.0
///
/// Non-finite inputs score 0.0.
pub fn normalize_scores(raw: &[f64], metric: SimilarityMetric) -> Vec<f64> {
    match metric {
        SimilarityMetric::Similarity => raw.iter().map(|&s| clamp_unit(s)).collect(),
        SimilarityMetric::CosineDistance => raw.iter().map(|&d| clamp_unit(1.0 - d / 2.0)).collect(),
        SimilarityMetric::L2Distance => rescale_distances(raw),
    }
}

/// Clamp a score into [0, 1]
#[inline]
pub fn clamp_unit(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn rescale_distances(raw: &[f64]) -> Vec<f64> {
    let finite = raw.iter().copied().filter(|d| d.is_finite());
    let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
        (lo.min(d), hi.max(d))
    });

    let spread = max - min;
    raw.iter()
        .map(|&d| {
            if !d.is_finite() {
                0.0
            } else if spread <= DISTANCE_EPSILON {
                1.0
            } else {
                clamp_unit((max - d) / spread)
            }
        })
        .collect()
}
