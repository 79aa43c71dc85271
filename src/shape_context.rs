//! Spatial-histogram (log-polar shape context) matcher
//!
//! Points sampled along the glyph each carry a histogram of where every other
//! point lies, binned by log distance and angle. Histograms are compared by
//! point index with a chi-squared distance.

use crate::config::SpatialConfig;
use crate::geometry::{
    allocate_points, normalize_centroid, resample, MinimumFor, ScaleMode,
};
use crate::glyph::{Point, Stroke};
use crate::matcher::{reciprocal_score, GlyphMatcher, MatcherKind};
use crate::store::Template;
use std::collections::BTreeMap;
use std::f64::consts::TAU;

/// Normalized point cloud and one flattened histogram per point
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialFeatures {
    pub points: Vec<Point>,
    /// Row-major `distance_bins × angle_bins`, each summing to 1
    pub histograms: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Default)]
pub struct ShapeContextMatcher {
    config: SpatialConfig,
}

impl ShapeContextMatcher {
    pub fn new(config: SpatialConfig) -> Self {
        ShapeContextMatcher { config }
    }

    pub fn config(&self) -> &SpatialConfig {
        &self.config
    }

    fn sample(&self, strokes: &[Stroke]) -> Vec<Point> {
        let shares = allocate_points(
            strokes,
            self.config.total_points,
            1,
            MinimumFor::PositiveLength,
        );
        let resampled: Vec<Stroke> = strokes
            .iter()
            .zip(shares)
            .map(|(s, n)| resample(s, n))
            .collect();
        normalize_centroid(&resampled, ScaleMode::MeanRadius)
            .into_iter()
            .flatten()
            .collect()
    }

    fn histograms(&self, points: &[Point]) -> Vec<Vec<f64>> {
        let SpatialConfig {
            distance_bins,
            angle_bins,
            inner_radius,
            outer_radius,
            epsilon,
            ..
        } = self.config;
        let scale = median_pairwise_distance(points);
        let (log_inner, log_outer) = (inner_radius.ln(), outer_radius.ln());
        let log_span = log_outer - log_inner;

        points
            .iter()
            .enumerate()
            .map(|(i, origin)| {
                let mut hist = vec![0.0; distance_bins * angle_bins];
                for (j, p) in points.iter().enumerate() {
                    if i == j {
                        continue;
                    }
                    let (dx, dy) = (p.x - origin.x, p.y - origin.y);
                    let log_r = (dx.hypot(dy) / scale + epsilon).ln().clamp(log_inner, log_outer);
                    let r_bin = (((log_r - log_inner) / log_span) * distance_bins as f64) as usize;
                    let theta = dy.atan2(dx).rem_euclid(TAU);
                    let t_bin = ((theta / TAU) * angle_bins as f64) as usize;
                    hist[r_bin.min(distance_bins - 1) * angle_bins + t_bin.min(angle_bins - 1)] +=
                        1.0;
                }
                let total: f64 = hist.iter().sum();
                if total > 0.0 {
                    hist.iter_mut().for_each(|h| *h /= total);
                }
                hist
            })
            .collect()
    }
}

/// Median over all unordered point pairs; 1 when undefined or zero
pub fn median_pairwise_distance(points: &[Point]) -> f64 {
    let mut distances: Vec<f64> = points
        .iter()
        .enumerate()
        .flat_map(|(i, a)| points[i + 1..].iter().map(move |b| a.distance_to(b)))
        .collect();
    if distances.is_empty() {
        return 1.0;
    }
    distances.sort_by(f64::total_cmp);
    let mid = distances.len() / 2;
    let median = if distances.len() % 2 == 0 {
        (distances[mid - 1] + distances[mid]) / 2.0
    } else {
        distances[mid]
    };
    if median > 0.0 && median.is_finite() {
        median
    } else {
        1.0
    }
}

/// `½ Σ (a−b)² / (a+b)`, skipping bins empty in both
pub fn chi_squared(a: &[f64], b: &[f64]) -> f64 {
    0.5 * a
        .iter()
        .zip(b)
        .filter(|(x, y)| *x + *y > 0.0)
        .map(|(x, y)| (x - y).powi(2) / (x + y))
        .sum::<f64>()
}

impl GlyphMatcher for ShapeContextMatcher {
    type Features = SpatialFeatures;

    fn kind(&self) -> MatcherKind {
        MatcherKind::SpatialHistogram
    }

    fn extract(&self, strokes: &[Stroke]) -> SpatialFeatures {
        let points = self.sample(strokes);
        let histograms = self.histograms(&points);
        SpatialFeatures { points, histograms }
    }

    fn template_features<'a>(&self, template: &'a Template) -> &'a SpatialFeatures {
        &template.spatial
    }

    fn distance(&self, input: &SpatialFeatures, reference: &SpatialFeatures) -> f64 {
        let (a, b) = (&input.histograms, &reference.histograms);
        let paired = a.len().min(b.len());
        if paired == 0 {
            return if a.is_empty() && b.is_empty() {
                0.0
            } else {
                f64::INFINITY
            };
        }
        let total: f64 = a.iter().zip(b).map(|(ha, hb)| chi_squared(ha, hb)).sum();
        total / paired as f64
    }

    fn score(&self, distance: f64) -> f64 {
        reciprocal_score(distance)
    }

    fn parameters(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("total_points", self.config.total_points as f64),
            ("distance_bins", self.config.distance_bins as f64),
            ("angle_bins", self.config.angle_bins as f64),
            ("inner_radius", self.config.inner_radius),
            ("outer_radius", self.config.outer_radius),
        ])
    }
}
