//! Angular-feature matcher
//!
//! Each stroke becomes a sequence of segments described by direction and
//! length after the glyph is resampled to a shared point budget and scaled
//! to a fixed radius. Segments are compared by position, not by optimal
//! correspondence.

use crate::config::AngularConfig;
use crate::geometry::{
    allocate_points, normalize_centroid, resample, MinimumFor, ScaleMode,
};
use crate::glyph::{Point, Stroke};
use crate::matcher::{reciprocal_score, GlyphMatcher, MatcherKind};
use crate::store::Template;
use std::collections::BTreeMap;
use std::f64::consts::{PI, TAU};

/// Direction and length of one segment between consecutive points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Directed angle in `(-π, π]`
    pub angle: f64,
    pub magnitude: f64,
    /// Quantized direction; informational only
    pub bin: usize,
}

/// Per-stroke segment sequences
#[derive(Debug, Clone, PartialEq)]
pub struct AngularFeatures {
    pub strokes: Vec<Vec<Segment>>,
}

#[derive(Debug, Clone, Default)]
pub struct AngularMatcher {
    config: AngularConfig,
}

impl AngularMatcher {
    pub fn new(config: AngularConfig) -> Self {
        AngularMatcher { config }
    }

    pub fn config(&self) -> &AngularConfig {
        &self.config
    }

    fn direction_bin(&self, angle: f64) -> usize {
        let bins = self.config.direction_bins.max(1);
        let unit = (angle + PI) / TAU;
        ((unit * bins as f64).floor() as usize) % bins
    }

    fn segments(&self, stroke: &[Point]) -> Vec<Segment> {
        stroke
            .windows(2)
            .map(|w| {
                let (dx, dy) = (w[1].x - w[0].x, w[1].y - w[0].y);
                let angle = dy.atan2(dx);
                Segment {
                    angle,
                    magnitude: dx.hypot(dy),
                    bin: self.direction_bin(angle),
                }
            })
            .collect()
    }

    fn stroke_distance(&self, a: &[Segment], b: &[Segment]) -> f64 {
        let paired = a.len().min(b.len());
        if paired == 0 {
            return if a.is_empty() && b.is_empty() {
                0.0
            } else {
                self.config.angle_weight * PI
            };
        }
        let sum: f64 = a
            .iter()
            .zip(b.iter())
            .map(|(sa, sb)| {
                self.config.angle_weight * angular_difference(sa.angle, sb.angle)
                    + self.config.magnitude_weight * (sa.magnitude - sb.magnitude).abs()
            })
            .sum();
        sum / paired as f64
    }
}

/// Smallest absolute difference between two directions, in `[0, π]`
pub fn angular_difference(a: f64, b: f64) -> f64 {
    let d = (a - b).abs() % TAU;
    d.min(TAU - d)
}

impl GlyphMatcher for AngularMatcher {
    type Features = AngularFeatures;

    fn kind(&self) -> MatcherKind {
        MatcherKind::Angular
    }

    fn extract(&self, strokes: &[Stroke]) -> AngularFeatures {
        let shares =
            allocate_points(strokes, self.config.total_points, 2, MinimumFor::AnyPoints);
        let resampled: Vec<Stroke> = strokes
            .iter()
            .zip(shares)
            .map(|(s, n)| resample(s, n))
            .collect();
        let normalized = normalize_centroid(&resampled, ScaleMode::MaxRadius);
        AngularFeatures {
            strokes: normalized.iter().map(|s| self.segments(s)).collect(),
        }
    }

    fn template_features<'a>(&self, template: &'a Template) -> &'a AngularFeatures {
        &template.angular
    }

    fn distance(&self, input: &AngularFeatures, reference: &AngularFeatures) -> f64 {
        let (a, b) = (&input.strokes, &reference.strokes);
        let paired = a.len().min(b.len());
        if paired == 0 {
            return f64::INFINITY;
        }
        let total: f64 = a
            .iter()
            .zip(b.iter())
            .map(|(sa, sb)| self.stroke_distance(sa, sb))
            .sum();
        let unmatched = a.len().abs_diff(b.len()) as f64;

        total / paired as f64 + self.config.stroke_penalty * unmatched
    }

    fn score(&self, distance: f64) -> f64 {
        reciprocal_score(distance)
    }

    fn parameters(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("total_points", self.config.total_points as f64),
            ("direction_bins", self.config.direction_bins as f64),
            ("angle_weight", self.config.angle_weight),
            ("magnitude_weight", self.config.magnitude_weight),
            ("stroke_penalty", self.config.stroke_penalty),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::stroke_from_pairs;

    fn pair_distance(m: &AngularMatcher, a: &[Stroke], b: &[Stroke]) -> f64 {
        m.distance(&m.extract(a), &m.extract(b))
    }

    fn cross() -> Vec<Stroke> {
        vec![
            stroke_from_pairs(&[(0.0, 0.0), (100.0, 0.0)]),
            stroke_from_pairs(&[(50.0, -50.0), (50.0, 50.0)]),
        ]
    }

    #[test]
    fn test_angular_difference_wraps() {
        assert!((angular_difference(PI - 0.1, -PI + 0.1) - 0.2).abs() < 1e-12);
        assert_eq!(angular_difference(0.5, 0.5), 0.0);
        assert!((angular_difference(0.0, PI) - PI).abs() < 1e-12);
    }

    #[test]
    fn test_segments_and_bins() {
        let m = AngularMatcher::default();
        let segs = m.segments(&stroke_from_pairs(&[(0.0, 0.0), (3.0, 4.0), (3.0, 4.0)]));
        assert_eq!(segs.len(), 2);
        assert!((segs[0].magnitude - 5.0).abs() < 1e-12);
        assert!((segs[0].angle - (4.0_f64).atan2(3.0)).abs() < 1e-12);
        assert_eq!(segs[1].magnitude, 0.0);

        assert_eq!(m.direction_bin(PI), 0);
        assert_eq!(m.direction_bin(0.0), 4);
        assert_eq!(m.direction_bin(-PI), 0);
    }

    #[test]
    fn test_point_budget_shared_by_length() {
        let m = AngularMatcher::default();
        let f = m.extract(&cross());
        // Two equal-length strokes split 64 points, 31 segments each
        assert_eq!(f.strokes.len(), 2);
        assert_eq!(f.strokes[0].len(), 31);
        assert_eq!(f.strokes[1].len(), 31);

        // 30 and 10 units of ink take 48 and 16 points
        let uneven = vec![
            stroke_from_pairs(&[(0.0, 0.0), (30.0, 0.0)]),
            stroke_from_pairs(&[(0.0, 10.0), (10.0, 10.0)]),
        ];
        let f = m.extract(&uneven);
        assert_eq!(f.strokes[0].len(), 47);
        assert_eq!(f.strokes[1].len(), 15);
    }

    #[test]
    fn test_identity_and_rotation_sensitivity() {
        let m = AngularMatcher::default();
        assert_eq!(pair_distance(&m, &cross(), &cross()), 0.0);
        assert_eq!(m.score(0.0), 1.0);

        let reversed: Vec<Stroke> = cross()
            .into_iter()
            .map(|s| s.into_iter().rev().collect())
            .collect();
        let d = pair_distance(&m, &cross(), &reversed);
        // Every segment points the opposite way
        assert!((d - 0.7 * PI).abs() < 1e-9);
    }

    #[test]
    fn test_scale_invariance() {
        let m = AngularMatcher::default();
        let big: Vec<Stroke> = cross()
            .iter()
            .map(|s| s.iter().map(|p| Point::new(p.x * 3.0 + 11.0, p.y * 3.0)).collect())
            .collect();
        assert!(pair_distance(&m, &cross(), &big) < 1e-9);
    }

    #[test]
    fn test_stroke_count_penalty() {
        let m = AngularMatcher::default();
        let one = vec![cross()[0].clone()];
        let extra = vec![cross()[0].clone(), Vec::new()];
        let d = pair_distance(&m, &extra, &one);
        assert!((d - 0.3).abs() < 1e-12);
        assert!(m.score(d) < 1.0);
    }

    #[test]
    fn test_missing_segments_cost_max_angle() {
        let m = AngularMatcher::default();
        let dot = vec![stroke_from_pairs(&[(1.0, 1.0)])];
        let d = pair_distance(&m, &dot, &[cross()[0].clone()]);
        assert!((d - 0.7 * PI).abs() < 1e-12);
        assert_eq!(pair_distance(&m, &dot, &dot), 0.0);
        assert_eq!(pair_distance(&m, &[], &dot), f64::INFINITY);
    }
}
