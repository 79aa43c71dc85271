//! Elastic alignment matcher
//!
//! Strokes are compared index by index with dynamic time warping over
//! bounding-box normalized, resampled and smoothed point sequences.

use crate::config::AlignmentConfig;
use crate::geometry::{distance, normalize_bounding_box, resample, smooth};
use crate::glyph::{Point, Stroke};
use crate::matcher::{exponential_score, GlyphMatcher, MatcherKind};
use crate::store::Template;
use std::collections::BTreeMap;

/// Normalized strokes ready for warping
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentFeatures {
    pub strokes: Vec<Stroke>,
}

#[derive(Debug, Clone, Default)]
pub struct AlignmentMatcher {
    config: AlignmentConfig,
}

impl AlignmentMatcher {
    pub fn new(config: AlignmentConfig) -> Self {
        AlignmentMatcher { config }
    }

    pub fn config(&self) -> &AlignmentConfig {
        &self.config
    }
}

/// Length-normalized warping distance between two point sequences.
///
/// An empty sequence on either side is infinitely far away.
pub fn dtw_distance(a: &[Point], b: &[Point]) -> f64 {
    let (n, m) = (a.len(), b.len());
    if n == 0 || m == 0 {
        return f64::INFINITY;
    }

    let width = m + 1;
    let mut grid = vec![f64::INFINITY; (n + 1) * width];
    grid[0] = 0.0;

    for i in 1..=n {
        for j in 1..=m {
            let cost = distance(&a[i - 1], &b[j - 1]);
            let best = grid[(i - 1) * width + j]
                .min(grid[i * width + j - 1])
                .min(grid[(i - 1) * width + j - 1]);
            grid[i * width + j] = cost + best;
        }
    }

    grid[n * width + m] / n.max(m) as f64
}

impl GlyphMatcher for AlignmentMatcher {
    type Features = AlignmentFeatures;

    fn kind(&self) -> MatcherKind {
        MatcherKind::Alignment
    }

    fn extract(&self, strokes: &[Stroke]) -> AlignmentFeatures {
        let strokes = normalize_bounding_box(strokes)
            .iter()
            .map(|s| {
                smooth(
                    &resample(s, self.config.resample_points),
                    self.config.smoothing_window,
                )
            })
            .collect();
        AlignmentFeatures { strokes }
    }

    fn template_features<'a>(&self, template: &'a Template) -> &'a AlignmentFeatures {
        &template.alignment
    }

    fn distance(&self, input: &AlignmentFeatures, reference: &AlignmentFeatures) -> f64 {
        let (a, b) = (&input.strokes, &reference.strokes);
        let paired = a.len().min(b.len());
        if paired == 0 {
            return f64::INFINITY;
        }

        let total: f64 = a
            .iter()
            .zip(b.iter())
            .map(|(sa, sb)| dtw_distance(sa, sb))
            .sum();
        let unmatched = a.len().abs_diff(b.len()) as f64;

        total / paired as f64 + self.config.stroke_penalty * unmatched
    }

    fn score(&self, distance: f64) -> f64 {
        exponential_score(distance, self.config.score_decay)
    }

    fn parameters(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("resample_points", self.config.resample_points as f64),
            ("smoothing_window", self.config.smoothing_window as f64),
            ("stroke_penalty", self.config.stroke_penalty),
            ("score_decay", self.config.score_decay),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::stroke_from_pairs;

    fn glyph() -> Vec<Stroke> {
        vec![
            stroke_from_pairs(&[(0.0, 0.0), (50.0, 10.0), (100.0, 0.0)]),
            stroke_from_pairs(&[(50.0, -40.0), (50.0, 60.0)]),
        ]
    }

    fn pair_distance(m: &AlignmentMatcher, a: &[Stroke], b: &[Stroke]) -> f64 {
        m.distance(&m.extract(a), &m.extract(b))
    }

    #[test]
    fn test_dtw_basics() {
        let a = stroke_from_pairs(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        assert_eq!(dtw_distance(&a, &a), 0.0);

        let shifted = stroke_from_pairs(&[(0.0, 1.0), (1.0, 1.0), (2.0, 1.0)]);
        assert!((dtw_distance(&a, &shifted) - 1.0).abs() < 1e-12);

        // Warping absorbs a repeated sample
        let stutter = stroke_from_pairs(&[(0.0, 0.0), (0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        assert_eq!(dtw_distance(&a, &stutter), 0.0);

        assert_eq!(dtw_distance(&a, &[]), f64::INFINITY);
        assert_eq!(dtw_distance(&[], &a), f64::INFINITY);
    }

    #[test]
    fn test_identity_scores_one() {
        let m = AlignmentMatcher::default();
        let d = pair_distance(&m, &glyph(), &glyph());
        assert_eq!(d, 0.0);
        assert_eq!(m.score(d), 1.0);
    }

    #[test]
    fn test_scale_and_translation_invariance() {
        let m = AlignmentMatcher::default();
        let moved: Vec<Stroke> = glyph()
            .iter()
            .map(|s| s.iter().map(|p| Point::new(p.x * 0.5 + 7.0, p.y * 0.5 - 3.0)).collect())
            .collect();
        assert!(pair_distance(&m, &glyph(), &moved) < 1e-9);
    }

    #[test]
    fn test_extra_empty_stroke_adds_exact_penalty() {
        let m = AlignmentMatcher::default();
        let base = pair_distance(&m, &glyph(), &glyph());

        let mut extra = glyph();
        extra.push(Vec::new());
        let penalized = pair_distance(&m, &extra, &glyph());
        assert_eq!(penalized - base, 0.5);

        let again = pair_distance(&m, &glyph(), &extra);
        assert_eq!(again - base, 0.5);
    }

    #[test]
    fn test_empty_aligned_stroke_is_infinite() {
        let m = AlignmentMatcher::default();
        let input = vec![Vec::new(), glyph()[1].clone()];
        let d = pair_distance(&m, &input, &glyph());
        assert_eq!(d, f64::INFINITY);
        assert_eq!(m.score(d), 0.0);
        assert_eq!(pair_distance(&m, &[], &glyph()), f64::INFINITY);
    }

    #[test]
    fn test_features_have_fixed_length() {
        let m = AlignmentMatcher::default();
        let f = m.extract(&glyph());
        assert!(f.strokes.iter().all(|s| s.len() == 32));
    }

    #[test]
    fn test_different_shapes_score_lower() {
        let m = AlignmentMatcher::default();
        let other = vec![
            stroke_from_pairs(&[(0.0, 100.0), (100.0, 0.0)]),
            stroke_from_pairs(&[(0.0, 0.0), (100.0, 100.0)]),
        ];
        let d = pair_distance(&m, &glyph(), &other);
        assert!(d > 0.0);
        let s = m.score(d);
        assert!(s > 0.0 && s < 1.0);
    }
}
