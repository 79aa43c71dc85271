//! Uniform matching interface over the closed set of shape matchers
//!
//! Every matcher turns a stroke set into its own feature type, measures a
//! non-negative distance between two feature values and maps that distance
//! into a score in `[0, 1]`. [`rank_templates`] is the one linear scan they
//! all share.

use crate::alignment::AlignmentMatcher;
use crate::angular::AngularMatcher;
use crate::config::RecognizerConfig;
use crate::error::{RecogError, RecogResult};
use crate::glyph::Stroke;
use crate::session::QueryTicket;
use crate::shape_context::ShapeContextMatcher;
use crate::store::Template;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The shape matchers available to the recognizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherKind {
    /// Elastic point-sequence alignment
    Alignment,
    /// Segment direction and magnitude comparison
    Angular,
    /// Log-polar shape context comparison
    SpatialHistogram,
}

impl MatcherKind {
    pub const ALL: [MatcherKind; 3] = [
        MatcherKind::Alignment,
        MatcherKind::Angular,
        MatcherKind::SpatialHistogram,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatcherKind::Alignment => "alignment",
            MatcherKind::Angular => "angular",
            MatcherKind::SpatialHistogram => "spatial_histogram",
        }
    }
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatcherKind {
    type Err = RecogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "alignment" | "dtw" => Ok(MatcherKind::Alignment),
            "angular" => Ok(MatcherKind::Angular),
            "spatial" | "spatial_histogram" | "shape_context" => {
                Ok(MatcherKind::SpatialHistogram)
            }
            other => Err(RecogError::configuration(format!(
                "unknown matcher '{}'",
                other
            ))),
        }
    }
}

/// One matcher's contribution to a ranked result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatcherScore {
    pub matcher: MatcherKind,
    pub score: f64,
    /// Raw distance, absent for fused entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

/// A candidate label with its similarity score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub label: String,
    /// Similarity in `[0, 1]`
    pub score: f64,
    /// Per-matcher diagnostic breakdown
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub breakdown: Vec<MatcherScore>,
}

impl RankedResult {
    /// Create a result without a breakdown
    pub fn new<S: Into<String>>(label: S, score: f64) -> Self {
        RankedResult {
            label: label.into(),
            score,
            breakdown: Vec::new(),
        }
    }

    /// Convert to JSON for output
    pub fn to_json(&self) -> RecogResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Read-only view of a matcher's configuration for observability
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatcherDiagnostics {
    pub matcher: MatcherKind,
    pub template_count: usize,
    pub parameters: BTreeMap<&'static str, f64>,
}

/// A shape similarity metric over stroke sets
pub trait GlyphMatcher: Send + Sync + fmt::Debug {
    /// Precomputed representation of one stroke set
    type Features: Send + Sync + fmt::Debug;

    fn kind(&self) -> MatcherKind;

    /// Normalize and featurize a stroke set
    fn extract(&self, strokes: &[Stroke]) -> Self::Features;

    /// Cached features of a template, computed at load time
    fn template_features<'a>(&self, template: &'a Template) -> &'a Self::Features;

    /// Non-negative distance, possibly `+inf`
    fn distance(&self, input: &Self::Features, reference: &Self::Features) -> f64;

    /// Monotonically decreasing map of a distance into `[0, 1]`
    fn score(&self, distance: f64) -> f64;

    /// Named numeric parameters, for diagnostics
    fn parameters(&self) -> BTreeMap<&'static str, f64>;
}

/// `1 / (1 + d)`, with NaN treated as no similarity
pub fn reciprocal_score(distance: f64) -> f64 {
    if distance.is_nan() {
        return 0.0;
    }
    (1.0 / (1.0 + distance.max(0.0))).clamp(0.0, 1.0)
}

/// `exp(-decay * d)`, with NaN treated as no similarity
pub fn exponential_score(distance: f64, decay: f64) -> f64 {
    if distance.is_nan() {
        return 0.0;
    }
    (-decay * distance.max(0.0)).exp().clamp(0.0, 1.0)
}

/// Stable descending sort by score; equal scores keep their current order
pub fn sort_by_score(results: &mut [RankedResult]) {
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

/// Score every template against `input` and keep the best `limit`.
///
/// Templates are visited in load order and the sort is stable, so equal
/// scores rank by load order. The ticket is checked between templates.
pub fn rank_templates<'a, M, I>(
    matcher: &M,
    templates: I,
    input: &[Stroke],
    limit: usize,
    ticket: &QueryTicket,
) -> RecogResult<Vec<RankedResult>>
where
    M: GlyphMatcher,
    I: IntoIterator<Item = &'a Template>,
{
    let features = matcher.extract(input);
    let mut results = Vec::new();

    for template in templates {
        if ticket.is_superseded() {
            return Err(RecogError::Superseded);
        }
        let distance = matcher.distance(&features, matcher.template_features(template));
        let score = matcher.score(distance);
        results.push(RankedResult {
            label: template.label().to_string(),
            score,
            breakdown: vec![MatcherScore {
                matcher: matcher.kind(),
                score,
                distance: Some(distance),
            }],
        });
    }

    sort_by_score(&mut results);
    results.truncate(limit);
    Ok(results)
}

/// One configured instance of every matcher
#[derive(Debug, Clone)]
pub struct MatcherSet {
    pub alignment: AlignmentMatcher,
    pub angular: AngularMatcher,
    pub spatial: ShapeContextMatcher,
}

impl MatcherSet {
    /// Build all matchers from a configuration
    pub fn new(config: &RecognizerConfig) -> Self {
        MatcherSet {
            alignment: AlignmentMatcher::new(config.alignment.clone()),
            angular: AngularMatcher::new(config.angular.clone()),
            spatial: ShapeContextMatcher::new(config.spatial.clone()),
        }
    }

    /// Rank templates with the matcher named by `kind`
    pub fn rank<'a, I>(
        &self,
        kind: MatcherKind,
        templates: I,
        input: &[Stroke],
        limit: usize,
        ticket: &QueryTicket,
    ) -> RecogResult<Vec<RankedResult>>
    where
        I: IntoIterator<Item = &'a Template>,
    {
        match kind {
            MatcherKind::Alignment => {
                rank_templates(&self.alignment, templates, input, limit, ticket)
            }
            MatcherKind::Angular => rank_templates(&self.angular, templates, input, limit, ticket),
            MatcherKind::SpatialHistogram => {
                rank_templates(&self.spatial, templates, input, limit, ticket)
            }
        }
    }

    /// Raw distance between two stroke sets under one matcher
    pub fn distance(&self, kind: MatcherKind, a: &[Stroke], b: &[Stroke]) -> f64 {
        match kind {
            MatcherKind::Alignment => pair_distance(&self.alignment, a, b),
            MatcherKind::Angular => pair_distance(&self.angular, a, b),
            MatcherKind::SpatialHistogram => pair_distance(&self.spatial, a, b),
        }
    }

    /// Parameters of one matcher plus the number of templates it scans
    pub fn diagnostics(&self, kind: MatcherKind, template_count: usize) -> MatcherDiagnostics {
        let parameters = match kind {
            MatcherKind::Alignment => self.alignment.parameters(),
            MatcherKind::Angular => self.angular.parameters(),
            MatcherKind::SpatialHistogram => self.spatial.parameters(),
        };
        MatcherDiagnostics {
            matcher: kind,
            template_count,
            parameters,
        }
    }
}

fn pair_distance<M: GlyphMatcher>(matcher: &M, a: &[Stroke], b: &[Stroke]) -> f64 {
    matcher.distance(&matcher.extract(a), &matcher.extract(b))
}
