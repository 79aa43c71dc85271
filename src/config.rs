//! Tunable parameters for every matcher and the rank-fusion combiner
//!
//! Every field has a default, so a partial JSON document only needs to name
//! what it overrides.

use crate::error::{RecogError, RecogResult};
use crate::matcher::MatcherKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Elastic alignment parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Points per stroke after resampling
    pub resample_points: usize,
    /// Moving-average window applied after resampling
    pub smoothing_window: usize,
    /// Added to the distance per unmatched stroke
    pub stroke_penalty: f64,
    /// Decay rate of `exp(-decay * distance)`
    pub score_decay: f64,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            resample_points: 32,
            smoothing_window: 3,
            stroke_penalty: 0.5,
            score_decay: 2.0,
        }
    }
}

/// Angular-feature parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AngularConfig {
    /// Points shared across all strokes of a glyph
    pub total_points: usize,
    /// Direction quantization used for diagnostics
    pub direction_bins: usize,
    pub angle_weight: f64,
    pub magnitude_weight: f64,
    /// Added to the distance per unmatched stroke
    pub stroke_penalty: f64,
}

impl Default for AngularConfig {
    fn default() -> Self {
        Self {
            total_points: 64,
            direction_bins: 8,
            angle_weight: 0.7,
            magnitude_weight: 0.3,
            stroke_penalty: 0.3,
        }
    }
}

/// Log-polar histogram parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    /// Points shared across all strokes of a glyph
    pub total_points: usize,
    pub distance_bins: usize,
    pub angle_bins: usize,
    /// Innermost radius, relative to the median pairwise distance
    pub inner_radius: f64,
    /// Outermost radius, relative to the median pairwise distance
    pub outer_radius: f64,
    /// Added inside the log so coincident points stay finite
    pub epsilon: f64,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            total_points: 48,
            distance_bins: 5,
            angle_bins: 12,
            inner_radius: 0.125,
            outer_radius: 2.0,
            epsilon: 1e-6,
        }
    }
}

/// One matcher's share of a fused ranking
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeight {
    pub matcher: MatcherKind,
    pub weight: f64,
}

/// Rank-fusion parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Matchers run by the combiner, in processing order
    pub matchers: Vec<FusionWeight>,
    /// Each matcher is asked for `candidate_factor * top_k` entries
    pub candidate_factor: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            matchers: vec![
                FusionWeight {
                    matcher: MatcherKind::Alignment,
                    weight: 0.4,
                },
                FusionWeight {
                    matcher: MatcherKind::Angular,
                    weight: 0.4,
                },
                FusionWeight {
                    matcher: MatcherKind::SpatialHistogram,
                    weight: 0.2,
                },
            ],
            candidate_factor: 2,
        }
    }
}

/// Complete recognizer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    pub alignment: AlignmentConfig,
    pub angular: AngularConfig,
    pub spatial: SpatialConfig,
    pub fusion: FusionConfig,
}

impl RecognizerConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> RecogResult<Self> {
        let config: RecognizerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> RecogResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check every parameter for values the matchers cannot work with
    pub fn validate(&self) -> RecogResult<()> {
        if self.alignment.resample_points < 2 {
            return Err(RecogError::configuration(
                "alignment.resample_points must be at least 2",
            ));
        }
        check_non_negative("alignment.stroke_penalty", self.alignment.stroke_penalty)?;
        check_positive("alignment.score_decay", self.alignment.score_decay)?;

        if self.angular.total_points < 2 {
            return Err(RecogError::configuration(
                "angular.total_points must be at least 2",
            ));
        }
        if self.angular.direction_bins == 0 {
            return Err(RecogError::configuration(
                "angular.direction_bins must be positive",
            ));
        }
        check_non_negative("angular.angle_weight", self.angular.angle_weight)?;
        check_non_negative("angular.magnitude_weight", self.angular.magnitude_weight)?;
        check_non_negative("angular.stroke_penalty", self.angular.stroke_penalty)?;

        if self.spatial.total_points == 0 {
            return Err(RecogError::configuration(
                "spatial.total_points must be positive",
            ));
        }
        if self.spatial.distance_bins == 0 || self.spatial.angle_bins == 0 {
            return Err(RecogError::configuration(
                "spatial histogram bin counts must be positive",
            ));
        }
        check_positive("spatial.inner_radius", self.spatial.inner_radius)?;
        if self.spatial.outer_radius <= self.spatial.inner_radius {
            return Err(RecogError::configuration(
                "spatial.outer_radius must exceed spatial.inner_radius",
            ));
        }
        check_positive("spatial.epsilon", self.spatial.epsilon)?;

        if self.fusion.matchers.is_empty() {
            return Err(RecogError::configuration(
                "fusion.matchers must name at least one matcher",
            ));
        }
        for entry in &self.fusion.matchers {
            check_positive(&format!("fusion weight for {}", entry.matcher), entry.weight)?;
        }
        if self.fusion.candidate_factor == 0 {
            return Err(RecogError::configuration(
                "fusion.candidate_factor must be positive",
            ));
        }
        Ok(())
    }
}

fn check_positive(name: &str, value: f64) -> RecogResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(RecogError::configuration(format!(
            "{} must be positive, got {}",
            name, value
        )))
    }
}

fn check_non_negative(name: &str, value: f64) -> RecogResult<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(RecogError::configuration(format!(
            "{} must be non-negative, got {}",
            name, value
        )))
    }
}
