//! Core data structures for drawn and reference glyphs

use crate::error::{RecogError, RecogResult};
use serde::{Deserialize, Serialize};

/// A single sampled coordinate, serialized as `[x, y]`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Point { x, y }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point { x, y }
    }
}

/// Points in drawing order
pub type Stroke = Vec<Point>;

/// All strokes of one glyph instance, in drawing order
pub type StrokeSet = Vec<Stroke>;

/// Total number of points across every stroke
pub fn point_count(strokes: &[Stroke]) -> usize {
    strokes.iter().map(Vec::len).sum()
}

/// True when the set carries no points at all
pub fn is_blank(strokes: &[Stroke]) -> bool {
    point_count(strokes) == 0
}

/// One labeled reference glyph as it appears in a template library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphRecord {
    /// The character this glyph draws
    #[serde(rename = "char", alias = "label")]
    pub label: String,
    /// Reference strokes
    pub strokes: StrokeSet,
}

impl GlyphRecord {
    /// Create a new record
    pub fn new<S: Into<String>>(label: S, strokes: StrokeSet) -> Self {
        GlyphRecord {
            label: label.into(),
            strokes,
        }
    }

    /// Reject records that can never be matched
    pub fn validate(&self) -> RecogResult<()> {
        if self.label.trim().is_empty() {
            return Err(RecogError::invalid_glyph_data("glyph label must not be empty"));
        }
        if self.strokes.is_empty() {
            return Err(RecogError::invalid_glyph_data(format!(
                "glyph '{}' has no strokes",
                self.label
            )));
        }
        if let Some(p) = self
            .strokes
            .iter()
            .flatten()
            .find(|p| !p.x.is_finite() || !p.y.is_finite())
        {
            return Err(RecogError::invalid_glyph_data(format!(
                "glyph '{}' has a non-finite coordinate ({}, {})",
                self.label, p.x, p.y
            )));
        }
        Ok(())
    }

    /// Number of strokes in the reference glyph
    pub fn stroke_count(&self) -> usize {
        self.strokes.len()
    }
}

/// Build a stroke from raw `(x, y)` pairs
pub fn stroke_from_pairs(pairs: &[(f64, f64)]) -> Stroke {
    pairs.iter().copied().map(Point::from).collect()
}
