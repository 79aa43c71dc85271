//! Stroke geometry shared by every matcher
//!
//! All functions here are pure: the same input always yields the same output,
//! and degenerate input (empty strokes, zero path length, coincident points)
//! falls back to identity scaling or repeated points instead of dividing by
//! zero.

use crate::glyph::{Point, Stroke};

/// How [`normalize_centroid`] picks its scale factor
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleMode {
    /// Scale so the farthest point sits at radius 0.5
    MaxRadius,
    /// Scale so the mean distance from the centroid is 1
    MeanRadius,
}

/// Axis-aligned bounds of a point set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: &Point, b: &Point) -> f64 {
    a.distance_to(b)
}

/// Total polyline length of a stroke
pub fn path_length(stroke: &[Point]) -> f64 {
    stroke.windows(2).map(|w| distance(&w[0], &w[1])).sum()
}

/// Bounds over all points of all strokes, `None` when there are no points
pub fn bounding_box(strokes: &[Stroke]) -> Option<BoundingBox> {
    let mut points = strokes.iter().flatten();
    let first = *points.next()?;
    let mut bb = BoundingBox {
        min: first,
        max: first,
    };
    for p in points {
        bb.min.x = bb.min.x.min(p.x);
        bb.min.y = bb.min.y.min(p.y);
        bb.max.x = bb.max.x.max(p.x);
        bb.max.y = bb.max.y.max(p.y);
    }
    Some(bb)
}

/// Mean of all points of all strokes, `None` when there are no points
pub fn centroid(strokes: &[Stroke]) -> Option<Point> {
    let mut n = 0usize;
    let (mut sx, mut sy) = (0.0, 0.0);
    for p in strokes.iter().flatten() {
        sx += p.x;
        sy += p.y;
        n += 1;
    }
    if n == 0 {
        return None;
    }
    Some(Point::new(sx / n as f64, sy / n as f64))
}

/// Resample a stroke to exactly `n` points evenly spaced along its arc length.
///
/// Strokes with fewer than two points come back unchanged. A stroke whose
/// total length is zero yields its last point repeated `n` times.
pub fn resample(stroke: &[Point], n: usize) -> Stroke {
    if stroke.len() <= 1 {
        return stroke.to_vec();
    }
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![stroke[0]];
    }

    let total = path_length(stroke);
    let last = stroke[stroke.len() - 1];
    if total <= 0.0 || !total.is_finite() {
        return vec![last; n];
    }

    // Cumulative arc length at each original vertex
    let mut cumulative = Vec::with_capacity(stroke.len());
    let mut acc = 0.0;
    cumulative.push(0.0);
    for w in stroke.windows(2) {
        acc += distance(&w[0], &w[1]);
        cumulative.push(acc);
    }

    let step = total / (n - 1) as f64;
    let mut out = Vec::with_capacity(n);
    let mut seg = 0usize;
    for k in 0..n - 1 {
        let target = step * k as f64;
        while seg + 2 < stroke.len() && cumulative[seg + 1] < target {
            seg += 1;
        }
        let seg_len = cumulative[seg + 1] - cumulative[seg];
        let (a, b) = (stroke[seg], stroke[seg + 1]);
        if seg_len <= 0.0 {
            out.push(a);
            continue;
        }
        let t = ((target - cumulative[seg]) / seg_len).clamp(0.0, 1.0);
        out.push(Point::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y)));
    }
    out.push(last);
    out
}

/// Symmetric moving average; each point averages the neighbours within
/// `window / 2` positions, with the window clamped at both ends.
pub fn smooth(stroke: &[Point], window: usize) -> Stroke {
    let half = window / 2;
    if stroke.len() <= window || half == 0 {
        return stroke.to_vec();
    }
    let last = stroke.len() - 1;
    (0..stroke.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(last);
            let count = (hi - lo + 1) as f64;
            let (sx, sy) = stroke[lo..=hi]
                .iter()
                .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
            Point::new(sx / count, sy / count)
        })
        .collect()
}

/// Translate to the global minimum and divide by `max(width, height)`.
pub fn normalize_bounding_box(strokes: &[Stroke]) -> Vec<Stroke> {
    let Some(bb) = bounding_box(strokes) else {
        return strokes.to_vec();
    };
    let mut scale = bb.width().max(bb.height());
    if scale <= 0.0 || !scale.is_finite() {
        scale = 1.0;
    }
    transform(strokes, |p| {
        Point::new((p.x - bb.min.x) / scale, (p.y - bb.min.y) / scale)
    })
}

/// Translate the centroid to the origin and rescale according to `mode`.
pub fn normalize_centroid(strokes: &[Stroke], mode: ScaleMode) -> Vec<Stroke> {
    let Some(c) = centroid(strokes) else {
        return strokes.to_vec();
    };
    let radii = strokes.iter().flatten().map(|p| distance(p, &c));
    let factor = match mode {
        ScaleMode::MaxRadius => {
            let max = radii.fold(0.0_f64, f64::max);
            safe_ratio(0.5, max)
        }
        ScaleMode::MeanRadius => {
            let n = crate::glyph::point_count(strokes) as f64;
            let mean = radii.sum::<f64>() / n;
            safe_ratio(1.0, mean)
        }
    };
    transform(strokes, |p| {
        Point::new((p.x - c.x) * factor, (p.y - c.y) * factor)
    })
}

/// Which strokes [`allocate_points`] lifts to the per-stroke minimum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinimumFor {
    /// Every stroke that has at least one point
    AnyPoints,
    /// Only strokes with positive arc length; dots keep their rounded share
    PositiveLength,
}

/// Split a point budget across strokes in proportion to their arc length.
///
/// Strokes selected by `floor` get at least `minimum`; empty strokes get
/// nothing. When the whole set has zero length the budget is split evenly.
pub fn allocate_points(
    strokes: &[Stroke],
    total: usize,
    minimum: usize,
    floor: MinimumFor,
) -> Vec<usize> {
    let lengths: Vec<f64> = strokes.iter().map(|s| path_length(s)).collect();
    let sum: f64 = lengths.iter().sum();
    let live = strokes.iter().filter(|s| !s.is_empty()).count();

    strokes
        .iter()
        .zip(&lengths)
        .map(|(stroke, &len)| {
            if stroke.is_empty() {
                return 0;
            }
            let share = if sum > 0.0 && sum.is_finite() {
                (total as f64 * len / sum).round() as usize
            } else {
                total / live.max(1)
            };
            match floor {
                MinimumFor::AnyPoints => share.max(minimum),
                MinimumFor::PositiveLength if len > 0.0 => share.max(minimum),
                MinimumFor::PositiveLength => share,
            }
        })
        .collect()
}

fn safe_ratio(numerator: f64, divisor: f64) -> f64 {
    if divisor > 0.0 && divisor.is_finite() {
        numerator / divisor
    } else {
        1.0
    }
}

fn transform(strokes: &[Stroke], f: impl Fn(&Point) -> Point) -> Vec<Stroke> {
    strokes
        .iter()
        .map(|s| s.iter().map(&f).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::stroke_from_pairs;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() <= tol, "{} vs {} (tol {})", a, b, tol);
    }

    #[test]
    fn test_resample_exact_count_and_length() {
        let line = stroke_from_pairs(&[(0.0, 0.0), (10.0, 0.0)]);
        let out = resample(&line, 11);
        assert_eq!(out.len(), 11);
        for (i, p) in out.iter().enumerate() {
            assert_close(p.x, i as f64, 1e-9);
            assert_close(p.y, 0.0, 1e-9);
        }
        assert_close(path_length(&out), 10.0, 1e-9);

        let ell = stroke_from_pairs(&[(0.0, 0.0), (0.0, 5.0), (3.0, 5.0), (7.0, 5.0)]);
        for n in [2, 7, 32, 64, 100] {
            let out = resample(&ell, n);
            assert_eq!(out.len(), n);
            assert_eq!(out[0], ell[0]);
            assert_eq!(out[n - 1], ell[3]);
        }
        let fine = resample(&ell, 64);
        assert_close(path_length(&fine), path_length(&ell), 0.05 * path_length(&ell));
    }

    #[test]
    fn test_resample_degenerate_inputs() {
        assert!(resample(&[], 10).is_empty());
        let single = stroke_from_pairs(&[(3.0, 4.0)]);
        assert_eq!(resample(&single, 10), single);

        let dot = stroke_from_pairs(&[(1.0, 1.0), (1.0, 1.0), (2.0, 2.0), (2.0, 2.0)]);
        let out = resample(&dot, 5);
        assert_eq!(out.len(), 5);

        let still = stroke_from_pairs(&[(1.0, 1.0), (1.0, 1.0), (1.0, 1.0)]);
        let out = resample(&still, 4);
        assert_eq!(out, vec![Point::new(1.0, 1.0); 4]);
    }

    #[test]
    fn test_smooth_window() {
        let zigzag = stroke_from_pairs(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0), (3.0, 1.0), (4.0, 0.0)]);
        let out = smooth(&zigzag, 3);
        assert_eq!(out.len(), zigzag.len());
        // Ends average only two points
        assert_close(out[0].x, 0.5, 1e-12);
        assert_close(out[0].y, 0.5, 1e-12);
        assert_close(out[2].x, 2.0, 1e-12);
        assert_close(out[2].y, 2.0 / 3.0, 1e-12);

        // No-op when too short
        assert_eq!(smooth(&zigzag[..3], 3), zigzag[..3].to_vec());
        assert_eq!(smooth(&zigzag, 1), zigzag);
    }

    #[test]
    fn test_normalize_bounding_box() {
        let set = vec![
            stroke_from_pairs(&[(10.0, 10.0), (30.0, 10.0)]),
            stroke_from_pairs(&[(20.0, 15.0)]),
        ];
        let out = normalize_bounding_box(&set);
        assert_eq!(out[0][0], Point::new(0.0, 0.0));
        assert_eq!(out[0][1], Point::new(1.0, 0.0));
        assert_eq!(out[1][0], Point::new(0.5, 0.25));

        // Zero extent keeps scale at 1
        let dot = vec![stroke_from_pairs(&[(5.0, 5.0), (5.0, 5.0)])];
        let out = normalize_bounding_box(&dot);
        assert_eq!(out[0], vec![Point::new(0.0, 0.0); 2]);
    }

    #[test]
    fn test_normalize_centroid_modes() {
        let set = vec![stroke_from_pairs(&[(-2.0, 0.0), (2.0, 0.0), (0.0, 0.0)])];

        let max = normalize_centroid(&set, ScaleMode::MaxRadius);
        assert_close(max[0][0].x, -0.5, 1e-12);
        assert_close(max[0][1].x, 0.5, 1e-12);

        let mean = normalize_centroid(&set, ScaleMode::MeanRadius);
        // mean radius is 4/3
        assert_close(mean[0][1].x, 1.5, 1e-12);

        let dot = vec![stroke_from_pairs(&[(3.0, 3.0), (3.0, 3.0)])];
        let out = normalize_centroid(&dot, ScaleMode::MeanRadius);
        assert_eq!(out[0], vec![Point::new(0.0, 0.0); 2]);
    }

    #[test]
    fn test_allocate_points_proportional() {
        let set = vec![
            stroke_from_pairs(&[(0.0, 0.0), (30.0, 0.0)]),
            stroke_from_pairs(&[(0.0, 0.0), (10.0, 0.0)]),
            vec![],
            stroke_from_pairs(&[(5.0, 5.0)]),
        ];
        let shares = allocate_points(&set, 40, 1, MinimumFor::AnyPoints);
        assert_eq!(shares, vec![30, 10, 0, 1]);

        let still = vec![
            stroke_from_pairs(&[(0.0, 0.0)]),
            stroke_from_pairs(&[(1.0, 1.0)]),
        ];
        assert_eq!(allocate_points(&still, 10, 2, MinimumFor::AnyPoints), vec![5, 5]);
        assert_eq!(allocate_points(&still, 10, 2, MinimumFor::PositiveLength), vec![5, 5]);
    }

    #[test]
    fn test_allocate_points_skips_minimum_for_dots() {
        let set = vec![
            stroke_from_pairs(&[(0.0, 0.0), (40.0, 0.0)]),
            stroke_from_pairs(&[(5.0, 5.0), (5.0, 5.0)]),
            stroke_from_pairs(&[(0.0, 0.0), (0.1, 0.0)]),
        ];
        // the 0.1-unit stroke rounds to 0 but still gets the minimum
        assert_eq!(
            allocate_points(&set, 40, 1, MinimumFor::PositiveLength),
            vec![40, 0, 1]
        );
        assert_eq!(
            allocate_points(&set, 40, 1, MinimumFor::AnyPoints),
            vec![40, 1, 1]
        );
    }
}
