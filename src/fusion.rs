//! Rank fusion of several matchers' ranked lists
//!
//! Each list entry contributes `weight × (1 − position/length) × score` to its
//! label. A label only has to appear in one list to be considered; missing
//! from a list simply contributes nothing.

use crate::matcher::{sort_by_score, MatcherKind, MatcherScore, RankedResult};
use std::collections::HashMap;

/// A matcher's ranked list together with its fusion weight
#[derive(Debug, Clone)]
pub struct WeightedRanking {
    pub matcher: MatcherKind,
    pub weight: f64,
    pub results: Vec<RankedResult>,
}

impl WeightedRanking {
    pub fn new(matcher: MatcherKind, weight: f64, results: Vec<RankedResult>) -> Self {
        WeightedRanking {
            matcher,
            weight,
            results,
        }
    }
}

#[derive(Debug)]
struct Accumulator {
    label: String,
    raw: Vec<f64>,
    weighted: f64,
}

/// Merge rankings by label and keep the best `top_k`.
///
/// Ties keep accumulator insertion order: labels from the first ranking in
/// its order, then labels first seen in later rankings.
pub fn fuse(rankings: &[WeightedRanking], top_k: usize) -> Vec<RankedResult> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut acc: Vec<Accumulator> = Vec::new();

    for (m, ranking) in rankings.iter().enumerate() {
        let len = ranking.results.len() as f64;
        for (pos, entry) in ranking.results.iter().enumerate() {
            let slot = *index.entry(entry.label.as_str()).or_insert_with(|| {
                acc.push(Accumulator {
                    label: entry.label.clone(),
                    raw: vec![0.0; rankings.len()],
                    weighted: 0.0,
                });
                acc.len() - 1
            });
            let rank_weight = ranking.weight * (1.0 - pos as f64 / len);
            acc[slot].raw[m] = entry.score;
            acc[slot].weighted += rank_weight * entry.score;
        }
    }

    let mut fused: Vec<RankedResult> = acc
        .into_iter()
        .map(|a| RankedResult {
            label: a.label,
            score: a.weighted.clamp(0.0, 1.0),
            breakdown: rankings
                .iter()
                .zip(a.raw)
                .map(|(r, score)| MatcherScore {
                    matcher: r.matcher,
                    score,
                    distance: None,
                })
                .collect(),
        })
        .collect();

    sort_by_score(&mut fused);
    fused.truncate(top_k);
    fused
}
