//! Recognition facade
//!
//! [`Recognizer`] owns the configuration and the template store, checks
//! readiness, dispatches a query to one matcher or to rank fusion, then sorts,
//! truncates and rounds the answer.

use crate::config::{FusionWeight, RecognizerConfig};
use crate::error::{RecogError, RecogResult};
use crate::fusion::{fuse, WeightedRanking};
use crate::glyph::{is_blank, GlyphRecord, Stroke};
use crate::loader::{load_library_from_file, parse_library};
use crate::matcher::{sort_by_score, MatcherDiagnostics, MatcherKind, MatcherSet, RankedResult};
use crate::session::QueryTicket;
use crate::store::{StoreState, Template, TemplateSet, TemplateStore};
use serde::Serialize;
use std::collections::HashSet;
use std::future::Future;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Which matcher (or combination) answers a query
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MatcherSelector {
    /// One matcher on its own
    Single(MatcherKind),
    /// Rank fusion with the configured weights
    #[default]
    Fused,
    /// Rank fusion with explicit weights, in processing order
    FusedWith(Vec<FusionWeight>),
}

impl FromStr for MatcherSelector {
    type Err = RecogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "combined" | "fused" | "fusion" => Ok(MatcherSelector::Fused),
            other => other.parse().map(MatcherSelector::Single),
        }
    }
}

/// Snapshot of the recognizer for observability
#[derive(Debug, Clone, Serialize)]
pub struct RecognizerDiagnostics {
    pub state: StoreState,
    pub template_count: usize,
    pub matchers: Vec<MatcherDiagnostics>,
    pub fusion: Vec<FusionWeight>,
}

/// Glyph recognizer over a single-flight loaded template library
#[derive(Debug)]
pub struct Recognizer {
    config: RecognizerConfig,
    matchers: MatcherSet,
    store: TemplateStore,
}

impl Recognizer {
    /// Create a recognizer with an empty store
    pub fn new(config: RecognizerConfig) -> Self {
        Recognizer {
            matchers: MatcherSet::new(&config),
            config,
            store: TemplateStore::new(),
        }
    }

    /// Create a recognizer after validating its configuration
    pub fn try_new(config: RecognizerConfig) -> RecogResult<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    pub fn state(&self) -> StoreState {
        self.store.state()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == StoreState::Ready
    }

    /// The loaded templates, or `NotLoaded`
    pub fn templates(&self) -> RecogResult<Arc<TemplateSet>> {
        self.store.get()
    }

    /// Load from an async record source; concurrent callers share one load
    pub async fn load_with<F, Fut>(&self, fetch: F) -> RecogResult<usize>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RecogResult<Vec<GlyphRecord>>>,
    {
        let set = self.store.load(self.matchers.clone(), fetch).await?;
        Ok(set.len())
    }

    /// Load already-parsed records.
    ///
    /// The blocking loaders park the calling thread until the load settles.
    /// From async code use [`Recognizer::load_with`], or call them inside
    /// `spawn_blocking`.
    pub fn load_records(&self, records: Vec<GlyphRecord>) -> RecogResult<usize> {
        let set = self.store.load_blocking(self.matchers.clone(), || Ok(records))?;
        Ok(set.len())
    }

    /// Load a JSON library document (blocking)
    pub fn load_json(&self, json: &str) -> RecogResult<usize> {
        let set = self
            .store
            .load_blocking(self.matchers.clone(), || parse_library(json))?;
        Ok(set.len())
    }

    /// Load a JSON library file (blocking)
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> RecogResult<usize> {
        let set = self
            .store
            .load_blocking(self.matchers.clone(), || load_library_from_file(path))?;
        Ok(set.len())
    }

    /// Load a JSON library file without blocking the runtime
    #[cfg(feature = "async")]
    pub async fn load_from_file_async<P: AsRef<Path>>(&self, path: P) -> RecogResult<usize> {
        let path = path.as_ref().to_path_buf();
        self.load_with(|| crate::async_loader::load_library_from_file_async(path))
            .await
    }

    /// Rank all templates against `input`
    pub fn recognize(
        &self,
        input: &[Stroke],
        top_k: usize,
        selector: &MatcherSelector,
    ) -> RecogResult<Vec<RankedResult>> {
        self.recognize_with_ticket(input, None, top_k, selector, &QueryTicket::detached())
    }

    /// Rank only templates whose label is in `allowed_labels`
    pub fn recognize_in_set<S: AsRef<str>>(
        &self,
        input: &[Stroke],
        allowed_labels: &[S],
        top_k: usize,
        selector: &MatcherSelector,
    ) -> RecogResult<Vec<RankedResult>> {
        let allowed: HashSet<&str> = allowed_labels.iter().map(AsRef::as_ref).collect();
        self.recognize_with_ticket(
            input,
            Some(&allowed),
            top_k,
            selector,
            &QueryTicket::detached(),
        )
    }

    pub(crate) fn recognize_with_ticket(
        &self,
        input: &[Stroke],
        allowed: Option<&HashSet<&str>>,
        top_k: usize,
        selector: &MatcherSelector,
        ticket: &QueryTicket,
    ) -> RecogResult<Vec<RankedResult>> {
        let set = self.store.get()?;
        if is_blank(input) || top_k == 0 {
            return Ok(Vec::new());
        }

        let candidates: Vec<&Template> = set
            .iter()
            .filter(|t| allowed.map_or(true, |a| a.contains(t.label())))
            .collect();
        if candidates.is_empty() {
            debug!(top_k, "no_candidate_templates");
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let matchers = set.matchers();
        let mut results = match selector {
            MatcherSelector::Single(kind) => {
                matchers.rank(*kind, candidates.iter().copied(), input, top_k, ticket)?
            }
            MatcherSelector::Fused => {
                self.fused(matchers, &self.config.fusion.matchers, &candidates, input, top_k, ticket)?
            }
            MatcherSelector::FusedWith(weights) => {
                self.fused(matchers, weights, &candidates, input, top_k, ticket)?
            }
        };

        sort_by_score(&mut results);
        results.truncate(top_k);
        for result in &mut results {
            result.score = round_score(result.score);
        }

        debug!(
            selector = ?selector,
            candidates = candidates.len(),
            top_k,
            returned = results.len(),
            elapsed_micros = start.elapsed().as_micros(),
            "recognize"
        );
        Ok(results)
    }

    fn fused(
        &self,
        matchers: &MatcherSet,
        weights: &[FusionWeight],
        candidates: &[&Template],
        input: &[Stroke],
        top_k: usize,
        ticket: &QueryTicket,
    ) -> RecogResult<Vec<RankedResult>> {
        let limit = top_k.saturating_mul(self.config.fusion.candidate_factor.max(1));
        let rankings = weights
            .iter()
            .map(|w| {
                let results =
                    matchers.rank(w.matcher, candidates.iter().copied(), input, limit, ticket)?;
                Ok(WeightedRanking::new(w.matcher, w.weight, results))
            })
            .collect::<RecogResult<Vec<_>>>()?;
        Ok(fuse(&rankings, top_k))
    }

    /// Store state, template count and matcher parameters
    pub fn diagnostics(&self) -> RecognizerDiagnostics {
        let template_count = self.store.get().map(|s| s.len()).unwrap_or(0);
        RecognizerDiagnostics {
            state: self.state(),
            template_count,
            matchers: MatcherKind::ALL
                .iter()
                .map(|&kind| self.matchers.diagnostics(kind, template_count))
                .collect(),
            fusion: self.config.fusion.matchers.clone(),
        }
    }
}

impl Default for Recognizer {
    fn default() -> Self {
        Self::new(RecognizerConfig::default())
    }
}

/// Round to three decimal places
pub fn round_score(score: f64) -> f64 {
    (score * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::stroke_from_pairs;

    fn library() -> Vec<GlyphRecord> {
        vec![
            GlyphRecord::new("-", vec![stroke_from_pairs(&[(0.0, 50.0), (100.0, 50.0)])]),
            GlyphRecord::new("|", vec![stroke_from_pairs(&[(50.0, 0.0), (50.0, 100.0)])]),
            GlyphRecord::new(
                "+",
                vec![
                    stroke_from_pairs(&[(0.0, 50.0), (100.0, 50.0)]),
                    stroke_from_pairs(&[(50.0, 0.0), (50.0, 100.0)]),
                ],
            ),
        ]
    }

    fn ready() -> Recognizer {
        let r = Recognizer::default();
        assert_eq!(r.load_records(library()).unwrap(), 3);
        r
    }

    #[test]
    fn test_not_loaded() {
        let r = Recognizer::default();
        let input = vec![stroke_from_pairs(&[(0.0, 0.0), (1.0, 0.0)])];
        assert!(matches!(
            r.recognize(&input, 3, &MatcherSelector::Fused),
            Err(RecogError::NotLoaded)
        ));
        assert!(matches!(
            r.recognize(&[], 3, &MatcherSelector::Fused),
            Err(RecogError::NotLoaded)
        ));
    }

    #[test]
    fn test_empty_input_and_zero_top_k() {
        let r = ready();
        assert!(r.recognize(&[], 3, &MatcherSelector::Fused).unwrap().is_empty());
        assert!(r
            .recognize(&[Vec::new()], 3, &MatcherSelector::Fused)
            .unwrap()
            .is_empty());
        let input = library()[0].strokes.clone();
        assert!(r.recognize(&input, 0, &MatcherSelector::Fused).unwrap().is_empty());
    }

    #[test]
    fn test_every_selector_finds_the_template() {
        let r = ready();
        let input = library()[2].strokes.clone();
        for selector in [
            MatcherSelector::Single(MatcherKind::Alignment),
            MatcherSelector::Single(MatcherKind::Angular),
            MatcherSelector::Single(MatcherKind::SpatialHistogram),
            MatcherSelector::Fused,
        ] {
            let results = r.recognize(&input, 3, &selector).unwrap();
            assert_eq!(results[0].label, "+", "selector {:?}", selector);
            assert!(results.len() <= 3);
            for w in results.windows(2) {
                assert!(w[0].score >= w[1].score);
            }
        }
    }

    #[test]
    fn test_scores_are_rounded() {
        let r = ready();
        let input = vec![stroke_from_pairs(&[(0.0, 40.0), (100.0, 60.0)])];
        for result in r.recognize(&input, 3, &MatcherSelector::Fused).unwrap() {
            assert_eq!(result.score, round_score(result.score));
            assert!((0.0..=1.0).contains(&result.score));
        }
    }

    #[test]
    fn test_recognize_in_set() {
        let r = ready();
        let input = library()[2].strokes.clone();
        let selector = MatcherSelector::Single(MatcherKind::Alignment);

        let results = r.recognize_in_set(&input, &["-", "|"], 5, &selector).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|res| res.label != "+"));

        assert!(r
            .recognize_in_set(&input, &["?"], 5, &selector)
            .unwrap()
            .is_empty());
        let none: [&str; 0] = [];
        assert!(r.recognize_in_set(&input, &none, 5, &selector).unwrap().is_empty());
    }

    #[test]
    fn test_custom_fusion_weights() {
        let r = ready();
        let input = library()[1].strokes.clone();
        let selector = MatcherSelector::FusedWith(vec![FusionWeight {
            matcher: MatcherKind::Alignment,
            weight: 1.0,
        }]);
        let results = r.recognize(&input, 1, &selector).unwrap();
        assert_eq!(results[0].label, "|");
        assert_eq!(results[0].score, 1.0);
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!("combined".parse::<MatcherSelector>().unwrap(), MatcherSelector::Fused);
        assert_eq!(
            "angular".parse::<MatcherSelector>().unwrap(),
            MatcherSelector::Single(MatcherKind::Angular)
        );
        assert!("bogus".parse::<MatcherSelector>().is_err());
    }

    #[test]
    fn test_diagnostics() {
        let r = Recognizer::default();
        let before = r.diagnostics();
        assert_eq!(before.state, StoreState::Empty);
        assert_eq!(before.template_count, 0);

        let r = ready();
        let after = r.diagnostics();
        assert_eq!(after.state, StoreState::Ready);
        assert_eq!(after.template_count, 3);
        assert_eq!(after.matchers.len(), 3);
        assert_eq!(after.matchers[0].parameters["resample_points"], 32.0);
        assert_eq!(after.matchers[2].parameters["angle_bins"], 12.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = RecognizerConfig::default();
        config.alignment.resample_points = 1;
        assert!(matches!(
            Recognizer::try_new(config),
            Err(RecogError::Configuration { .. })
        ));
    }
}
