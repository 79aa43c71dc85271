//! Template store: pre-featurized reference glyphs behind a single-flight load
//!
//! A [`TemplateStore`] moves Empty → Loading → Ready and never back once Ready.
//! Concurrent `load` calls share one in-flight initialization and its outcome.
//! A failed load leaves the store Empty so recognition keeps failing with
//! `NotLoaded` until a later load succeeds.

use crate::alignment::AlignmentFeatures;
use crate::angular::AngularFeatures;
use crate::error::{RecogError, RecogResult};
use crate::glyph::{GlyphRecord, StrokeSet};
use crate::matcher::{GlyphMatcher, MatcherSet};
use crate::shape_context::SpatialFeatures;
use serde::Serialize;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::{watch, OnceCell};
use tracing::{debug, info, warn};

/// A labeled reference glyph with features cached for every matcher
#[derive(Debug)]
pub struct Template {
    label: String,
    strokes: StrokeSet,
    load_index: usize,
    pub(crate) alignment: AlignmentFeatures,
    pub(crate) angular: AngularFeatures,
    pub(crate) spatial: SpatialFeatures,
}

impl Template {
    fn build(record: GlyphRecord, load_index: usize, matchers: &MatcherSet) -> Self {
        Template {
            alignment: matchers.alignment.extract(&record.strokes),
            angular: matchers.angular.extract(&record.strokes),
            spatial: matchers.spatial.extract(&record.strokes),
            label: record.label,
            strokes: record.strokes,
            load_index,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Reference strokes exactly as loaded
    pub fn strokes(&self) -> &StrokeSet {
        &self.strokes
    }

    /// Position in the library, the final tie-breaker
    pub fn load_index(&self) -> usize {
        self.load_index
    }
}

/// Label counts by writing system
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LibraryStats {
    pub total: usize,
    pub hiragana: usize,
    pub katakana: usize,
    pub kanji: usize,
    pub other: usize,
}

/// The immutable contents of a Ready store
#[derive(Debug)]
pub struct TemplateSet {
    templates: Vec<Template>,
    matchers: MatcherSet,
}

impl TemplateSet {
    /// Validate records and precompute every matcher's features, in load order
    pub fn build(records: Vec<GlyphRecord>, matchers: MatcherSet) -> RecogResult<Self> {
        for record in &records {
            record.validate()?;
        }
        let templates = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| Template::build(record, i, &matchers))
            .collect();
        Ok(TemplateSet {
            templates,
            matchers,
        })
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    /// Matchers the cached features were computed with
    pub fn matchers(&self) -> &MatcherSet {
        &self.matchers
    }

    /// Templates in load order
    pub fn iter(&self) -> std::slice::Iter<'_, Template> {
        self.templates.iter()
    }

    /// Count labels per script block
    pub fn stats(&self) -> LibraryStats {
        let mut stats = LibraryStats::default();
        for template in &self.templates {
            stats.total += 1;
            match template.label.chars().next() {
                Some('\u{3040}'..='\u{309f}') => stats.hiragana += 1,
                Some('\u{30a0}'..='\u{30ff}') => stats.katakana += 1,
                Some('\u{4e00}'..='\u{9faf}') => stats.kanji += 1,
                _ => stats.other += 1,
            }
        }
        stats
    }
}

/// Lifecycle of a [`TemplateStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreState {
    Empty,
    Loading,
    Ready,
}

type LoadOutcome = RecogResult<Arc<TemplateSet>>;

/// The load currently in flight, if any
#[derive(Debug, Default)]
struct LoadSlot {
    generation: u64,
    pending: Option<watch::Receiver<Option<LoadOutcome>>>,
}

enum LoadRole {
    Ready(Arc<TemplateSet>),
    Lead(watch::Sender<Option<LoadOutcome>>, u64),
    Join(watch::Receiver<Option<LoadOutcome>>, u64),
}

/// Owner of the template set with a single-flight, forward-only load
#[derive(Debug, Default)]
pub struct TemplateStore {
    cell: OnceCell<Arc<TemplateSet>>,
    slot: Mutex<LoadSlot>,
}

impl TemplateStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that is already Ready
    pub fn ready(set: TemplateSet) -> Self {
        TemplateStore {
            cell: OnceCell::new_with(Some(Arc::new(set))),
            slot: Mutex::default(),
        }
    }

    pub fn state(&self) -> StoreState {
        if self.cell.initialized() {
            return StoreState::Ready;
        }
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match &slot.pending {
            // a closed sender means the loading caller was dropped mid-flight
            Some(rx) if rx.has_changed().is_ok() => StoreState::Loading,
            _ => StoreState::Empty,
        }
    }

    /// The Ready template set, or `NotLoaded`
    pub fn get(&self) -> RecogResult<Arc<TemplateSet>> {
        self.cell.get().cloned().ok_or(RecogError::NotLoaded)
    }

    /// Load the store from a record source.
    ///
    /// The first caller runs `fetch`; callers arriving while it is in flight
    /// wait for it and receive the same outcome, success or error. Once
    /// Ready, further calls return immediately without running their fetch.
    /// After a failure the store is Empty again and a later call may retry.
    pub async fn load<F, Fut>(&self, matchers: MatcherSet, fetch: F) -> RecogResult<Arc<TemplateSet>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RecogResult<Vec<GlyphRecord>>>,
    {
        loop {
            match self.join_or_lead() {
                LoadRole::Ready(set) => return Ok(set),
                LoadRole::Lead(tx, generation) => {
                    return self.lead(tx, generation, matchers, fetch).await
                }
                LoadRole::Join(mut rx, generation) => {
                    debug!(generation, "template_library_load_joined");
                    let outcome = rx.wait_for(Option::is_some).await.map(|o| (*o).clone());
                    match outcome {
                        Ok(Some(outcome)) => return outcome,
                        // the leader went away without an outcome, take over
                        _ => self.clear_pending(generation),
                    }
                }
            }
        }
    }

    /// Blocking form of [`TemplateStore::load`] sharing the same single-flight slot.
    ///
    /// This parks the calling thread until the load settles. Call it from
    /// synchronous code or `spawn_blocking`, never from inside an async task:
    /// on a current-thread runtime the in-flight load could not make progress.
    pub fn load_blocking<F>(&self, matchers: MatcherSet, fetch: F) -> RecogResult<Arc<TemplateSet>>
    where
        F: FnOnce() -> RecogResult<Vec<GlyphRecord>>,
    {
        futures::executor::block_on(self.load(matchers, || async move { fetch() }))
    }

    fn join_or_lead(&self) -> LoadRole {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(set) = self.cell.get() {
            return LoadRole::Ready(Arc::clone(set));
        }
        if let Some(rx) = &slot.pending {
            return LoadRole::Join(rx.clone(), slot.generation);
        }
        let (tx, rx) = watch::channel(None);
        slot.generation += 1;
        slot.pending = Some(rx);
        LoadRole::Lead(tx, slot.generation)
    }

    fn clear_pending(&self, generation: u64) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.generation == generation {
            slot.pending = None;
        }
    }

    async fn lead<F, Fut>(
        &self,
        tx: watch::Sender<Option<LoadOutcome>>,
        generation: u64,
        matchers: MatcherSet,
        fetch: F,
    ) -> LoadOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RecogResult<Vec<GlyphRecord>>>,
    {
        let start = Instant::now();
        let outcome = match fetch().await {
            Ok(records) => TemplateSet::build(records, matchers).map(Arc::new),
            Err(err) => Err(err),
        };

        // Ready must be visible before the slot empties
        if let Ok(set) = &outcome {
            let _ = self.cell.set(Arc::clone(set));
        }
        self.clear_pending(generation);
        let _ = tx.send(Some(outcome.clone()));

        let elapsed_micros = start.elapsed().as_micros();
        match &outcome {
            Ok(set) => info!(
                template_count = set.len(),
                elapsed_micros, "template_library_ready"
            ),
            Err(err) => warn!(error = %err, elapsed_micros, "template_library_load_failed"),
        }
        outcome
    }
}
