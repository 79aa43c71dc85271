//! Request coalescing for interactive recognition
//!
//! While a user keeps drawing, each new stroke makes the previous query
//! stale. An [`InteractiveSession`] hands out increasing tickets; issuing a
//! ticket supersedes every earlier one, and the template scan stops as soon
//! as it notices its ticket is stale.

use crate::error::{RecogError, RecogResult};
use crate::glyph::Stroke;
use crate::matcher::RankedResult;
use crate::recognizer::{MatcherSelector, Recognizer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identity of one query within a session
#[derive(Debug, Clone)]
pub struct QueryTicket {
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl QueryTicket {
    /// A ticket that can never be superseded
    pub fn detached() -> Self {
        QueryTicket {
            generation: 0,
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True once a newer ticket has been issued by the same session
    pub fn is_superseded(&self) -> bool {
        self.latest.load(Ordering::Acquire) != self.generation
    }
}

/// Coalesces overlapping recognition requests against one recognizer
#[derive(Debug, Clone)]
pub struct InteractiveSession {
    recognizer: Arc<Recognizer>,
    latest: Arc<AtomicU64>,
}

impl InteractiveSession {
    pub fn new(recognizer: Arc<Recognizer>) -> Self {
        InteractiveSession {
            recognizer,
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn recognizer(&self) -> &Arc<Recognizer> {
        &self.recognizer
    }

    /// Issue a new ticket, superseding all outstanding ones
    pub fn begin(&self) -> QueryTicket {
        let generation = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        QueryTicket {
            generation,
            latest: Arc::clone(&self.latest),
        }
    }

    /// Invalidate outstanding tickets without starting a new query
    pub fn cancel_all(&self) {
        self.latest.fetch_add(1, Ordering::AcqRel);
    }

    /// Run a query under `ticket`, failing with `Superseded` if it goes stale
    pub fn recognize(
        &self,
        ticket: &QueryTicket,
        input: &[Stroke],
        top_k: usize,
        selector: &MatcherSelector,
    ) -> RecogResult<Vec<RankedResult>> {
        if ticket.is_superseded() {
            return Err(RecogError::Superseded);
        }
        self.recognizer
            .recognize_with_ticket(input, None, top_k, selector, ticket)
    }

    /// Debounced query: wait `delay`, then run on the blocking pool unless a
    /// newer request arrived in the meantime.
    #[cfg(feature = "async")]
    pub async fn submit(
        &self,
        input: Vec<Stroke>,
        top_k: usize,
        selector: MatcherSelector,
        delay: std::time::Duration,
    ) -> RecogResult<Vec<RankedResult>> {
        let ticket = self.begin();
        tokio::time::sleep(delay).await;
        if ticket.is_superseded() {
            tracing::debug!(generation = ticket.generation(), "query_coalesced");
            return Err(RecogError::Superseded);
        }

        let session = self.clone();
        tokio::task::spawn_blocking(move || session.recognize(&ticket, &input, top_k, &selector))
            .await
            .map_err(|e| RecogError::custom(format!("Task join error: {}", e)))?
    }
}
