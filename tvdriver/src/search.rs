//! Resilient lookup of an input-capable node near an approximate selector.
//!
//! The device tree has no stable ids, so the same logical text field can show
//! up at different depths. Starting from a hint, the search tries the hint
//! itself, then walks up one ancestor at a time; after each step up it tries
//! that ancestor and then its first few children. The first focusable node that
//! accepts the text ends the search.

use crate::errors::AutomationError;
use crate::platforms::AutomationEngine;
use crate::selector::Selector;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_MAX_UP: usize = 2;
pub const DEFAULT_MAX_DOWN: usize = 3;

/// What happened when one candidate selector was tried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateOutcome {
    /// Text was accepted; the search stops here
    Delivered,
    /// Already tried during this search; the engine was not consulted
    Duplicate,
    NotFound,
    NotFocusable,
    DeliveryRejected(String),
    TransportError(String),
}

impl CandidateOutcome {
    /// Whether the engine was asked to resolve this candidate
    pub fn was_resolved(&self) -> bool {
        !matches!(self, CandidateOutcome::Duplicate)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateAttempt {
    pub selector: Selector,
    pub outcome: CandidateOutcome,
}

/// Record of one search, in the order candidates were tried.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchReport {
    pub attempts: Vec<CandidateAttempt>,
}

impl SearchReport {
    pub fn succeeded(&self) -> bool {
        self.attempts
            .last()
            .is_some_and(|a| a.outcome == CandidateOutcome::Delivered)
    }

    /// The selector that received the text, if any
    pub fn delivered_to(&self) -> Option<&Selector> {
        self.attempts
            .iter()
            .find(|a| a.outcome == CandidateOutcome::Delivered)
            .map(|a| &a.selector)
    }

    /// Number of times the engine was asked to resolve a selector
    pub fn resolutions(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.outcome.was_resolved())
            .count()
    }
}

/// Bounds for the neighborhood explored around a selector hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusableSearch {
    pub max_up: usize,
    pub max_down: usize,
}

impl Default for FocusableSearch {
    fn default() -> Self {
        Self {
            max_up: DEFAULT_MAX_UP,
            max_down: DEFAULT_MAX_DOWN,
        }
    }
}

impl FocusableSearch {
    pub fn new(max_up: usize, max_down: usize) -> Self {
        Self { max_up, max_down }
    }

    /// Upper bound on resolutions for one search: the hint, plus each
    /// ancestor and its children.
    pub fn max_attempts(&self) -> usize {
        1 + self.max_up * (1 + self.max_down)
    }

    /// Deliver `text` to the first focusable node near `base`.
    ///
    /// Returns `Ok(false)` when the neighborhood holds no node that accepts the
    /// text. Only a lost session is reported as an error.
    pub fn find_and_fill(
        &self,
        engine: &dyn AutomationEngine,
        base: &Selector,
        text: &str,
    ) -> Result<bool, AutomationError> {
        Ok(self.run(engine, base, text)?.succeeded())
    }

    /// Same as [`find_and_fill`](Self::find_and_fill) but returns every attempt.
    #[instrument(skip(self, engine, base, text), fields(base = %base, max_up = self.max_up, max_down = self.max_down))]
    pub fn run(
        &self,
        engine: &dyn AutomationEngine,
        base: &Selector,
        text: &str,
    ) -> Result<SearchReport, AutomationError> {
        let mut state = SearchState::new(engine, text);

        if state.attempt(base)? {
            return Ok(state.finish());
        }

        for level in 1..=self.max_up {
            if state.attempt(&base.derive(level, None))? {
                return Ok(state.finish());
            }

            for child in 1..=self.max_down {
                if state.attempt(&base.derive(level, Some(child)))? {
                    return Ok(state.finish());
                }
            }
        }

        warn!("Unable to find a focusable element near {} to send keys", base);
        Ok(state.finish())
    }
}

/// Per-call bookkeeping; never outlives one `run`.
struct SearchState<'a> {
    engine: &'a dyn AutomationEngine,
    text: &'a str,
    tried: HashSet<Selector>,
    report: SearchReport,
}

impl<'a> SearchState<'a> {
    fn new(engine: &'a dyn AutomationEngine, text: &'a str) -> Self {
        Self {
            engine,
            text,
            tried: HashSet::new(),
            report: SearchReport::default(),
        }
    }

    /// Try one candidate. `Ok(true)` means the text was delivered.
    fn attempt(&mut self, selector: &Selector) -> Result<bool, AutomationError> {
        let outcome = if self.tried.insert(selector.clone()) {
            self.resolve_and_deliver(selector)?
        } else {
            debug!("Skipping already tried selector: {}", selector);
            CandidateOutcome::Duplicate
        };

        let delivered = outcome == CandidateOutcome::Delivered;
        self.report.attempts.push(CandidateAttempt {
            selector: selector.clone(),
            outcome,
        });
        Ok(delivered)
    }

    fn resolve_and_deliver(
        &self,
        selector: &Selector,
    ) -> Result<CandidateOutcome, AutomationError> {
        let element = match self.engine.find_element(selector) {
            Ok(element) => element,
            Err(AutomationError::NotFound(_)) => {
                debug!("No element at selector: {}", selector);
                return Ok(CandidateOutcome::NotFound);
            }
            Err(e @ AutomationError::SessionUnavailable(_)) => return Err(e),
            Err(e) => {
                warn!("Lookup failed for selector {}: {}", selector, e);
                return Ok(CandidateOutcome::TransportError(e.to_string()));
            }
        };

        debug!("Trying element at selector: {}", selector);
        match element.fill(self.text) {
            Ok(()) => {
                info!("Sent text to element at selector: {}", selector);
                Ok(CandidateOutcome::Delivered)
            }
            Err(AutomationError::NotFocusable(_)) => {
                info!("Skipped non-focusable element at selector: {}", selector);
                Ok(CandidateOutcome::NotFocusable)
            }
            Err(e @ AutomationError::SessionUnavailable(_)) => Err(e),
            Err(AutomationError::Transport(msg)) => {
                warn!("Transport failure sending keys to {}: {}", selector, msg);
                Ok(CandidateOutcome::TransportError(msg))
            }
            Err(e) => {
                warn!("Failed to send keys to {}: {}", selector, e);
                Ok(CandidateOutcome::DeliveryRejected(e.to_string()))
            }
        }
    }

    fn finish(self) -> SearchReport {
        self.report
    }
}
