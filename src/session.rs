//! Timed quiz over the unseen words of a [`WordStore`].
//!
//! A round snapshots the ids of all unseen words, shuffles them and walks a
//! cursor through the queue while a one-second countdown runs. The round ends
//! on timeout, when the cursor runs off the end of the queue, or when the
//! player dismisses it. Only a correct answer writes to the store.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::runtime::Ticker;
use crate::store::WordStore;
use crate::word::WordId;

/// Countdown granularity
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum EndReason {
    /// No unseen words when the round started
    Empty,
    Timeout,
    /// Every queued word was answered or skipped
    Exhausted,
    Dismissed,
}

/// Reported to the caller when a round ends. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSummary {
    pub score: u32,
    pub reason: EndReason,
    pub queued: usize,
}

/// Outcome of feeding one event to the quiz
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// No round was running; nothing changed
    Inactive,
    Continue,
    Ended(RoundSummary),
}

impl Transition {
    pub fn ended(&self) -> Option<RoundSummary> {
        match self {
            Transition::Ended(summary) => Some(*summary),
            _ => None,
        }
    }
}

/// State of the running round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub queue: Vec<WordId>,
    pub cursor: usize,
    pub score: u32,
    pub remaining: u32,
}

/// Quiz session controller
pub struct Quiz<S: WordStore, T: Ticker> {
    store: S,
    ticker: T,
    rng: StdRng,
    state: Option<SessionState>,
    current_text: String,
    read_error: Option<StoreError>,
    last_round: Option<RoundSummary>,
}

impl<S: WordStore, T: Ticker> Quiz<S, T> {
    pub fn new(store: S, ticker: T) -> Self {
        Self::with_rng(store, ticker, StdRng::from_entropy())
    }

    /// Deterministic shuffles, for tests
    pub fn with_seed(store: S, ticker: T, seed: u64) -> Self {
        Self::with_rng(store, ticker, StdRng::seed_from_u64(seed))
    }

    fn with_rng(store: S, ticker: T, rng: StdRng) -> Self {
        Self {
            store,
            ticker,
            rng,
            state: None,
            current_text: String::new(),
            read_error: None,
            last_round: None,
        }
    }

    /// Begin a round of `duration` seconds over the currently unseen words.
    ///
    /// A round already in progress is dismissed first. With nothing to ask,
    /// or a zero duration, the round ends before this returns.
    pub fn start(&mut self, duration: u32) -> Result<Transition, StoreError> {
        if self.is_active() {
            self.finish(EndReason::Dismissed);
        }

        let mut queue: Vec<WordId> = self.store.unseen()?.into_iter().map(|w| w.id).collect();
        queue.shuffle(&mut self.rng);

        info!(queued = queue.len(), duration, "starting round");
        let empty = queue.is_empty();
        self.state = Some(SessionState {
            queue,
            cursor: 0,
            score: 0,
            remaining: duration,
        });

        if empty {
            return Ok(self.finish(EndReason::Empty));
        }
        if duration == 0 {
            return Ok(self.finish(EndReason::Timeout));
        }

        self.ticker.start(TICK_INTERVAL);
        self.refresh_text();
        Ok(Transition::Continue)
    }

    /// One countdown second elapsed
    pub fn tick(&mut self) -> Transition {
        let Some(state) = self.state.as_mut() else {
            return Transition::Inactive;
        };
        state.remaining = state.remaining.saturating_sub(1);
        if state.remaining == 0 {
            return self.finish(EndReason::Timeout);
        }
        Transition::Continue
    }

    /// Mark the current word as known.
    ///
    /// The seen flag is written first; when that fails the round is left
    /// exactly as it was and the error is returned.
    pub fn advance_correct(&mut self) -> Result<Transition, StoreError> {
        let current = match self.state.as_ref() {
            None => return Ok(Transition::Inactive),
            Some(s) => s.queue.get(s.cursor).copied(),
        };
        let Some(id) = current else {
            return Ok(self.finish(EndReason::Exhausted));
        };

        if let Err(e) = self.store.set_seen(id, true) {
            warn!(%id, error = %e, "could not mark word seen");
            return Err(e);
        }

        if let Some(state) = self.state.as_mut() {
            state.score += 1;
            state.cursor += 1;
            debug!(%id, score = state.score, "correct");
        }
        Ok(self.after_advance())
    }

    /// Move on without marking the word; it stays unseen for a later round
    pub fn skip(&mut self) -> Transition {
        let Some(state) = self.state.as_mut() else {
            return Transition::Inactive;
        };
        state.cursor += 1;
        self.after_advance()
    }

    /// Step back one word; stays put at the front of the queue
    pub fn rewind(&mut self) -> Transition {
        let Some(state) = self.state.as_mut() else {
            return Transition::Inactive;
        };
        if state.cursor > 0 {
            state.cursor -= 1;
            self.refresh_text();
        }
        Transition::Continue
    }

    /// End the running round for `reason`, returning its summary
    pub fn end(&mut self, reason: EndReason) -> Option<RoundSummary> {
        if !self.is_active() {
            return None;
        }
        self.finish(reason).ended()
    }

    pub fn dismiss(&mut self) -> Option<RoundSummary> {
        self.end(EndReason::Dismissed)
    }

    fn after_advance(&mut self) -> Transition {
        let exhausted = self
            .state
            .as_ref()
            .is_some_and(|s| s.cursor >= s.queue.len());
        if exhausted {
            return self.finish(EndReason::Exhausted);
        }
        self.refresh_text();
        Transition::Continue
    }

    fn finish(&mut self, reason: EndReason) -> Transition {
        self.ticker.stop();
        let state = self.state.take().unwrap_or_else(|| SessionState {
            queue: Vec::new(),
            cursor: 0,
            score: 0,
            remaining: 0,
        });
        self.current_text.clear();

        let summary = RoundSummary {
            score: state.score,
            reason,
            queued: state.queue.len(),
        };
        info!(%reason, score = summary.score, queued = summary.queued, "round ended");
        self.last_round = Some(summary);
        Transition::Ended(summary)
    }

    /// Re-read the word under the cursor. A word deleted mid-round shows as
    /// empty text; a failed read also shows as empty text and is kept for
    /// [`Quiz::take_read_error`].
    fn refresh_text(&mut self) {
        self.read_error = None;
        let Some(id) = self
            .state
            .as_ref()
            .and_then(|s| s.queue.get(s.cursor).copied())
        else {
            self.current_text.clear();
            return;
        };

        self.current_text = match self.store.get(id) {
            Ok(word) => word.map(|w| w.name).unwrap_or_default(),
            Err(e) => {
                warn!(%id, error = %e, "could not load word");
                self.read_error = Some(e);
                String::new()
            }
        };
    }

    /// The error from the last failed load of the current word, if any
    pub fn take_read_error(&mut self) -> Option<StoreError> {
        self.read_error.take()
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    pub fn current_text(&self) -> &str {
        &self.current_text
    }

    pub fn score(&self) -> u32 {
        self.state.as_ref().map_or(0, |s| s.score)
    }

    pub fn remaining(&self) -> u32 {
        self.state.as_ref().map_or(0, |s| s.remaining)
    }

    pub fn cursor(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.cursor)
    }

    pub fn state(&self) -> Option<&SessionState> {
        self.state.as_ref()
    }

    pub fn last_round(&self) -> Option<RoundSummary> {
        self.last_round
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn ticker(&self) -> &T {
        &self.ticker
    }
}
