//! Optimistic voting on top of the poll cache and the vote ledger.
//!
//! A vote is applied locally and rendered before the remote store has seen
//! it. The store's reply then either replaces the optimistic counts or, if
//! the write was rejected, the cache and the ledger are put back exactly as
//! they were. Only one vote per poll may be in flight at a time.

use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::cache::{CachedPoll, PollCache};
use crate::error::{CoordinatorError, SyncError};
use crate::ledger::VoteLedger;
use crate::models::{Poll, MAX_OPTIONS, MIN_OPTIONS};
use crate::render::{PollView, Renderer};
use crate::sync::PollSync;

/// Where this installation stands on one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteState {
    Unvoted,
    Voting { previous: Option<usize>, target: usize },
    Voted(usize),
    Reverting { restore: Option<usize> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Already voted for that option; nothing was sent.
    Unchanged,
    /// The store accepted the vote; carries its snapshot.
    Confirmed(Poll),
    /// The store rejected the vote; local state was reverted.
    RolledBack(SyncError),
    /// The store accepted the vote but its snapshot was unusable, so the
    /// optimistic counts stay on screen.
    Unconfirmed(SyncError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(Poll),
    Failed(SyncError),
}

#[derive(Default)]
struct Inner {
    cache: PollCache,
    in_flight: HashMap<String, VoteState>,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Holds the per-poll vote lock; releases it on every exit path.
struct InFlight<'a> {
    inner: &'a Mutex<Inner>,
    poll_id: String,
}

impl InFlight<'_> {
    fn set(&self, state: VoteState) {
        lock(self.inner).in_flight.insert(self.poll_id.clone(), state);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(self.inner).in_flight.remove(&self.poll_id);
    }
}

pub struct VoteCoordinator {
    sync: Arc<dyn PollSync>,
    ledger: VoteLedger,
    renderer: Arc<dyn Renderer>,
    inner: Mutex<Inner>,
}

impl VoteCoordinator {
    pub fn new(
        sync: Arc<dyn PollSync>,
        ledger: VoteLedger,
        cache: PollCache,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            sync,
            ledger,
            renderer,
            inner: Mutex::new(Inner {
                cache,
                in_flight: HashMap::new(),
            }),
        }
    }

    /// Snapshot of the cached polls in feed order.
    pub fn polls(&self) -> Vec<CachedPoll> {
        lock(&self.inner).cache.polls().cloned().collect()
    }

    pub fn cached(&self, poll_id: &str) -> Option<CachedPoll> {
        lock(&self.inner).cache.get(poll_id).cloned()
    }

    pub async fn vote_state(&self, poll_id: &str) -> Result<VoteState, CoordinatorError> {
        let in_flight = lock(&self.inner).in_flight.get(poll_id).copied();
        if let Some(state) = in_flight {
            return Ok(state);
        }
        Ok(match self.ledger.get(poll_id).await? {
            Some(index) => VoteState::Voted(index),
            None => VoteState::Unvoted,
        })
    }

    /// Current view of a cached poll, including this installation's choice.
    pub async fn view(&self, poll_id: &str) -> Option<PollView> {
        let selected = self.selected(poll_id).await;
        let inner = lock(&self.inner);
        let pending = inner.in_flight.contains_key(poll_id);
        inner
            .cache
            .get(poll_id)
            .map(|entry| PollView::new(entry, selected, pending))
    }

    async fn selected(&self, poll_id: &str) -> Option<usize> {
        match self.ledger.get(poll_id).await {
            Ok(selected) => selected,
            Err(e) => {
                warn!("Could not read vote record for poll {}: {}", poll_id, e);
                None
            }
        }
    }

    async fn render_cached(&self, poll_id: &str) {
        if let Some(view) = self.view(poll_id).await {
            self.renderer.render(&view);
        }
    }

    /// Renders every cached poll in feed order.
    pub async fn render_all(&self) {
        let ids: Vec<String> = lock(&self.inner)
            .cache
            .polls()
            .map(|entry| entry.poll.id.clone())
            .collect();
        for poll_id in ids {
            self.render_cached(&poll_id).await;
        }
    }

    /// Caches a poll from the store unless a vote on it is pending, in which
    /// case the vote's own reply decides what the cache holds.
    fn accept_remote(&self, poll: Poll) -> bool {
        let mut inner = lock(&self.inner);
        if inner.in_flight.contains_key(&poll.id) {
            debug!("Skipping refresh of poll {} while a vote is in flight", poll.id);
            return false;
        }
        inner.cache.upsert(poll);
        true
    }

    /// Fetches every poll from the store. A failed fetch is reported and
    /// yields an empty list; the cache keeps what it had.
    pub async fn load_polls(&self) -> Vec<Poll> {
        match self.sync.fetch_all().await {
            Ok(polls) => {
                info!("Loaded {} polls from the store", polls.len());
                for poll in &polls {
                    if self.accept_remote(poll.clone()) {
                        self.render_cached(&poll.id).await;
                    }
                }
                polls
            }
            Err(e) => {
                error!("Error loading polls: {}", e);
                self.renderer.report_failure("Could not load polls.");
                Vec::new()
            }
        }
    }

    pub async fn refresh_poll(&self, poll_id: &str) -> Option<Poll> {
        match self.sync.fetch_one(poll_id).await {
            Ok(poll) => {
                if self.accept_remote(poll.clone()) {
                    self.render_cached(poll_id).await;
                }
                Some(poll)
            }
            Err(e) => {
                error!("Error loading poll {}: {}", poll_id, e);
                self.renderer
                    .report_failure(&format!("Could not load poll {}: {}", poll_id, e));
                None
            }
        }
    }

    /// Validates and creates a poll. Bad input is rejected before anything
    /// is sent; a failed create changes nothing locally.
    pub async fn create_poll(
        &self,
        question: &str,
        options: &[String],
    ) -> Result<CreateOutcome, CoordinatorError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(CoordinatorError::InvalidArgument(
                "question must not be empty".to_string(),
            ));
        }

        let options: Vec<String> = options
            .iter()
            .map(|option| option.trim().to_string())
            .filter(|option| !option.is_empty())
            .collect();
        if options.len() < MIN_OPTIONS {
            return Err(CoordinatorError::InvalidArgument(format!(
                "please enter at least {} options",
                MIN_OPTIONS
            )));
        }
        if options.len() > MAX_OPTIONS {
            return Err(CoordinatorError::InvalidArgument(format!(
                "a poll can have at most {} options",
                MAX_OPTIONS
            )));
        }

        match self.sync.create(question, &options).await {
            Ok(created) => {
                let poll = Poll::new(created.id, created.question, created.options);
                info!("Created poll {}", poll.id);
                let view = {
                    let mut inner = lock(&self.inner);
                    let entry = inner.cache.upsert(poll.clone());
                    PollView::new(entry, None, false)
                };
                self.renderer.render(&view);
                Ok(CreateOutcome::Created(poll))
            }
            Err(e) => {
                error!("Error creating poll: {}", e);
                self.renderer
                    .report_failure(&format!("Could not create poll: {}", e));
                Ok(CreateOutcome::Failed(e))
            }
        }
    }

    /// Casts or changes this installation's vote on a poll.
    pub async fn cast_vote(
        &self,
        poll_id: &str,
        option_index: usize,
    ) -> Result<VoteOutcome, CoordinatorError> {
        let guard = {
            let mut inner = lock(&self.inner);
            let entry = inner.cache.get(poll_id).ok_or_else(|| {
                CoordinatorError::InvalidArgument(format!("unknown poll {}", poll_id))
            })?;
            let len = entry.poll.options.len();
            if option_index >= len {
                return Err(CoordinatorError::InvalidArgument(format!(
                    "option {} is out of range for poll {} with {} options",
                    option_index, poll_id, len
                )));
            }
            if inner.in_flight.contains_key(poll_id) {
                return Err(CoordinatorError::VoteInFlight(poll_id.to_string()));
            }
            inner.in_flight.insert(
                poll_id.to_string(),
                VoteState::Voting {
                    previous: None,
                    target: option_index,
                },
            );
            InFlight {
                inner: &self.inner,
                poll_id: poll_id.to_string(),
            }
        };

        let previous = self.ledger.get(poll_id).await?;
        if previous == Some(option_index) {
            drop(guard);
            debug!("Poll {} already voted for option {}", poll_id, option_index);
            self.render_cached(poll_id).await;
            return Ok(VoteOutcome::Unchanged);
        }
        guard.set(VoteState::Voting {
            previous,
            target: option_index,
        });

        // Optimistic apply
        let (before, optimistic) = {
            let mut inner = lock(&self.inner);
            let stale = || {
                CoordinatorError::InvalidArgument(format!(
                    "option {} of poll {} cannot take another vote",
                    option_index, poll_id
                ))
            };
            let before = inner.cache.votes(poll_id).ok_or_else(stale)?;
            // A stale record for an option that no longer exists counts as no vote
            let counted = previous.filter(|prev| *prev < before.len());
            let entry = inner
                .cache
                .apply_vote(poll_id, counted, option_index)
                .ok_or_else(stale)?;
            let view = PollView::new(entry, Some(option_index), true);
            (before, view)
        };

        if let Err(e) = self.ledger.set(poll_id, option_index).await {
            error!("Could not record vote on poll {} locally: {}", poll_id, e);
            lock(&self.inner).cache.restore_votes(poll_id, before);
            drop(guard);
            self.render_cached(poll_id).await;
            self.renderer.report_failure("Could not save your vote.");
            return Err(e.into());
        }
        self.renderer.render(&optimistic);

        match self.sync.submit_vote(poll_id, option_index).await {
            Ok(snapshot) => {
                info!("Vote on poll {} confirmed", poll_id);
                lock(&self.inner).cache.upsert(snapshot.clone());
                drop(guard);
                self.render_cached(poll_id).await;
                Ok(VoteOutcome::Confirmed(snapshot))
            }
            Err(e) if e.is_rejection() => {
                warn!("Vote on poll {} failed, rolling back: {}", poll_id, e);
                guard.set(VoteState::Reverting { restore: previous });
                lock(&self.inner).cache.restore_votes(poll_id, before);
                // The poll stays locked until the record is back or we give up
                let restored = match self.ledger.restore(poll_id, previous).await {
                    Ok(()) => Ok(()),
                    Err(storage) => {
                        warn!(
                            "Retrying restore of vote record for poll {}: {}",
                            poll_id, storage
                        );
                        self.ledger.restore(poll_id, previous).await
                    }
                };
                drop(guard);
                self.render_cached(poll_id).await;
                self.renderer
                    .report_failure(&format!("Could not record your vote: {}", e));
                if let Err(storage) = restored {
                    error!("Could not restore vote record for poll {}: {}", poll_id, storage);
                    self.renderer
                        .report_failure("Could not undo your saved vote; it may be out of date.");
                    return Err(storage.into());
                }
                Ok(VoteOutcome::RolledBack(e))
            }
            Err(e) => {
                warn!("Vote on poll {} accepted without a usable snapshot: {}", poll_id, e);
                drop(guard);
                self.render_cached(poll_id).await;
                self.renderer.report_failure(&format!(
                    "Your vote was recorded but the results could not be refreshed: {}",
                    e
                ));
                Ok(VoteOutcome::Unconfirmed(e))
            }
        }
    }
}
