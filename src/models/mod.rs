use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    pub votes: Vec<u64>,
}

impl Poll {
    /// A poll nobody has voted on yet.
    pub fn new(id: impl Into<String>, question: impl Into<String>, options: Vec<String>) -> Self {
        let votes = vec![0; options.len()];
        Self {
            id: id.into(),
            question: question.into(),
            options,
            votes,
        }
    }

    pub fn total_votes(&self) -> u64 {
        self.votes.iter().fold(0, |total, count| total.saturating_add(*count))
    }

    /// Checks the invariants every poll handed to the cache must satisfy.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("poll_id is empty".to_string());
        }
        if self.question.trim().is_empty() {
            return Err(format!("poll {} has an empty question", self.id));
        }
        if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&self.options.len()) {
            return Err(format!(
                "poll {} has {} options, expected {}..={}",
                self.id,
                self.options.len(),
                MIN_OPTIONS,
                MAX_OPTIONS
            ));
        }
        if self.options.iter().any(|o| o.trim().is_empty()) {
            return Err(format!("poll {} has an empty option label", self.id));
        }
        if self.votes.len() != self.options.len() {
            return Err(format!(
                "poll {} has {} vote counts for {} options",
                self.id,
                self.votes.len(),
                self.options.len()
            ));
        }
        if self.votes.iter().try_fold(0u64, |total, count| total.checked_add(*count)).is_none() {
            return Err(format!(
                "poll {} has a vote total that does not fit in 64 bits",
                self.id
            ));
        }
        Ok(())
    }
}

/// Poll as the remote store serializes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollPayload {
    pub poll_id: String,
    pub question: String,
    pub options: Vec<String>,
    pub votes: Vec<u64>,
}

impl TryFrom<PollPayload> for Poll {
    type Error = SyncError;

    fn try_from(payload: PollPayload) -> Result<Self, Self::Error> {
        let poll = Poll {
            id: payload.poll_id,
            question: payload.question,
            options: payload.options,
            votes: payload.votes,
        };
        poll.validate().map_err(SyncError::InvalidResponse)?;
        Ok(poll)
    }
}

/// Reply to `createPoll`. The store may echo back anything from the full poll
/// to nothing at all, so every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatedPollPayload {
    pub poll_id: Option<String>,
    pub question: Option<String>,
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePollRequest {
    pub poll_id: String,
    pub question: String,
    pub options: Vec<String>,
}

impl CreatePollRequest {
    pub fn new(question: String, options: Vec<String>) -> Self {
        Self {
            poll_id: placeholder_poll_id(),
            question,
            options,
        }
    }

    /// Builds the poll to cache once the store has answered. A server-assigned
    /// id always wins over the placeholder; new polls start at zero votes.
    pub fn into_created(self, reply: CreatedPollPayload) -> Result<Poll, SyncError> {
        let poll = Poll::new(
            reply.poll_id.filter(|id| !id.is_empty()).unwrap_or(self.poll_id),
            reply.question.unwrap_or(self.question),
            reply.options.unwrap_or(self.options),
        );
        poll.validate().map_err(SyncError::InvalidResponse)?;
        Ok(poll)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    pub poll_id: String,
    pub option_index: usize,
}

/// Client-side id sent with a create request, derived from the current time.
pub fn placeholder_poll_id() -> String {
    Utc::now().timestamp_millis().to_string()
}

/// The polls every fresh feed starts with before the remote ones arrive.
pub fn sample_polls() -> Vec<Poll> {
    let labels = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    vec![
        Poll::new(
            "sample1",
            "Best Economic Plan?",
            labels(&["Capitalism", "Communism", "Socialism"]),
        ),
        Poll::new(
            "sample2",
            "Best Season?",
            labels(&["Spring", "Summer", "Autumn", "Winter"]),
        ),
        Poll::new(
            "sample3",
            "Should Pakistan adopt Secularism?",
            labels(&["YES!", "NO!"]),
        ),
    ]
}
