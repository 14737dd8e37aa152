//! Network boundary to the remote poll store.
//!
//! Every call is a single request/response. Nothing here retries; the
//! coordinator decides what a failure means for local state.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::SyncError;
use crate::models::{CreatePollRequest, CreatedPollPayload, Poll, PollPayload, VoteRequest};

#[async_trait]
pub trait PollSync: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<Poll>, SyncError>;

    async fn fetch_one(&self, poll_id: &str) -> Result<Poll, SyncError>;

    /// Creates a poll. The returned id is the one to keep.
    async fn create(&self, question: &str, options: &[String]) -> Result<Poll, SyncError>;

    /// Records a vote and returns the store's post-vote snapshot of the poll.
    async fn submit_vote(&self, poll_id: &str, option_index: usize) -> Result<Poll, SyncError>;
}

pub struct HttpPollSync {
    client: Client,
    base_url: String,
}

impl HttpPollSync {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    async fn read_body(response: Response) -> Result<String, SyncError> {
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }

    fn decode<T: DeserializeOwned>(body: &str) -> Result<T, SyncError> {
        serde_json::from_str(body).map_err(|e| SyncError::InvalidResponse(e.to_string()))
    }

    /// Reads the poll out of a successful `votePoll` reply. Stores are free to
    /// answer with nothing, a plain acknowledgement or the full poll.
    fn vote_snapshot(poll_id: &str, body: &str) -> Result<Poll, SyncError> {
        if body.trim().is_empty() {
            return Err(SyncError::InvalidResponse("empty body".to_string()));
        }
        let poll = Poll::try_from(Self::decode::<PollPayload>(body)?)?;
        if poll.id != poll_id {
            return Err(SyncError::InvalidResponse(format!(
                "voted on poll {} but got a snapshot of {}",
                poll_id, poll.id
            )));
        }
        Ok(poll)
    }
}

#[async_trait]
impl PollSync for HttpPollSync {
    async fn fetch_all(&self) -> Result<Vec<Poll>, SyncError> {
        let response = self.client.get(self.url("getAllPolls")).send().await?;
        let body = Self::read_body(response).await?;

        // One bad poll spoils the whole list rather than being dropped quietly
        let payloads: Vec<PollPayload> = Self::decode(&body)?;
        let polls = payloads
            .into_iter()
            .map(Poll::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Fetched {} polls", polls.len());
        Ok(polls)
    }

    async fn fetch_one(&self, poll_id: &str) -> Result<Poll, SyncError> {
        let response = self
            .client
            .get(self.url("getPoll"))
            .query(&[("poll_id", poll_id)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SyncError::NotFound(poll_id.to_string()));
        }

        let body = Self::read_body(response).await?;
        let poll = Poll::try_from(Self::decode::<PollPayload>(&body)?)?;
        if poll.id != poll_id {
            return Err(SyncError::InvalidResponse(format!(
                "asked for poll {} but got {}",
                poll_id, poll.id
            )));
        }
        Ok(poll)
    }

    async fn create(&self, question: &str, options: &[String]) -> Result<Poll, SyncError> {
        let request = CreatePollRequest::new(question.to_string(), options.to_vec());
        let response = self
            .client
            .post(self.url("createPoll"))
            .json(&request)
            .send()
            .await?;
        let body = Self::read_body(response).await?;

        let reply = if body.trim().is_empty() {
            CreatedPollPayload::default()
        } else {
            Self::decode(&body)?
        };
        request.into_created(reply)
    }

    async fn submit_vote(&self, poll_id: &str, option_index: usize) -> Result<Poll, SyncError> {
        let request = VoteRequest {
            poll_id: poll_id.to_string(),
            option_index,
        };
        let response = self
            .client
            .post(self.url("votePoll"))
            .json(&request)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SyncError::NotFound(poll_id.to_string()));
        }
        let body = Self::read_body(response).await?;

        // From here on the store has accepted the vote
        match Self::vote_snapshot(poll_id, &body) {
            Ok(poll) => Ok(poll),
            Err(e) => {
                debug!(
                    "votePoll gave no usable snapshot for {} ({}), fetching it",
                    poll_id, e
                );
                self.fetch_one(poll_id).await.map_err(|e| {
                    warn!("Could not refresh poll {} after voting: {}", poll_id, e);
                    SyncError::SnapshotUnavailable(e.to_string())
                })
            }
        }
    }
}
