//! pollz: anonymous quick polls with optimistic, locally remembered votes.
//!
//! The [`coordinator::VoteCoordinator`] ties together the remote poll store
//! ([`sync`]), the local vote record ([`ledger`]) and the in-memory feed
//! ([`cache`]), and pushes every change to a [`render::Renderer`].

pub mod cache;
pub mod commands;
pub mod config;
pub mod coordinator;
pub mod db;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod render;
pub mod sync;
pub mod tasks;
pub mod voting;

pub use cache::{CachedPoll, PollCache};
pub use config::Config;
pub use coordinator::{CreateOutcome, VoteCoordinator, VoteOutcome, VoteState};
pub use error::{ConfigError, CoordinatorError, StorageError, SyncError};
pub use ledger::VoteLedger;
pub use models::Poll;
pub use render::{PollView, Renderer};
pub use sync::{HttpPollSync, PollSync};
pub use voting::percentages;
