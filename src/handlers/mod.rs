use crate::commands::PollCommand;
use crate::coordinator::{CreateOutcome, VoteCoordinator, VoteOutcome};
use crate::error::CoordinatorError;
use crate::tasks::poll_refresher::refresh_polls_task;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;

// Route a command to the coordinator
pub async fn handle_command(
    coordinator: Arc<VoteCoordinator>,
    command: PollCommand,
    refresh_interval: Duration,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Received command: {:?}", command);
    match command {
        PollCommand::List => {
            // Samples first, then every remote poll as it lands
            coordinator.render_all().await;
            coordinator.load_polls().await;
        }
        PollCommand::Show { poll_id } => {
            coordinator.refresh_poll(&poll_id).await;
        }
        PollCommand::Create { question, options } => {
            handle_create(&coordinator, &question, &options).await?;
        }
        PollCommand::Vote { poll_id, option } => {
            handle_vote(&coordinator, &poll_id, option).await?;
        }
        PollCommand::Watch { interval } => {
            let every = interval.map(Duration::from_secs).unwrap_or(refresh_interval);
            tokio::select! {
                _ = refresh_polls_task(coordinator.clone(), every) => {}
                _ = tokio::signal::ctrl_c() => info!("Stopped watching."),
            }
        }
    }
    Ok(())
}

async fn handle_create(
    coordinator: &VoteCoordinator,
    question: &str,
    options: &[String],
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match coordinator.create_poll(question, options).await {
        Ok(CreateOutcome::Created(poll)) => {
            println!("Created poll {}", poll.id);
            Ok(())
        }
        // Already reported by the renderer
        Ok(CreateOutcome::Failed(e)) => Err(e.into()),
        Err(e) => Err(e.into()),
    }
}

async fn handle_vote(
    coordinator: &VoteCoordinator,
    poll_id: &str,
    option: usize,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let Some(option_index) = option.checked_sub(1) else {
        let reason = "options are numbered from 1".to_string();
        return Err(CoordinatorError::InvalidArgument(reason).into());
    };

    // Voting needs the poll's current shape; fetch it unless it is a known sample
    if coordinator.cached(poll_id).is_none() && coordinator.refresh_poll(poll_id).await.is_none() {
        warn!("Cannot vote on unknown poll {}", poll_id);
        return Err(CoordinatorError::InvalidArgument(format!("unknown poll {}", poll_id)).into());
    }

    match coordinator.cast_vote(poll_id, option_index).await? {
        VoteOutcome::Unchanged => println!("You already voted for option {}.", option),
        VoteOutcome::Confirmed(_) => println!("Vote recorded."),
        VoteOutcome::Unconfirmed(_) => println!("Vote recorded; results may be stale."),
        VoteOutcome::RolledBack(e) => return Err(e.into()),
    }
    Ok(())
}
