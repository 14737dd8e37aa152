use log::error;

use crate::cache::CachedPoll;
use crate::models::Poll;
use crate::voting::format_results;

/// Everything the UI needs to draw one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollView {
    pub poll: Poll,
    pub percentages: Vec<u32>,
    /// Option this installation has voted for.
    pub selected: Option<usize>,
    /// A vote is in flight; options should not be clickable.
    pub pending: bool,
}

impl PollView {
    pub fn new(entry: &CachedPoll, selected: Option<usize>, pending: bool) -> Self {
        Self {
            poll: entry.poll.clone(),
            percentages: entry.percentages.clone(),
            selected,
            pending,
        }
    }
}

/// Render and failure-report capabilities supplied by the surrounding UI.
pub trait Renderer: Send + Sync {
    fn render(&self, view: &PollView);

    fn report_failure(&self, message: &str);
}

/// Prints polls to stdout and failures to stderr.
pub struct TerminalRenderer {
    /// Also print the optimistic and in-flight intermediate states.
    pub show_pending: bool,
}

impl Renderer for TerminalRenderer {
    fn render(&self, view: &PollView) {
        if view.pending && !self.show_pending {
            return;
        }
        let status = if view.pending { " (saving...)" } else { "" };
        println!("[{}]{}", view.poll.id, status);
        println!("{}\n", format_results(&view.poll, &view.percentages, view.selected));
    }

    fn report_failure(&self, message: &str) {
        error!("{}", message);
        eprintln!("Error: {}", message);
    }
}
