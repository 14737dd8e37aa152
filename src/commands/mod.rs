use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Anonymous quick polls from the terminal")]
pub struct Cli {
    /// Also print the optimistic state while a vote is being saved
    #[arg(long, global = true)]
    pub show_pending: bool,

    #[command(subcommand)]
    pub command: PollCommand,
}

#[derive(Subcommand, Debug)]
pub enum PollCommand {
    /// Show every poll, samples included
    List,

    /// Show a single poll with fresh counts
    Show { poll_id: String },

    /// Create a new poll with 2 to 6 options
    Create {
        question: String,

        #[arg(required = true, num_args = 1..)]
        options: Vec<String>,
    },

    /// Vote for an option, numbered from 1 as shown by `list`
    Vote { poll_id: String, option: usize },

    /// Keep re-querying and printing polls until interrupted
    Watch {
        /// Seconds between refreshes; defaults to POLLZ_REFRESH_SECS
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vote_command() {
        let cli = Cli::try_parse_from(["pollz", "vote", "1712", "2"]).unwrap();
        match cli.command {
            PollCommand::Vote { poll_id, option } => {
                assert_eq!(poll_id, "1712");
                assert_eq!(option, 2);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn create_requires_options() {
        assert!(Cli::try_parse_from(["pollz", "create", "Q?"]).is_err());
        let cli = Cli::try_parse_from(["pollz", "create", "Q?", "a", "b"]).unwrap();
        assert!(matches!(
            cli.command,
            PollCommand::Create { ref options, .. } if options.len() == 2
        ));
    }

    #[test]
    fn watch_interval_must_be_positive() {
        assert!(Cli::try_parse_from(["pollz", "watch", "--interval", "0"]).is_err());
        let cli = Cli::try_parse_from(["pollz", "watch", "--interval", "5"]).unwrap();
        assert!(matches!(cli.command, PollCommand::Watch { interval: Some(5) }));
    }
}
