use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "sd-review")]
#[command(about = "Review duplicate groups and decide which copies to keep", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the review status of a duplicate group
    Status {
        #[arg(long)]
        group: i64,
    },
    /// Show how many duplicate files of a session have a decision
    Progress {
        /// Defaults to the latest completed scan session
        #[arg(long)]
        session: Option<i64>,
    },
    /// Compare the copies of a group and suggest which to keep
    Suggest {
        #[arg(long)]
        group: i64,
    },
    /// List files marked for deletion
    Queue {
        /// Print the queue as JSON
        #[arg(long)]
        json: bool,
    },
    /// Keep one copy in every group and mark the rest for deletion (newest, shortest, suggested)
    AutoSelect {
        strategy: String,
        #[arg(long)]
        session: Option<i64>,
    },
    /// Mark every duplicate under a directory for deletion
    MarkDir {
        path: String,
        #[arg(long)]
        session: Option<i64>,
    },
    /// Interactive review shell with undo and redo
    Review {
        #[arg(long)]
        session: Option<i64>,
    },
    /// Delete every stored review decision
    ResetDecisions,
    /// Print configuration values
    PrintConfig,
}
