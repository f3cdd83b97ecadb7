use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "taskfilter")]
#[command(about = "Filter a task tree with built-in and custom predicates", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding config.json (and tasks.json unless --tasks is given)
    #[arg(long, env = "TASKFILTER_HOME", global = true)]
    pub home: Option<PathBuf>,

    /// Task file to read and update
    #[arg(long, env = "TASKFILTER_TASKS", global = true)]
    pub tasks: Option<PathBuf>,

    /// Evaluate date filters as if today were this day (YYYY-MM-DD)
    #[arg(long, global = true)]
    pub today: Option<NaiveDate>,

    /// Custom filter for this run, as TITLE=EXPRESSION (repeatable)
    #[arg(long = "custom", value_name = "TITLE=EXPRESSION", global = true)]
    pub custom: Vec<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the tasks that pass the filter
    #[command(alias = "ls")]
    List {
        /// Filter title to apply instead of the enabled filters
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// List the available filters
    Filters,

    /// Enable a built-in filter
    Enable { title: String },

    /// Disable a built-in filter
    Disable { title: String },

    /// Validate a filter expression
    Check { expression: String },

    /// Set a task's completion percentage
    Progress {
        /// Task id or a unique prefix of it
        id: String,

        /// New completion, 0-100
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,
    },
}
