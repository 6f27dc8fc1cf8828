use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "leadscout", about = "Lead scraping client", version)]
pub struct Cli {
    /// Backend base URL (overrides LEADSCOUT_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start a scraping job and follow its progress to completion
    Run {
        /// Target URL to scrape (repeatable)
        #[arg(long = "url", required = true)]
        urls: Vec<String>,

        /// Number of leads to request
        #[arg(long, default_value_t = 1000)]
        count: u32,

        /// Lead field to include (repeatable; standard set when omitted)
        #[arg(long = "field")]
        fields: Vec<String>,
    },

    /// Show the current state of an existing task
    Status {
        /// Task id returned when the job was started
        task_id: String,
    },
}
