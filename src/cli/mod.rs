pub mod import;
pub mod init;
pub mod jobs;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lohnkosten", about = "Import and track payroll cost CSV exports.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up lohnkosten: choose a data directory and initialize the database.
    Init {
        /// Path for lohnkosten data (default: ~/Documents/lohnkosten)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Import a payroll CSV export.
    Import {
        /// Path to the CSV file to import
        file: String,
        /// Format id (e.g. datev_payroll_v1); auto-detected if omitted
        #[arg(long)]
        format: Option<String>,
    },
    /// List recent import jobs.
    Jobs {
        /// Maximum number of jobs to show
        #[arg(long, default_value = "50")]
        limit: i64,
    },
}
