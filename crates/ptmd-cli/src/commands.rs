//! Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use ptmd_core::models::{FileFilter, ValidationStatus};
use ptmd_core::AppError;

#[derive(Parser, Debug)]
#[command(name = "ptmd", about = "PTMD exposure batch metadata")]
pub struct Cli {
    /// Username the command runs as
    #[arg(long, global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Load organisations, users, chemicals and organisms from a JSON seed file
    Boot {
        /// Path to the seed document
        seed: PathBuf,
    },
    /// Print the header row of the sample sheet
    Columns,
    /// Print the PTX codes of chemicals
    Codes {
        /// Chemical common names
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Register a spreadsheet already on the drive
    Register {
        /// Drive file id
        gdrive_id: String,
        /// Display name of the file
        #[arg(long)]
        name: Option<String>,
    },
    /// Upload a spreadsheet to an organisation's folder and register it
    Upload {
        /// Path to the .xlsx file
        file: PathBuf,
        /// Organisation id owning the batch
        #[arg(long)]
        organisation: i32,
    },
    /// Get a single file
    Get { file_id: i32 },
    /// Validate a file's spreadsheet and store the outcome
    Validate { file_id: i32 },
    /// Mark a file as shipped
    Ship {
        file_id: i32,
        /// Shipment date (YYYY-MM-DD), today when omitted
        #[arg(long)]
        at: Option<String>,
    },
    /// Mark a shipped file as received
    Receive {
        file_id: i32,
        /// Reception date (YYYY-MM-DD), today when omitted
        #[arg(long)]
        at: Option<String>,
    },
    /// Delete a file and its drive copy
    Remove { file_id: i32 },
    /// List files matching the filters
    Search(SearchArgs),
    /// Check whether a batch code is free in an organisation
    Batch { organisation: i32, batch: String },
    /// Change the batch code of a file
    UpdateBatch { file_id: i32, batch: String },
}

#[derive(Args, Debug, Default)]
pub struct SearchArgs {
    #[arg(long)]
    pub organisation: Option<i32>,
    #[arg(long)]
    pub author: Option<i32>,
    #[arg(long)]
    pub batch: Option<String>,
    /// Validation status: No, success or failed
    #[arg(long)]
    pub validated: Option<String>,
    #[arg(long)]
    pub shipped: Option<bool>,
    #[arg(long)]
    pub received: Option<bool>,
}

impl SearchArgs {
    pub fn filter(&self) -> Result<FileFilter, AppError> {
        Ok(FileFilter {
            organisation_id: self.organisation,
            author_id: self.author,
            batch: self.batch.clone(),
            validated: self
                .validated
                .as_deref()
                .map(str::parse::<ValidationStatus>)
                .transpose()?,
            shipped: self.shipped,
            received: self.received,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ship_with_date() {
        let cli = Cli::try_parse_from(["ptmd", "--user", "alice", "ship", "7", "--at", "2024-01-12"])
            .unwrap();
        assert_eq!(cli.user.as_deref(), Some("alice"));
        match cli.command {
            Commands::Ship { file_id, at } => {
                assert_eq!(file_id, 7);
                assert_eq!(at.as_deref(), Some("2024-01-12"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn user_flag_may_follow_the_subcommand() {
        let cli = Cli::try_parse_from(["ptmd", "remove", "3", "--user", "admin"]).unwrap();
        assert_eq!(cli.user.as_deref(), Some("admin"));
    }

    #[test]
    fn codes_need_at_least_one_name() {
        assert!(Cli::try_parse_from(["ptmd", "codes"]).is_err());
    }

    #[test]
    fn search_filter_parses_status() {
        let cli = Cli::try_parse_from([
            "ptmd",
            "search",
            "--validated",
            "success",
            "--shipped",
            "false",
        ])
        .unwrap();
        let Commands::Search(args) = cli.command else {
            panic!("expected search");
        };
        let filter = args.filter().unwrap();
        assert_eq!(filter.validated, Some(ValidationStatus::Success));
        assert_eq!(filter.shipped, Some(false));
        assert_eq!(filter.received, None);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let args = SearchArgs {
            validated: Some("maybe".into()),
            ..Default::default()
        };
        assert!(matches!(args.filter(), Err(AppError::InvalidInput(_))));
    }
}
