//! Shared types for the jsonmemo application.
//!
//! This module contains the crate-wide result alias and the parsed command
//! set the command line dispatches on.
use chrono::NaiveDate;
use clap::{Args, Subcommand};

use crate::{ExportFormat, GroupBy, MatchMode, MemoError, Scope, SearchQuery};

/// A specialized Result type for jsonmemo operations.
pub type Result<T> = std::result::Result<T, MemoError>;

/// Available subcommands for the jsonmemo application
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Add a new note
    Add {
        /// Title of the note (single line)
        title: String,

        /// Body text; "(no body)" is stored when omitted
        #[clap(long)]
        body: Option<String>,
    },

    /// List all notes in stored order
    List,

    /// Show one note in full
    Show {
        /// ID of the note to show
        id: u64,
    },

    /// Change the title and/or body of a note
    Update {
        /// ID of the note to update
        id: u64,

        /// New title
        #[clap(long)]
        title: Option<String>,

        /// New body
        #[clap(long)]
        body: Option<String>,
    },

    /// Delete a note by ID
    Delete {
        /// ID of the note to delete
        id: u64,
    },

    /// Search notes by keyword
    Search(SearchArgs),

    /// Serve the web UI
    Serve {
        /// Address to listen on (default from config)
        #[clap(long)]
        addr: Option<String>,
    },
}

/// Options of the `search` subcommand
#[derive(Args, Debug, Clone, PartialEq)]
pub struct SearchArgs {
    /// Keywords to look for
    #[clap(required = true)]
    pub keywords: Vec<String>,

    /// any = at least one keyword, all = every keyword
    #[clap(long = "match", value_enum, default_value_t = MatchMode::Any)]
    pub match_mode: MatchMode,

    /// Fields to search
    #[clap(long = "in", value_enum, default_value_t = Scope::Both)]
    pub scope: Scope,

    /// First creation date to include (YYYY-MM-DD)
    #[clap(long = "from")]
    pub date_from: Option<NaiveDate>,

    /// Last creation date to include (YYYY-MM-DD)
    #[clap(long = "to")]
    pub date_to: Option<NaiveDate>,

    /// Match upper and lower case exactly
    #[clap(long)]
    pub case_sensitive: bool,

    /// Maximum number of results (0 = no limit)
    #[clap(long, default_value_t = 0)]
    pub limit: usize,

    /// Print a summary of the results
    #[clap(long)]
    pub stats: bool,

    /// Breakdown axis for --stats
    #[clap(long, value_enum, default_value_t = GroupBy::Date)]
    pub by: GroupBy,

    /// Rows in the --stats breakdown (0 = all; default from config)
    #[clap(long)]
    pub limit_stats: Option<usize>,

    /// Also write the results to a file
    #[clap(long, value_enum)]
    pub export: Option<ExportFormat>,
}

impl From<&SearchArgs> for SearchQuery {
    fn from(args: &SearchArgs) -> Self {
        SearchQuery {
            keywords: args.keywords.clone(),
            scope: args.scope,
            mode: args.match_mode,
            case_sensitive: args.case_sensitive,
            from: args.date_from,
            to: args.date_to,
            limit: args.limit,
        }
    }
}
