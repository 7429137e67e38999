use std::path::PathBuf;

use clap::Parser;

use crate::Commands;

/// Main CLI application arguments and command structure
#[derive(Parser, Debug)]
#[clap(
    name = "jsonmemo",
    version,
    about = "Notes kept in a single JSON file, with search, stats and export"
)]
pub struct Cli {
    /// Path to a JSON configuration file
    #[clap(short = 'c', long, value_parser)]
    pub config: Option<PathBuf>,

    /// Path to the notes file (overrides the configuration)
    #[clap(long, value_parser)]
    pub notes_file: Option<PathBuf>,

    /// Verbose output mode
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands for the jsonmemo application
    #[clap(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExportFormat, GroupBy, MatchMode, Scope, SearchArgs};
    use chrono::NaiveDate;

    #[test]
    fn parses_add_with_body() {
        let cli = Cli::try_parse_from(["jsonmemo", "add", "Budget Plan", "--body", "numbers"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Add {
                title: "Budget Plan".to_string(),
                body: Some("numbers".to_string()),
            }
        );
    }

    #[test]
    fn parses_global_options() {
        let cli = Cli::try_parse_from(["jsonmemo", "--notes-file", "/tmp/n.json", "-v", "list"]).unwrap();
        assert_eq!(cli.notes_file, Some(PathBuf::from("/tmp/n.json")));
        assert!(cli.verbose);
        assert_eq!(cli.command, Commands::List);
    }

    #[test]
    fn update_fields_are_optional() {
        let cli = Cli::try_parse_from(["jsonmemo", "update", "3"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Update {
                id: 3,
                title: None,
                body: None,
            }
        );
    }

    #[test]
    fn non_numeric_id_is_rejected() {
        assert!(Cli::try_parse_from(["jsonmemo", "delete", "three"]).is_err());
    }

    #[test]
    fn search_defaults() {
        let cli = Cli::try_parse_from(["jsonmemo", "search", "plan"]).unwrap();
        let Commands::Search(args) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(args.keywords, vec!["plan".to_string()]);
        assert_eq!(args.match_mode, MatchMode::Any);
        assert_eq!(args.scope, Scope::Both);
        assert_eq!(args.limit, 0);
        assert_eq!(args.by, GroupBy::Date);
        assert!(args.export.is_none());
    }

    #[test]
    fn search_with_every_option() {
        let cli = Cli::try_parse_from([
            "jsonmemo",
            "search",
            "grocery",
            "milk",
            "--match",
            "all",
            "--in",
            "title",
            "--from",
            "2024-05-01",
            "--to",
            "2024-05-31",
            "--case-sensitive",
            "--limit",
            "5",
            "--stats",
            "--by",
            "title",
            "--limit-stats",
            "3",
            "--export",
            "csv",
        ])
        .unwrap();

        assert_eq!(
            cli.command,
            Commands::Search(SearchArgs {
                keywords: vec!["grocery".to_string(), "milk".to_string()],
                match_mode: MatchMode::All,
                scope: Scope::Title,
                date_from: NaiveDate::from_ymd_opt(2024, 5, 1),
                date_to: NaiveDate::from_ymd_opt(2024, 5, 31),
                case_sensitive: true,
                limit: 5,
                stats: true,
                by: GroupBy::Title,
                limit_stats: Some(3),
                export: Some(ExportFormat::Csv),
            })
        );
    }

    #[test]
    fn search_requires_keywords_and_valid_dates() {
        assert!(Cli::try_parse_from(["jsonmemo", "search"]).is_err());
        assert!(Cli::try_parse_from(["jsonmemo", "search", "x", "--from", "05/01/2024"]).is_err());
        assert!(Cli::try_parse_from(["jsonmemo", "search", "x", "--in", "tags"]).is_err());
    }
}
