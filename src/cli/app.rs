//! CLI module for the jsonmemo application
//!
//! This module handles the command-line interface for interacting with the
//! note store. Every handler performs its own load (and save when mutating);
//! nothing is cached between commands.
use std::{fmt::Write as _, sync::Arc};

use clap::ValueEnum;
use console::{measure_text_width, style};
use log::{debug, info};

use crate::{
    clip, export_notes, pad, plural, summarize, term_width, Commands, Config, DeleteOutcome,
    Highlighter, Markup, MatchMode, MemoError, Note, NoteStore, Result, Scope, SearchArgs,
    SearchQuery, Snapshot, Summary, UpdateOutcome,
};

const ID_WIDTH: usize = 6;
const STATS_KEY_WIDTH: usize = 26;

/// CLI Application handler - processes CLI commands and interfaces with NoteStore
pub struct App {
    /// The note store backend
    store: Arc<NoteStore>,

    /// Application configuration
    config: Config,

    /// How search hits are marked in terminal output
    markup: Markup,
}

impl App {
    /// Create a new CLI application with the given store and config
    pub fn new(store: NoteStore, config: Config) -> Self {
        let markup = if console::colors_enabled() {
            Markup::Terminal
        } else {
            Markup::Plain
        };

        Self {
            store: Arc::new(store),
            config,
            markup,
        }
    }

    /// Run the CLI application with the given command
    pub async fn run(&self, command: Commands) -> Result<()> {
        debug!("Running command: {:?}", command);
        match command {
            Commands::Add { title, body } => self.add_note(&title, body.as_deref()),
            Commands::List => self.list_notes(),
            Commands::Show { id } => self.show_note(id),
            Commands::Update { id, title, body } => {
                self.update_note(id, title.as_deref(), body.as_deref())
            }
            Commands::Delete { id } => self.delete_note(id),
            Commands::Search(args) => self.search_notes(&args),
            Commands::Serve { addr } => {
                let addr = addr.unwrap_or_else(|| self.config.bind_addr.clone());
                crate::serve(Arc::clone(&self.store), self.config.clone(), &addr).await
            }
        }
    }

    fn add_note(&self, title: &str, body: Option<&str>) -> Result<()> {
        let note = self.store.add(title, body)?;
        println!(
            "{} Note #{} added: {}",
            style("✔").green(),
            note.id,
            note.title
        );
        Ok(())
    }

    fn list_notes(&self) -> Result<()> {
        let snapshot = self.store.load();
        warn_if_damaged(&snapshot);
        print!("{}", render_list(&snapshot.notes, self.config.list_title_width));
        Ok(())
    }

    fn show_note(&self, id: u64) -> Result<()> {
        let snapshot = self.store.load();
        warn_if_damaged(&snapshot);
        let note = snapshot
            .notes
            .iter()
            .find(|n| n.id == id)
            .ok_or(MemoError::NoteNotFound { id })?;

        print!("{}", render_note(note, term_width().min(50)));
        Ok(())
    }

    fn update_note(&self, id: u64, title: Option<&str>, body: Option<&str>) -> Result<()> {
        match self.store.update(id, title, body)? {
            UpdateOutcome::Updated(note) => {
                println!("{} Note #{} updated: {}", style("✔").green(), note.id, note.title);
                Ok(())
            }
            UpdateOutcome::NothingRequested => Err(MemoError::NothingToUpdate),
            UpdateOutcome::NotFound => Err(MemoError::NoteNotFound { id }),
        }
    }

    fn delete_note(&self, id: u64) -> Result<()> {
        match self.store.delete(id)? {
            DeleteOutcome::Deleted { removed, remaining } => {
                println!(
                    "{} Deleted #{} ({}). {} note{} left.",
                    style("✔").green(),
                    removed.id,
                    removed.title,
                    remaining,
                    plural(remaining)
                );
                Ok(())
            }
            DeleteOutcome::NotFound => Err(MemoError::NoteNotFound { id }),
        }
    }

    fn search_notes(&self, args: &SearchArgs) -> Result<()> {
        let query = SearchQuery::from(args);
        let snapshot = self.store.load();
        warn_if_damaged(&snapshot);

        let results = query.run(&snapshot.notes);
        info!("Search returned {} notes", results.len());

        if results.is_empty() {
            print!("{}", render_no_results(&query));
            return Ok(());
        }

        let highlighter = Highlighter::for_query(&query, self.markup);
        print!(
            "{}",
            render_results(
                &results,
                &query,
                &highlighter,
                self.config.list_title_width,
                self.config.snippet_width
            )
        );

        if let Some(format) = args.export {
            let path = export_notes(&results, format, &self.config.export_dir)?;
            println!(
                "{} Saved {} result{} to {}",
                style("✔").green(),
                results.len(),
                plural(results.len()),
                path.display()
            );
        }

        if args.stats {
            let top = args.limit_stats.unwrap_or(self.config.stats_limit);
            print!("{}", render_summary(&summarize(&results, args.by, top)));
        }

        Ok(())
    }
}

/// Prints a failed command's message and remediation hint to stderr.
pub fn report_error(err: &MemoError) {
    eprintln!("{} {}", style("error:").red().bold(), err);
    if let Some(hint) = err.hint() {
        eprintln!("  {} {}", style("hint:").yellow(), hint);
    }
}

fn warn_if_damaged(snapshot: &Snapshot) {
    if let Some(warning) = snapshot.warning() {
        eprintln!("{} {}", style("warning:").yellow().bold(), warning);
    }
}

fn value_name<T: ValueEnum>(value: T) -> String {
    value
        .to_possible_value()
        .map(|v| v.get_name().to_string())
        .unwrap_or_default()
}

fn render_list(notes: &[Note], title_width: usize) -> String {
    if notes.is_empty() {
        return "No notes yet.\nStart with: jsonmemo add \"Title\" --body \"Text\"\n".to_string();
    }

    let mut out = format!("===== {} note{} =====\n", notes.len(), plural(notes.len()));
    for note in notes {
        let _ = writeln!(
            out,
            "{} {} {}",
            pad(&format!("[#{}]", note.id), ID_WIDTH),
            pad(&clip(&note.title, title_width), title_width),
            note.created_at.short_display()
        );
    }
    out
}

fn render_note(note: &Note, rule_width: usize) -> String {
    let mut out = format!("[#{}] {}\n", note.id, note.title);
    let _ = writeln!(out, "created: {}", note.created_at);
    if let Some(updated) = &note.updated_at {
        let _ = writeln!(out, "updated: {}", updated);
    }
    let _ = writeln!(out, "{}", "-".repeat(rule_width));
    let _ = writeln!(out, "{}", note.body);
    out
}

fn render_results(
    results: &[Note],
    query: &SearchQuery,
    highlighter: &Highlighter,
    title_width: usize,
    snippet_width: usize,
) -> String {
    let mut out = format!(
        "Found {} note{} (scope={}, match={}, case={})\n",
        results.len(),
        plural(results.len()),
        value_name(query.scope),
        value_name(query.mode),
        if query.case_sensitive { "sensitive" } else { "insensitive" }
    );
    let _ = writeln!(
        out,
        "{} {} Created",
        pad("ID", ID_WIDTH),
        pad("Title", title_width)
    );

    for note in results {
        let clipped = clip(&note.title, title_width);
        let title = highlighter.highlight(&clipped);
        // Visible markers (plain brackets) widen the field by their own width.
        let markers = measure_text_width(&title).saturating_sub(measure_text_width(&clipped));
        let _ = writeln!(
            out,
            "{} {} {}",
            pad(&format!("[#{}]", note.id), ID_WIDTH),
            pad(&title, title_width + markers),
            note.created_at.short_display()
        );
        if query.scope != Scope::Title {
            let _ = writeln!(
                out,
                "{} {}",
                pad("", ID_WIDTH),
                highlighter.snippet(&note.body, snippet_width)
            );
        }
    }
    out
}

fn render_no_results(query: &SearchQuery) -> String {
    let mut out = format!("No notes matched \"{}\".\n", query.keywords.join(" "));

    let mut hints = Vec::new();
    if query.scope != Scope::Both {
        hints.push("search both fields with --in both");
    }
    if query.case_sensitive {
        hints.push("drop --case-sensitive");
    }
    if query.mode == MatchMode::All && query.keywords.len() > 1 {
        hints.push("use --match any");
    }
    if query.from.is_some() || query.to.is_some() {
        hints.push("widen --from/--to");
    }
    if !hints.is_empty() {
        let _ = writeln!(out, "hint: {}", hints.join(" / "));
    }
    out
}

fn render_summary(summary: &Summary) -> String {
    let mut out = String::from("\nSummary\n");
    let _ = writeln!(out, "  total: {}", summary.total);
    let _ = writeln!(
        out,
        "  period: {} to {}",
        summary.first_date.as_deref().unwrap_or("-"),
        summary.last_date.as_deref().unwrap_or("-")
    );
    let _ = writeln!(out, "  average title length: {:.1}", summary.avg_title_len);
    let _ = writeln!(out, "  without body: {}", summary.placeholder_bodies);

    let label = match value_name(summary.by).as_str() {
        "title" => "Title",
        _ => "Date",
    };
    let _ = writeln!(out, "\nBreakdown (by={})", value_name(summary.by));
    let _ = writeln!(out, "{} Count", pad(label, STATS_KEY_WIDTH));
    for (key, count) in &summary.breakdown {
        let _ = writeln!(
            out,
            "{} {}",
            pad(&clip(key, STATS_KEY_WIDTH), STATS_KEY_WIDTH),
            count
        );
    }
    out
}
