//! Read-only search over a loaded note collection.
//!
//! A query runs as a fixed pipeline: keyword filter, date range, newest-first
//! sort, then limit. Nothing here touches the store file.
use std::cmp::Reverse;

use chrono::NaiveDate;
use clap::ValueEnum;
use log::{debug, trace};

use crate::Note;

/// Which fields a keyword is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Scope {
    Title,
    Body,
    #[default]
    Both,
}

/// How several keywords combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MatchMode {
    /// At least one keyword must match.
    #[default]
    Any,
    /// Every keyword must match.
    All,
}

/// A keyword search with optional creation date bounds and result cap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub keywords: Vec<String>,
    pub scope: Scope,
    pub mode: MatchMode,
    pub case_sensitive: bool,
    /// Inclusive, from 00:00:00 of this day
    pub from: Option<NaiveDate>,
    /// Inclusive, up to 23:59:59 of this day
    pub to: Option<NaiveDate>,
    /// 0 means no limit
    pub limit: usize,
}

impl SearchQuery {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SearchQuery {
            keywords: keywords.into_iter().map(Into::into).collect(),
            ..SearchQuery::default()
        }
    }

    /// Keywords with blanks dropped.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.keywords
            .iter()
            .map(String::as_str)
            .filter(|k| !k.is_empty())
    }

    fn fold(&self, text: &str) -> String {
        if self.case_sensitive {
            text.to_string()
        } else {
            text.chars().flat_map(fold_char).collect()
        }
    }

    /// Keyword predicate; a query without keywords matches every note.
    pub fn matches_text(&self, note: &Note) -> bool {
        let fields: Vec<String> = match self.scope {
            Scope::Title => vec![self.fold(&note.title)],
            Scope::Body => vec![self.fold(&note.body)],
            Scope::Both => vec![self.fold(&note.title), self.fold(&note.body)],
        };
        let terms: Vec<String> = self.terms().map(|t| self.fold(t)).collect();
        if terms.is_empty() {
            return true;
        }

        let contains = |term: &String| fields.iter().any(|f| f.contains(term.as_str()));
        match self.mode {
            MatchMode::Any => terms.iter().any(contains),
            MatchMode::All => terms.iter().all(contains),
        }
    }

    /// Date predicate; unparseable timestamps only pass when no bound is set.
    pub fn in_date_range(&self, note: &Note) -> bool {
        if self.from.is_none() && self.to.is_none() {
            return true;
        }

        let Some(created) = note.created_at.parse().map(|dt| dt.date()) else {
            trace!("Note #{} has no usable created_at, excluded", note.id);
            return false;
        };

        self.from.map_or(true, |from| created >= from) && self.to.map_or(true, |to| created <= to)
    }

    /// Runs the whole pipeline and returns owned copies of the hits.
    pub fn run(&self, notes: &[Note]) -> Vec<Note> {
        let mut hits: Vec<Note> = notes
            .iter()
            .filter(|n| self.matches_text(n))
            .filter(|n| self.in_date_range(n))
            .cloned()
            .collect();

        sort_newest_first(&mut hits);

        if self.limit > 0 {
            hits.truncate(self.limit);
        }

        debug!(
            "Search {:?} matched {} of {} notes",
            self.keywords,
            hits.len(),
            notes.len()
        );
        hits
    }
}

/// Case-insensitive form of one character, shared by matching and
/// highlighting. Final sigma folds to `σ` so `ΟΔΟΣ` and `οδος` compare equal.
pub(crate) fn fold_char(c: char) -> impl Iterator<Item = char> {
    c.to_lowercase().map(|l| if l == 'ς' { 'σ' } else { l })
}

/// Descending by `created_at`; unparseable values sort last, ties keep their
/// original order.
pub fn sort_newest_first(notes: &mut [Note]) {
    notes.sort_by_key(|n| Reverse(n.created_at.parse()));
}
