//! Aggregates over a search result set.
use std::collections::BTreeMap;

use clap::ValueEnum;

use crate::{is_placeholder_body, Note};

/// Breakdown axis for [`summarize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum GroupBy {
    /// Creation date (`YYYY-MM-DD`)
    #[default]
    Date,
    Title,
}

/// Summary figures for a set of notes.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
    pub avg_title_len: f64,
    pub placeholder_bodies: usize,
    pub by: GroupBy,
    /// `(key, count)`, most frequent first, ties by key
    pub breakdown: Vec<(String, usize)>,
}

/// Computes the summary; `top` caps the breakdown rows, 0 keeps them all.
pub fn summarize(notes: &[Note], by: GroupBy, top: usize) -> Summary {
    let dates: Vec<&str> = notes
        .iter()
        .map(|n| n.created_at.date_part())
        .filter(|d| !d.is_empty())
        .collect();

    let avg_title_len = if notes.is_empty() {
        0.0
    } else {
        let total: usize = notes.iter().map(|n| n.title.chars().count()).sum();
        total as f64 / notes.len() as f64
    };

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for note in notes {
        let key = match by {
            GroupBy::Date => non_empty_or(note.created_at.date_part(), "unknown date"),
            GroupBy::Title => non_empty_or(&note.title, "(untitled)"),
        };
        *counts.entry(key).or_default() += 1;
    }

    // BTreeMap iteration is key ordered, so a stable sort on count keeps ties by key.
    let mut breakdown: Vec<(String, usize)> = counts.into_iter().collect();
    breakdown.sort_by(|a, b| b.1.cmp(&a.1));
    if top > 0 {
        breakdown.truncate(top);
    }

    Summary {
        total: notes.len(),
        first_date: dates.iter().min().map(|d| d.to_string()),
        last_date: dates.iter().max().map(|d| d.to_string()),
        avg_title_len,
        placeholder_bodies: notes.iter().filter(|n| is_placeholder_body(&n.body)).count(),
        by,
        breakdown,
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}
