//! Core data structures for the jsonmemo application.
//!
//! This module contains the note record as it is persisted in the store file.
use std::fmt;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// On-disk timestamp layout, second precision, no zone.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A timestamp exactly as it appears in the store file.
///
/// Hand-edited files may carry values that do not parse; those stay loadable
/// and are only interpreted when a query needs the time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    /// Current local time, truncated to seconds.
    pub fn now() -> Self {
        Self::from_datetime(Local::now().naive_local())
    }

    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        Timestamp(dt.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the first 19 characters; anything else yields `None`.
    pub fn parse(&self) -> Option<NaiveDateTime> {
        let head = self.0.get(..19)?;
        NaiveDateTime::parse_from_str(head, TIMESTAMP_FORMAT).ok()
    }

    /// `YYYY-MM-DD` prefix, or whatever is there when the value is short.
    pub fn date_part(&self) -> &str {
        self.0.get(..10).unwrap_or(&self.0)
    }

    /// `YYYY-MM-DD HH:MM` for listings.
    pub fn short_display(&self) -> String {
        self.0.replace('T', " ").chars().take(16).collect()
    }
}

impl From<&str> for Timestamp {
    fn from(value: &str) -> Self {
        Timestamp(value.to_string())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Represents a single note in our system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier, assigned by the store
    pub id: u64,
    /// Single-line title
    #[serde(default)]
    pub title: String,
    /// Free text, may span lines
    #[serde(default)]
    pub body: String,
    /// When the note was created
    #[serde(default)]
    pub created_at: Timestamp,
    /// Last modification time, absent until the first edit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl Note {
    /// Creates a new note stamped with the current time.
    ///
    /// Title and body are expected to have been validated already.
    pub fn new(id: u64, title: String, body: String) -> Self {
        Note {
            id,
            title,
            body,
            created_at: Timestamp::now(),
            updated_at: None,
        }
    }

    /// Marks the note as edited now.
    pub fn touch(&mut self) {
        self.updated_at = Some(Timestamp::now());
    }
}

/// Id for the next note: one past the highest id in use, 1 when empty.
/// `None` once the highest id is `u64::MAX`.
pub fn next_id(notes: &[Note]) -> Option<u64> {
    match notes.iter().map(|n| n.id).max() {
        Some(max) => max.checked_add(1),
        None => Some(1),
    }
}
