//! Normalization and rejection of user supplied note fields.
//!
//! Nothing here touches the store: callers validate first and only mutate the
//! collection once every field came back `Ok`.
use log::debug;

use crate::ValidationError;

/// Default maximum title length, in characters.
pub const MAX_TITLE_LEN: usize = 100;

/// Default maximum body length, in characters.
pub const MAX_BODY_LEN: usize = 1000;

/// Stored in place of an empty body.
pub const BODY_PLACEHOLDER: &str = "(no body)";

/// Field limits applied to incoming titles and bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validator {
    pub max_title_len: usize,
    pub max_body_len: usize,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            max_title_len: MAX_TITLE_LEN,
            max_body_len: MAX_BODY_LEN,
        }
    }
}

impl Validator {
    pub fn new(max_title_len: usize, max_body_len: usize) -> Self {
        Self {
            max_title_len,
            max_body_len,
        }
    }

    /// Trims the title, folds line breaks into spaces and enforces the limit.
    pub fn validate_title(&self, raw: &str) -> Result<String, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            debug!("Rejected empty title");
            return Err(ValidationError::EmptyTitle);
        }

        let title = single_line(trimmed);
        let len = title.chars().count();
        if len > self.max_title_len {
            debug!("Rejected title of {} characters", len);
            return Err(ValidationError::TitleTooLong {
                len,
                max: self.max_title_len,
            });
        }

        Ok(title)
    }

    /// Missing or blank bodies become [`BODY_PLACEHOLDER`]; only length can
    /// reject a body.
    pub fn validate_body(&self, raw: Option<&str>) -> Result<String, ValidationError> {
        let body = match raw.map(str::trim) {
            None | Some("") => return Ok(BODY_PLACEHOLDER.to_string()),
            Some(body) => body,
        };

        let len = body.chars().count();
        if len > self.max_body_len {
            debug!("Rejected body of {} characters", len);
            return Err(ValidationError::BodyTooLong {
                len,
                max: self.max_body_len,
            });
        }

        Ok(body.to_string())
    }
}

/// `\r\n` counts as one break; any other control character becomes a space.
fn single_line(text: &str) -> String {
    text.replace("\r\n", " ")
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Returns true for bodies the stats treat as "no body".
pub fn is_placeholder_body(body: &str) -> bool {
    let body = body.trim();
    body.is_empty() || body == BODY_PLACEHOLDER
}
