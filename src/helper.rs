use std::borrow::Cow;

use console::{pad_str, truncate_str, Alignment};

/// Cuts `text` to `width` terminal columns, ending with `…` when cut.
///
/// Widths are display widths, so full-width characters count as two.
pub fn clip(text: &str, width: usize) -> Cow<'_, str> {
    truncate_str(text, width, "…")
}

/// Left-aligns `text` in a field of `width` columns without truncating.
/// Escape sequences do not count towards the width.
pub fn pad(text: &str, width: usize) -> Cow<'_, str> {
    pad_str(text, width, Alignment::Left, None)
}

/// Terminal width, 80 when it cannot be determined.
pub fn term_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

/// `""` for one, `"s"` otherwise.
pub fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
