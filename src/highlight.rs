//! Keyword highlighting and body excerpts for display.
//!
//! Matches are located on the raw note text; every segment is escaped for the
//! target before markers are placed around it, so note content never turns
//! into markup or terminal control sequences.
use std::ops::Range;

use crate::{query::fold_char, SearchQuery};

/// Printed where an excerpt was cut.
pub const ELLIPSIS: &str = "…";

/// Output flavour for highlighted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    /// HTML-escaped text, matches wrapped in `<mark>`.
    Html,
    /// Control characters neutralized, matches in reverse video.
    Terminal,
    /// Control characters neutralized, matches wrapped in brackets.
    Plain,
}

impl Markup {
    fn open(self) -> &'static str {
        match self {
            Markup::Html => "<mark>",
            Markup::Terminal => "\u{1b}[7m",
            Markup::Plain => "[",
        }
    }

    fn close(self) -> &'static str {
        match self {
            Markup::Html => "</mark>",
            Markup::Terminal => "\u{1b}[0m",
            Markup::Plain => "]",
        }
    }

    fn escape_into(self, text: &str, out: &mut String) {
        for c in text.chars() {
            match (self, c) {
                (_, '\n' | '\r' | '\t') => out.push(' '),
                (_, c) if c.is_control() => out.push(char::REPLACEMENT_CHARACTER),
                (Markup::Html, '&') => out.push_str("&amp;"),
                (Markup::Html, '<') => out.push_str("&lt;"),
                (Markup::Html, '>') => out.push_str("&gt;"),
                (Markup::Html, '"') => out.push_str("&quot;"),
                (Markup::Html, '\'') => out.push_str("&#39;"),
                (_, c) => out.push(c),
            }
        }
    }
}

/// Escapes text for use in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Marks keyword occurrences in note text.
#[derive(Debug, Clone)]
pub struct Highlighter {
    /// Keywords as char sequences, already case folded when insensitive
    terms: Vec<Vec<char>>,
    case_sensitive: bool,
    markup: Markup,
}

impl Highlighter {
    pub fn new<S: AsRef<str>>(keywords: &[S], case_sensitive: bool, markup: Markup) -> Self {
        let terms = keywords
            .iter()
            .map(|k| k.as_ref())
            .filter(|k| !k.is_empty())
            .map(|k| fold_chars(k, case_sensitive).map(|(c, _)| c).collect())
            .collect();

        Highlighter {
            terms,
            case_sensitive,
            markup,
        }
    }

    pub fn for_query(query: &SearchQuery, markup: Markup) -> Self {
        Self::new(query.keywords.as_slice(), query.case_sensitive, markup)
    }

    /// Byte ranges of all occurrences in `text`, sorted and merged.
    pub fn find_matches(&self, text: &str) -> Vec<Range<usize>> {
        // Each folded char remembers the byte range of the original char.
        let folded: Vec<(char, Range<usize>)> = fold_chars(text, self.case_sensitive).collect();

        let mut ranges = Vec::new();
        for term in &self.terms {
            if term.len() > folded.len() {
                continue;
            }
            for start in 0..=folded.len() - term.len() {
                let window = &folded[start..start + term.len()];
                if window.iter().map(|(c, _)| c).eq(term.iter()) {
                    ranges.push(window[0].1.start..window[term.len() - 1].1.end);
                }
            }
        }

        merge(ranges)
    }

    /// The whole text, escaped, with every occurrence marked.
    pub fn highlight(&self, text: &str) -> String {
        let ranges = self.find_matches(text);
        self.render(text, 0..text.len(), &ranges)
    }

    /// At most `width` characters of `text` around the first occurrence,
    /// with [`ELLIPSIS`] on each side that was cut.
    pub fn snippet(&self, text: &str, width: usize) -> String {
        if width == 0 {
            return String::new();
        }

        let ranges = self.find_matches(text);
        let total = text.chars().count();
        if total <= width {
            return self.render(text, 0..text.len(), &ranges);
        }

        let focus = ranges
            .first()
            .map(|r| {
                let start = text[..r.start].chars().count();
                let len = text[r.clone()].chars().count();
                start + len / 2
            })
            .unwrap_or(0);

        let first = focus.saturating_sub(width / 2).min(total - width);
        let last = first + width;
        let window = char_to_byte(text, first)..char_to_byte(text, last);

        let mut out = String::new();
        if first > 0 {
            out.push_str(ELLIPSIS);
        }
        out.push_str(&self.render(text, window, &ranges));
        if last < total {
            out.push_str(ELLIPSIS);
        }
        out
    }

    /// Escapes `text[window]`, wrapping the parts covered by `ranges`.
    fn render(&self, text: &str, window: Range<usize>, ranges: &[Range<usize>]) -> String {
        let mut out = String::with_capacity(window.len() + 16);
        let mut cursor = window.start;

        for range in ranges {
            let start = range.start.max(window.start);
            let end = range.end.min(window.end);
            if start >= end {
                continue;
            }
            self.markup.escape_into(&text[cursor..start], &mut out);
            out.push_str(self.markup.open());
            self.markup.escape_into(&text[start..end], &mut out);
            out.push_str(self.markup.close());
            cursor = end;
        }

        self.markup.escape_into(&text[cursor..window.end], &mut out);
        out
    }
}

fn fold_chars(text: &str, case_sensitive: bool) -> impl Iterator<Item = (char, Range<usize>)> + '_ {
    text.char_indices().flat_map(move |(i, c)| {
        let span = i..i + c.len_utf8();
        let folded: Vec<char> = if case_sensitive {
            vec![c]
        } else {
            fold_char(c).collect()
        };
        folded.into_iter().map(move |f| (f, span.clone()))
    })
}

fn merge(mut ranges: Vec<Range<usize>>) -> Vec<Range<usize>> {
    ranges.sort_by_key(|r| (r.start, r.end));
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}

fn char_to_byte(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn html(keywords: &[&str]) -> Highlighter {
        Highlighter::new(keywords, false, Markup::Html)
    }

    #[test]
    fn marks_every_occurrence_case_insensitively() {
        assert_eq!(
            html(&["plan"]).highlight("Plan the plan"),
            "<mark>Plan</mark> the <mark>plan</mark>"
        );
    }

    #[test]
    fn final_sigma_matches_its_capital() {
        assert_eq!(html(&["οδος"]).highlight("ΟΔΟΣ"), "<mark>ΟΔΟΣ</mark>");
        assert_eq!(html(&["ΟΔΟΣ"]).highlight("η οδος"), "η <mark>οδος</mark>");
    }

    #[test]
    fn case_sensitive_marks_exact_case_only() {
        let h = Highlighter::new(&["plan"], true, Markup::Plain);
        assert_eq!(h.highlight("Plan the plan"), "Plan the [plan]");
    }

    #[test]
    fn overlapping_keywords_are_merged() {
        assert_eq!(
            html(&["gro", "grocery"]).highlight("Grocery List"),
            "<mark>Grocery</mark> List"
        );
    }

    #[test]
    fn markup_in_content_is_escaped() {
        assert_eq!(
            html(&["b"]).highlight("<b>bold</b> & co"),
            "&lt;<mark>b</mark>&gt;<mark>b</mark>old&lt;/<mark>b</mark>&gt; &amp; co"
        );
    }

    #[test]
    fn keywords_never_match_inside_escape_entities() {
        assert_eq!(html(&["amp"]).highlight("a & b"), "a &amp; b");
    }

    #[test]
    fn terminal_output_neutralizes_control_sequences() {
        let h = Highlighter::new(&["x"], false, Markup::Terminal);
        let out = h.highlight("\u{1b}[31mx");
        assert_eq!(out, "\u{fffd}[31m\u{1b}[7mx\u{1b}[0m");
    }

    #[test]
    fn non_ascii_matches_keep_char_boundaries() {
        let h = Highlighter::new(&["メモ"], false, Markup::Plain);
        assert_eq!(h.highlight("買い物メモです"), "買い物[メモ]です");
    }

    #[test]
    fn short_body_is_not_cut() {
        assert_eq!(html(&["milk"]).snippet("buy milk", 20), "buy <mark>milk</mark>");
    }

    #[test]
    fn snippet_is_centred_on_first_match() {
        let body = format!("{}needle{}", "a".repeat(50), "b".repeat(50));
        let out = Highlighter::new(&["needle"], false, Markup::Plain).snippet(&body, 20);

        assert!(out.starts_with(ELLIPSIS));
        assert!(out.ends_with(ELLIPSIS));
        assert!(out.contains("[needle]"));
        let visible = out.replace(['[', ']'], "").replace(ELLIPSIS, "");
        assert_eq!(visible.chars().count(), 20);
    }

    #[test]
    fn snippet_without_match_starts_at_beginning() {
        let body = "x".repeat(30);
        let out = html(&["zzz"]).snippet(&body, 10);
        assert_eq!(out, format!("{}{}", "x".repeat(10), ELLIPSIS));
    }

    #[test]
    fn snippet_near_the_end_only_cuts_the_front() {
        let body = format!("{}tail", "a".repeat(40));
        let out = Highlighter::new(&["tail"], false, Markup::Plain).snippet(&body, 10);
        assert_eq!(out, format!("{}aaaaaa[tail]", ELLIPSIS));
    }

    #[test]
    fn snippet_escapes_content() {
        let body = format!("{}<script>alert(1)</script>", "z".repeat(100));
        let out = html(&["alert"]).snippet(&body, 30);
        assert!(out.contains("&lt;script&gt;<mark>alert</mark>"));
        assert!(!out.contains("<script>"));
    }

    #[test]
    fn escape_html_covers_attribute_quotes() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    proptest! {
        #[test]
        fn html_output_has_no_raw_markup_from_content(text in ".{0,80}", keyword in "[a-z<>&]{1,3}") {
            let out = Highlighter::new(&[keyword], false, Markup::Html).highlight(&text);
            let stripped = out.replace("<mark>", "").replace("</mark>", "");

            prop_assert!(!stripped.contains('<'));
            prop_assert!(!stripped.contains('>'));
            for (i, _) in stripped.match_indices('&') {
                let rest = &stripped[i..];
                prop_assert!(
                    ["&amp;", "&lt;", "&gt;", "&quot;", "&#39;"].iter().any(|e| rest.starts_with(e)),
                    "bare ampersand in {:?}", out
                );
            }
        }

        #[test]
        fn snippet_never_exceeds_width(text in "[a-z ]{0,200}", width in 1usize..60) {
            let out = Highlighter::new(&["a"], false, Markup::Plain).snippet(&text, width);
            let visible = out.replace(['[', ']'], "").replace(ELLIPSIS, "");
            prop_assert!(visible.chars().count() <= width);
        }
    }
}
