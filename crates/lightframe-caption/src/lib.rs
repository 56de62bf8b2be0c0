//! # lightframe-caption
//!
//! Splits the text a lightbox renders into its default caption panel back
//! into a title and a meta line.
//!
//! Widgets flatten captions differently depending on viewport: desktop keeps
//! a separate title field, mobile often collapses everything into one
//! paragraph. The splitter tries, in order:
//!
//! 1. an explicit title field,
//! 2. a line break between title and meta,
//! 3. a `<title> <Month> <day>, <year> • <rest>` pattern,
//!
//! and otherwise reports [`SplitKind::Unsplit`] with the whole text as meta.
//!
//! ## Quick Start
//!
//! ```
//! use lightframe_caption::{split_caption, SplitKind};
//!
//! let caption = split_caption("", "Storm clouds gathering May 2, 2022 • Lakefront");
//! assert_eq!(caption.title.as_deref(), Some("Storm clouds gathering"));
//! assert_eq!(caption.meta.as_deref(), Some("May 2, 2022 • Lakefront"));
//! assert_eq!(caption.kind, SplitKind::DatePattern);
//! ```

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
pub mod wasm;

use regex::Regex;
use std::sync::LazyLock;

/// Title followed by `<Month> <day>, <year> • <anything>`.
///
/// Month names must be capitalised; "may" in running text is not a date.
///
/// The title match is lazy so the first date-looking run wins.
static DATE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        ^(?P<title>.+?)\s+
        (?P<meta>
            (?:January|February|March|April|May|June|July|August|September|October|November|December
               |Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sept|Sep|Oct|Nov|Dec)\.?
            \s+\d{1,2},\s+\d{4}\s+•\s+.+
        )$",
    )
    .expect("date suffix pattern is valid")
});

/// Which rule produced a [`Caption`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SplitKind {
    /// The widget rendered a separate title field.
    TitleField,
    /// First line is the title, the remaining lines are meta.
    LineBreak,
    /// A trailing date/category suffix was split off.
    DatePattern,
    /// No confident split; everything is meta.
    Unsplit,
    /// Nothing to show.
    Empty,
}

/// A caption split into an optional title and an optional meta line.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Caption {
    /// Heading text, if one could be identified.
    pub title: Option<String>,
    /// Secondary text (date, location, category).
    pub meta: Option<String>,
    /// Which rule produced this caption.
    pub kind: SplitKind,
}

impl Caption {
    /// A caption with neither title nor meta.
    pub fn empty() -> Self {
        Self {
            title: None,
            meta: None,
            kind: SplitKind::Empty,
        }
    }

    /// True when there is nothing to render.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.meta.is_none()
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Split raw caption text into title and meta.
///
/// `raw_title` is the text of the widget's title field (empty when the
/// widget did not render one), `raw_body` the text of its description field.
///
/// # Examples
///
/// ```
/// use lightframe_caption::split_caption;
///
/// let caption = split_caption("", "Sunset over the bay\nJuly 4, 2021 • Harbor");
/// assert_eq!(caption.title.as_deref(), Some("Sunset over the bay"));
/// assert_eq!(caption.meta.as_deref(), Some("July 4, 2021 • Harbor"));
/// ```
pub fn split_caption(raw_title: &str, raw_body: &str) -> Caption {
    if let Some(title) = non_empty(raw_title) {
        return Caption {
            title: Some(title),
            meta: non_empty(raw_body),
            kind: SplitKind::TitleField,
        };
    }

    let lines: Vec<&str> = raw_body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    match lines.as_slice() {
        [] => Caption::empty(),
        [first, rest @ ..] if !rest.is_empty() => Caption {
            title: Some((*first).to_string()),
            meta: Some(rest.join(" ")),
            kind: SplitKind::LineBreak,
        },
        [only, ..] => match DATE_SUFFIX.captures(only) {
            Some(caps) => Caption {
                title: non_empty(&caps["title"]),
                meta: non_empty(&caps["meta"]),
                kind: SplitKind::DatePattern,
            },
            None => Caption {
                title: None,
                meta: Some((*only).to_string()),
                kind: SplitKind::Unsplit,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_field_wins() {
        let caption = split_caption("  Harbor lights ", "July 4, 2021 • Harbor");
        assert_eq!(caption.title.as_deref(), Some("Harbor lights"));
        assert_eq!(caption.meta.as_deref(), Some("July 4, 2021 • Harbor"));
        assert_eq!(caption.kind, SplitKind::TitleField);
    }

    #[test]
    fn test_title_field_without_body() {
        let caption = split_caption("Harbor lights", "   ");
        assert_eq!(caption.title.as_deref(), Some("Harbor lights"));
        assert_eq!(caption.meta, None);
    }

    #[test]
    fn test_line_break_split() {
        let caption = split_caption("", "Sunset over the bay\nJuly 4, 2021 • Harbor");
        assert_eq!(caption.title.as_deref(), Some("Sunset over the bay"));
        assert_eq!(caption.meta.as_deref(), Some("July 4, 2021 • Harbor"));
        assert_eq!(caption.kind, SplitKind::LineBreak);
    }

    #[test]
    fn test_line_break_joins_remaining_lines() {
        let caption = split_caption("", "Title\r\n\r\n  March 1, 2020 \n Porch \n");
        assert_eq!(caption.title.as_deref(), Some("Title"));
        assert_eq!(caption.meta.as_deref(), Some("March 1, 2020 Porch"));
    }

    #[test]
    fn test_date_pattern_split() {
        let caption = split_caption("", "Storm clouds gathering May 2, 2022 • Lakefront");
        assert_eq!(caption.title.as_deref(), Some("Storm clouds gathering"));
        assert_eq!(caption.meta.as_deref(), Some("May 2, 2022 • Lakefront"));
        assert_eq!(caption.kind, SplitKind::DatePattern);
    }

    #[test]
    fn test_date_pattern_abbreviated_month() {
        let caption = split_caption("", "Nap time Sept. 14, 2019 • Living room • Pixel 3");
        assert_eq!(caption.title.as_deref(), Some("Nap time"));
        assert_eq!(
            caption.meta.as_deref(),
            Some("Sept. 14, 2019 • Living room • Pixel 3")
        );
    }

    #[test]
    fn test_bullet_without_date_is_unsplit() {
        let caption = split_caption("", "Tea • Biscuits • Afternoon");
        assert_eq!(caption.title, None);
        assert_eq!(caption.meta.as_deref(), Some("Tea • Biscuits • Afternoon"));
        assert_eq!(caption.kind, SplitKind::Unsplit);
    }

    #[test]
    fn test_non_month_word_is_unsplit() {
        let caption = split_caption("", "Gate Seven 12, 2020 • Airport");
        assert_eq!(caption.kind, SplitKind::Unsplit);
    }

    #[test]
    fn test_lowercase_month_word_is_unsplit() {
        let caption = split_caption("", "Storm we may 2, 2022 • x");
        assert_eq!(caption.kind, SplitKind::Unsplit);
        assert_eq!(caption.title, None);
        assert_eq!(caption.meta.as_deref(), Some("Storm we may 2, 2022 • x"));
    }

    #[test]
    fn test_date_without_title_is_unsplit() {
        let caption = split_caption("", "May 2, 2022 • Lakefront");
        assert_eq!(caption.kind, SplitKind::Unsplit);
        assert_eq!(caption.meta.as_deref(), Some("May 2, 2022 • Lakefront"));
    }

    #[test]
    fn test_empty_input() {
        let caption = split_caption(" ", "\n \n");
        assert!(caption.is_empty());
        assert_eq!(caption.kind, SplitKind::Empty);
    }
}
