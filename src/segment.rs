use std::sync::Arc;

use unicode_segmentation::UnicodeSegmentation;

use crate::error::LayoutError;
use crate::measure::{checked_measure, TextMeasurer, TextStyle, EMOJI_WIDTH_FACTOR};

/// Style class of one atomic layout unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Plain,
    Bold,
    Italic,
    BoldItalic,
    Strikethrough,
    Monospace,
    /// A full emoji grapheme cluster, rendered as a bitmap by the backend.
    Emoji,
    /// A run of whitespace between content segments.
    Whitespace,
}

impl SegmentKind {
    /// Whitespace segments separate content but are never line leaders.
    pub fn is_whitespace(self) -> bool {
        matches!(self, Self::Whitespace)
    }

    /// Content segments participate in justification.
    pub fn is_content(self) -> bool {
        !self.is_whitespace()
    }
}

/// Atomic layout unit: a styled run of text or one emoji cluster.
///
/// `width` is only valid for the font size it was measured under; the
/// fit search rebuilds segments from scratch at every candidate size.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub kind: SegmentKind,
    /// Literal substring; for emoji, the matched cluster. Never empty.
    pub content: String,
    /// Measured render width in pixels, always non-negative.
    pub width: f32,
}

impl Segment {
    pub fn new(kind: SegmentKind, content: impl Into<String>, width: f32) -> Self {
        Self {
            kind,
            content: content.into(),
            width,
        }
    }
}

/// Markup span delimiters, checked in precedence order.
const BOLD_ITALIC_PAIRS: [(&str, &str); 2] = [("*_", "_*"), ("_*", "*_")];
const SPAN_DELIMITERS: [(char, SegmentKind); 4] = [
    ('*', SegmentKind::Bold),
    ('_', SegmentKind::Italic),
    ('~', SegmentKind::Strikethrough),
    ('`', SegmentKind::Monospace),
];

/// Splits raw text into typed, measured segments.
///
/// The measurement service is an injected dependency so tests can
/// substitute a deterministic fake for platform font stacks.
#[derive(Clone)]
pub struct Segmenter {
    measurer: Arc<dyn TextMeasurer>,
    family: String,
}

impl core::fmt::Debug for Segmenter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Segmenter")
            .field("family", &self.family)
            .finish()
    }
}

impl Segmenter {
    /// Create a segmenter backed by the given measurement service.
    pub fn new(measurer: Arc<dyn TextMeasurer>) -> Self {
        Self {
            measurer,
            family: "sans-serif".to_string(),
        }
    }

    /// Override the base font family used for measurement.
    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = family.into();
        self
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// Measure `text` under the style implied by `kind` at `font_size`.
    pub(crate) fn measure(
        &self,
        text: &str,
        kind: SegmentKind,
        font_size: f32,
    ) -> Result<f32, LayoutError> {
        let style = TextStyle::for_kind(kind, &self.family, font_size);
        Ok(checked_measure(self.measurer.as_ref(), text, &style)?)
    }

    /// Classify `text` into an ordered segment sequence.
    ///
    /// Emoji clusters are located first so multi-codepoint sequences are
    /// never split; the spans between them go through markup tokenization
    /// and whitespace splitting. Every non-emoji segment is measured
    /// immediately; emoji widths follow the fixed width policy.
    pub fn segment(&self, text: &str, font_size: f32) -> Result<Vec<Segment>, LayoutError> {
        if !(font_size > 0.0) {
            return Err(LayoutError::InvalidInput("font size must be positive"));
        }

        let mut out = Vec::new();
        let mut plain_run = String::new();
        for grapheme in text.graphemes(true) {
            if is_emoji_cluster(grapheme) {
                if !plain_run.is_empty() {
                    self.segment_markup(&plain_run, font_size, &mut out)?;
                    plain_run.clear();
                }
                out.push(Segment::new(
                    SegmentKind::Emoji,
                    grapheme,
                    font_size * EMOJI_WIDTH_FACTOR,
                ));
            } else {
                plain_run.push_str(grapheme);
            }
        }
        if !plain_run.is_empty() {
            self.segment_markup(&plain_run, font_size, &mut out)?;
        }
        Ok(out)
    }

    /// Tokenize one emoji-free span against the markup delimiters.
    fn segment_markup(
        &self,
        text: &str,
        font_size: f32,
        out: &mut Vec<Segment>,
    ) -> Result<(), LayoutError> {
        let mut pending_start = 0;
        let mut cursor = 0;
        while cursor < text.len() {
            if let Some((kind, inner, consumed)) = match_span(&text[cursor..]) {
                if cursor > pending_start {
                    self.push_runs(&text[pending_start..cursor], SegmentKind::Plain, font_size, out)?;
                }
                self.push_runs(inner, kind, font_size, out)?;
                cursor += consumed;
                pending_start = cursor;
            } else {
                cursor += text[cursor..]
                    .chars()
                    .next()
                    .map(char::len_utf8)
                    .unwrap_or(1);
            }
        }
        if pending_start < text.len() {
            self.push_runs(&text[pending_start..], SegmentKind::Plain, font_size, out)?;
        }
        Ok(())
    }

    /// Split a span into whitespace/non-whitespace runs and measure each.
    fn push_runs(
        &self,
        text: &str,
        kind: SegmentKind,
        font_size: f32,
        out: &mut Vec<Segment>,
    ) -> Result<(), LayoutError> {
        for (run, is_ws) in whitespace_runs(text) {
            let run_kind = if is_ws { SegmentKind::Whitespace } else { kind };
            let width = self.measure(run, run_kind, font_size)?;
            out.push(Segment::new(run_kind, run, width));
        }
        Ok(())
    }
}

/// Match a markup span at the start of `s`.
///
/// Returns the span kind, the inner text, and the total bytes consumed
/// including both delimiters. Unmatched or empty spans return `None` so
/// the delimiter character falls through as plain text.
fn match_span(s: &str) -> Option<(SegmentKind, &str, usize)> {
    for (open, close) in BOLD_ITALIC_PAIRS {
        if let Some(rest) = s.strip_prefix(open) {
            if let Some(pos) = rest.find(close) {
                if pos > 0 {
                    return Some((SegmentKind::BoldItalic, &rest[..pos], pos + open.len() + close.len()));
                }
            }
        }
    }
    for (delim, kind) in SPAN_DELIMITERS {
        if let Some(rest) = s.strip_prefix(delim) {
            if let Some(pos) = rest.find(delim) {
                if pos > 0 {
                    return Some((kind, &rest[..pos], pos + 2 * delim.len_utf8()));
                }
            }
        }
    }
    None
}

/// Iterate maximal same-class (whitespace vs. not) runs of `text`.
fn whitespace_runs(text: &str) -> impl Iterator<Item = (&str, bool)> {
    let mut rest = text;
    core::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let is_ws = first.is_whitespace();
        let end = rest
            .char_indices()
            .find(|&(_, ch)| ch.is_whitespace() != is_ws)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        let (run, tail) = rest.split_at(end);
        rest = tail;
        Some((run, is_ws))
    })
}

/// Whether one grapheme cluster should render as an emoji bitmap.
///
/// A cluster qualifies when its base scalar sits in an emoji block, or
/// when it is a keycap sequence (digit + VS16 + combining keycap).
pub fn is_emoji_cluster(cluster: &str) -> bool {
    let mut chars = cluster.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    is_emoji_scalar(first) || cluster.contains('\u{20E3}')
}

/// Codepoint-block emoji test covering the pictograph planes plus the
/// scattered legacy symbols promoted to emoji presentation.
fn is_emoji_scalar(c: char) -> bool {
    let cp = c as u32;
    matches!(cp,
        // Miscellaneous Symbols and Pictographs
        0x1F300..=0x1F5FF |
        // Emoticons
        0x1F600..=0x1F64F |
        // Transport and Map Symbols
        0x1F680..=0x1F6FF |
        // Supplemental Symbols and Pictographs
        0x1F900..=0x1F9FF |
        // Symbols and Pictographs Extended-A/B
        0x1FA00..=0x1FA6F |
        0x1FA70..=0x1FAFF |
        // Dingbats, Miscellaneous Symbols
        0x2700..=0x27BF |
        0x2600..=0x26FF |
        // Regional Indicator Symbols (flags)
        0x1F1E6..=0x1F1FF |
        // Scattered singletons with emoji presentation
        0x203C | 0x2049 | 0x2122 | 0x2139 |
        0x2194..=0x2199 |
        0x21A9..=0x21AA |
        0x231A..=0x231B |
        0x2328 | 0x23CF |
        0x23E9..=0x23F3 |
        0x23F8..=0x23FA |
        0x24C2 |
        0x25AA..=0x25AB |
        0x25B6 | 0x25C0 |
        0x25FB..=0x25FE |
        0x2934..=0x2935 |
        0x2B05..=0x2B07 |
        0x2B1B..=0x2B1C |
        0x2B50 | 0x2B55 |
        0x3030 | 0x303D | 0x3297 | 0x3299
    )
}
