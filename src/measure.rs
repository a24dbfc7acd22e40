use core::fmt;

use crate::segment::SegmentKind;

/// Emoji cluster width as a multiple of the font size.
///
/// Emoji are looked up as bitmaps by the rendering backend, so their
/// advance is a fixed policy value rather than a measurement result.
pub const EMOJI_WIDTH_FACTOR: f32 = 1.2;

/// Reference size used for the analytic single-token probe measurement.
pub(crate) const PROBE_FONT_SIZE: f32 = 100.0;

/// Fully resolved style for one measurement call.
///
/// Style is always passed by value into [`TextMeasurer::measure_px`];
/// there is no shared drawing context to mutate and restore.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    /// Font family name, e.g. "sans-serif" or "monospace".
    pub family: String,
    /// CSS-style weight (400 regular, 700 bold).
    pub weight: u16,
    /// Italic slant.
    pub italic: bool,
    /// Font size in pixels.
    pub size_px: f32,
}

impl TextStyle {
    /// Resolve the measurement style implied by a segment kind.
    pub fn for_kind(kind: SegmentKind, family: &str, size_px: f32) -> Self {
        let (weight, italic, mono) = match kind {
            SegmentKind::Bold => (700, false, false),
            SegmentKind::Italic => (400, true, false),
            SegmentKind::BoldItalic => (700, true, false),
            SegmentKind::Monospace => (400, false, true),
            // Strikethrough is drawn as a rule over regular glyphs and
            // measures identically to plain text.
            SegmentKind::Plain
            | SegmentKind::Strikethrough
            | SegmentKind::Whitespace
            | SegmentKind::Emoji => (400, false, false),
        };
        Self {
            family: if mono {
                "monospace".to_string()
            } else {
                family.to_string()
            },
            weight,
            italic,
            size_px,
        }
    }
}

/// Glyph measurement failure.
#[derive(Clone, Debug, PartialEq)]
pub enum MeasureError {
    /// The measurement backend could not be reached.
    Unavailable(String),
    /// The backend returned a width that is not a usable number.
    InvalidWidth(f32),
}

impl fmt::Display for MeasureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(reason) => write!(f, "measurement unavailable: {}", reason),
            Self::InvalidWidth(width) => write!(f, "measurement returned invalid width {}", width),
        }
    }
}

impl std::error::Error for MeasureError {}

/// Glyph measurement hook for width-accurate line fitting.
///
/// Implementations must be deterministic for fixed inputs: the fit search
/// re-measures the same text at many candidate sizes and assumes a given
/// (text, style) pair always produces the same width.
pub trait TextMeasurer: Send + Sync {
    /// Measure rendered text width in pixels for the provided style.
    fn measure_px(&self, text: &str, style: &TextStyle) -> Result<f32, MeasureError>;
}

/// Measure and validate: any non-finite or negative width from the
/// backend is reported as a measurement failure, never used for layout.
pub(crate) fn checked_measure(
    measurer: &dyn TextMeasurer,
    text: &str,
    style: &TextStyle,
) -> Result<f32, MeasureError> {
    let width = measurer.measure_px(text, style)?;
    if !width.is_finite() || width < 0.0 {
        return Err(MeasureError::InvalidWidth(width));
    }
    Ok(width)
}

/// Built-in width model used when no platform measurer is installed.
///
/// Per-glyph class widths (narrow/regular/wide/punctuation/digit) with
/// style and family modifiers. This is more stable across sizes and
/// families than a single scalar, and it is fully deterministic, which
/// makes it the substitute measurer of choice in tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicMeasurer;

impl TextMeasurer for HeuristicMeasurer {
    fn measure_px(&self, text: &str, style: &TextStyle) -> Result<f32, MeasureError> {
        let chars = text.chars().count();
        if chars == 0 {
            return Ok(0.0);
        }
        let family = style.family.to_ascii_lowercase();
        let proportional = !(family.contains("mono") || family.contains("fixed"));
        let mut em_sum = 0.0f32;
        if proportional {
            for ch in text.chars() {
                em_sum += proportional_glyph_em_width(ch);
            }
        } else {
            // Fixed-pitch fallback keeps a small delta for spaces only.
            for ch in text.chars() {
                em_sum += if ch == ' ' { 0.52 } else { 0.58 };
            }
        }

        let mut family_scale = if family.contains("serif") {
            1.03
        } else if family.contains("sans") {
            0.99
        } else {
            1.00
        };
        if style.weight >= 700 {
            family_scale += 0.03;
        }
        if style.italic {
            family_scale += 0.01;
        }
        if style.size_px >= 24.0 {
            family_scale += 0.01;
        }

        Ok(em_sum * style.size_px * family_scale)
    }
}

fn proportional_glyph_em_width(ch: char) -> f32 {
    match ch {
        ' ' | '\u{00A0}' => 0.32,
        '\t' => 1.28,
        'i' | 'l' | 'I' | '|' | '!' => 0.24,
        '.' | ',' | ':' | ';' | '\'' | '"' | '`' => 0.23,
        '-' | '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' => 0.34,
        '(' | ')' | '[' | ']' | '{' | '}' => 0.30,
        'f' | 't' | 'j' | 'r' => 0.34,
        'm' | 'w' | 'M' | 'W' | '@' | '%' | '&' | '#' => 0.74,
        c if c.is_ascii_digit() => 0.52,
        c if c.is_ascii_uppercase() => 0.64,
        c if c.is_ascii_lowercase() => 0.52,
        c if c.is_whitespace() => 0.32,
        c if c.is_ascii_punctuation() => 0.42,
        _ => 0.56,
    }
}
