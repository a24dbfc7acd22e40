use smallvec::SmallVec;

use crate::error::LayoutError;
use crate::segment::{Segment, SegmentKind};

/// Inline storage for typical short lines; long lines spill to the heap.
pub type LineSegments = SmallVec<[Segment; 6]>;

/// Ordered group of segments fitting within a width budget.
///
/// A line never starts with a whitespace segment. An empty line only
/// ever represents an explicit blank source line.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Line {
    pub segments: LineSegments,
}

impl Line {
    /// Explicit blank source line.
    pub fn empty() -> Self {
        Self::default()
    }

    fn from_segment(segment: Segment) -> Self {
        let mut segments = LineSegments::new();
        segments.push(segment);
        Self { segments }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Sum of segment widths.
    pub fn width(&self) -> f32 {
        self.segments.iter().map(|s| s.width).sum()
    }

    /// Number of non-whitespace segments, the justification unit count.
    pub fn content_count(&self) -> usize {
        self.segments.iter().filter(|s| s.kind.is_content()).count()
    }

    /// Concatenated literal content of the line.
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.content.as_str()).collect()
    }
}

/// Pack measured segments into width-constrained lines.
///
/// Greedy single left-to-right pass with no state between calls:
/// leading whitespace is dropped, a non-whitespace non-emoji segment
/// wider than `max_width` is hard-split at character boundaries, and the
/// width comparison uses strict `>` so a segment that exactly fills the
/// remaining width stays on its line.
///
/// `measure` re-measures hard-split sub-tokens under the segment's kind.
pub fn pack<F>(
    segments: Vec<Segment>,
    max_width: f32,
    mut measure: F,
) -> Result<Vec<Line>, LayoutError>
where
    F: FnMut(&str, SegmentKind) -> Result<f32, LayoutError>,
{
    let mut lines = Vec::new();
    let mut current = LineSegments::new();
    let mut current_width = 0.0f32;

    for segment in segments {
        if segment.kind.is_whitespace() && current.is_empty() {
            continue;
        }

        let splittable = segment.kind.is_content() && segment.kind != SegmentKind::Emoji;
        if splittable && segment.width > max_width {
            if !current.is_empty() {
                lines.push(Line {
                    segments: core::mem::take(&mut current),
                });
            }
            let seed = hard_split(&segment, max_width, &mut lines, &mut measure)?;
            current_width = seed.width;
            current.push(seed);
            continue;
        }

        if current_width + segment.width > max_width && !current.is_empty() {
            lines.push(Line {
                segments: core::mem::take(&mut current),
            });
            current_width = 0.0;
            // The segment that forced the break would now lead the new
            // line; whitespace is dropped instead of carried over.
            if segment.kind.is_whitespace() {
                continue;
            }
        }

        current_width += segment.width;
        current.push(segment);
    }

    if !current.is_empty() {
        lines.push(Line { segments: current });
    }
    Ok(lines)
}

/// Split an oversized token character by character.
///
/// Each full sub-token is flushed as its own single-segment line; the
/// last partial sub-token is returned to seed the next current line.
fn hard_split<F>(
    segment: &Segment,
    max_width: f32,
    lines: &mut Vec<Line>,
    measure: &mut F,
) -> Result<Segment, LayoutError>
where
    F: FnMut(&str, SegmentKind) -> Result<f32, LayoutError>,
{
    let mut sub = String::new();
    let mut sub_width = 0.0f32;
    for ch in segment.content.chars() {
        let mut candidate = sub.clone();
        candidate.push(ch);
        let width = measure(&candidate, segment.kind)?;
        if width > max_width && !sub.is_empty() {
            lines.push(Line::from_segment(Segment::new(
                segment.kind,
                core::mem::take(&mut sub),
                sub_width,
            )));
            sub.push(ch);
            sub_width = measure(&sub, segment.kind)?;
        } else {
            sub = candidate;
            sub_width = width;
        }
    }
    Ok(Segment::new(segment.kind, sub, sub_width))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAR_W: f32 = 10.0;

    fn fixed_measure(text: &str, _kind: SegmentKind) -> Result<f32, LayoutError> {
        Ok(text.chars().count() as f32 * CHAR_W)
    }

    fn seg(kind: SegmentKind, content: &str) -> Segment {
        Segment::new(kind, content, content.chars().count() as f32 * CHAR_W)
    }

    fn word(content: &str) -> Segment {
        seg(SegmentKind::Plain, content)
    }

    fn space() -> Segment {
        seg(SegmentKind::Whitespace, " ")
    }

    #[test]
    fn empty_input_produces_no_lines() {
        let lines = pack(Vec::new(), 100.0, fixed_measure).unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn single_line_when_everything_fits() {
        let lines = pack(
            vec![word("ab"), space(), word("cd")],
            100.0,
            fixed_measure,
        )
        .unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text(), "ab cd");
        assert_eq!(lines[0].content_count(), 2);
    }

    #[test]
    fn leading_whitespace_is_dropped() {
        let lines = pack(vec![space(), space(), word("hi")], 100.0, fixed_measure).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text(), "hi");
    }

    #[test]
    fn overflow_flushes_to_a_new_line() {
        // "abcd" (40) + " " (10) + "efgh" (40) against a 50px budget.
        let lines = pack(
            vec![word("abcd"), space(), word("efgh")],
            50.0,
            fixed_measure,
        )
        .unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(), "abcd ");
        assert_eq!(lines[1].text(), "efgh");
        assert!(!lines[1].segments[0].kind.is_whitespace());
    }

    #[test]
    fn exact_fill_stays_on_the_current_line() {
        // 30 + 10 + 10 == 50 exactly; strict `>` keeps the last segment.
        let lines = pack(
            vec![word("abc"), space(), word("d")],
            50.0,
            fixed_measure,
        )
        .unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].width(), 50.0);
    }

    #[test]
    fn whitespace_never_leads_after_an_overflow_break() {
        // The run of spaces overflows the line; the break must not carry
        // the whitespace onto the next line.
        let wide_space = seg(SegmentKind::Whitespace, "    ");
        let lines = pack(
            vec![word("abcd"), wide_space, word("xy")],
            50.0,
            fixed_measure,
        )
        .unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].text(), "xy");
    }

    #[test]
    fn long_token_is_hard_split_within_budget() {
        let lines = pack(vec![word("abcdefghij")], 30.0, fixed_measure).unwrap();
        assert!(lines.len() >= 2);
        let rebuilt: String = lines.iter().map(|l| l.text()).collect();
        assert_eq!(rebuilt, "abcdefghij");
        for line in &lines {
            assert!(line.width() <= 30.0, "line {:?} overflows", line.text());
        }
    }

    #[test]
    fn hard_split_flushes_a_preceding_partial_line() {
        let lines = pack(
            vec![word("hi"), space(), word("abcdefghij")],
            40.0,
            fixed_measure,
        )
        .unwrap();
        assert_eq!(lines[0].text(), "hi ");
        let rebuilt: String = lines.iter().map(|l| l.text()).collect();
        assert_eq!(rebuilt, "hi abcdefghij");
    }

    #[test]
    fn trailing_partial_sub_token_seeds_the_last_line() {
        // 10 chars / 4-char budget: "abcd" "efgh" then "ij" trailing.
        let lines = pack(vec![word("abcdefghij")], 40.0, fixed_measure).unwrap();
        assert_eq!(
            lines.iter().map(|l| l.text()).collect::<Vec<_>>(),
            ["abcd", "efgh", "ij"]
        );
    }

    #[test]
    fn emoji_is_never_hard_split() {
        let emoji = Segment::new(SegmentKind::Emoji, "🎉", 60.0);
        let lines = pack(vec![emoji.clone()], 50.0, fixed_measure).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].segments[0], emoji);
    }

    #[test]
    fn packing_is_stateless_between_calls() {
        let segs = || vec![word("abcd"), space(), word("efgh")];
        let a = pack(segs(), 50.0, fixed_measure).unwrap();
        let b = pack(segs(), 50.0, fixed_measure).unwrap();
        assert_eq!(a, b);
    }
}
