//! Backend-agnostic draw commands for `text_fit` layout solutions.
//!
//! The layout engine only decides sizes and line membership; this crate
//! applies the presentation rules — horizontal justification, vertical
//! centering, the single-line top-pad special case — and emits
//! positioned commands a rendering backend can replay. Commands are
//! serializable so frames can cross a process boundary as JSON.

use log::debug;
use serde::{Deserialize, Serialize};
use text_fit::{FitConfig, Frame, LayoutSolution, SegmentKind};

/// Approximate ascent as a fraction of the font size, used to place
/// text baselines within a line box.
const ASCENT_RATIO: f32 = 0.78;

/// Style class mirrored from the layout crate in serializable form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleKind {
    Plain,
    Bold,
    Italic,
    BoldItalic,
    Strikethrough,
    Monospace,
    Emoji,
    Whitespace,
}

impl From<SegmentKind> for StyleKind {
    fn from(value: SegmentKind) -> Self {
        match value {
            SegmentKind::Plain => Self::Plain,
            SegmentKind::Bold => Self::Bold,
            SegmentKind::Italic => Self::Italic,
            SegmentKind::BoldItalic => Self::BoldItalic,
            SegmentKind::Strikethrough => Self::Strikethrough,
            SegmentKind::Monospace => Self::Monospace,
            SegmentKind::Emoji => Self::Emoji,
            SegmentKind::Whitespace => Self::Whitespace,
        }
    }
}

/// One positioned styled text run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextCommand {
    /// Left edge of the run.
    pub x: f32,
    /// Top of the line box.
    pub y: f32,
    /// Baseline for glyph placement.
    pub baseline_y: f32,
    pub text: String,
    pub style: StyleKind,
    pub font_size: f32,
    /// Measured advance of the run.
    pub width: f32,
}

/// One positioned emoji bitmap lookup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmojiCommand {
    /// Left edge of the emoji box.
    pub x: f32,
    /// Top of the line box.
    pub y: f32,
    /// The emoji grapheme cluster to look up.
    pub cluster: String,
    /// Square edge length of the emoji box.
    pub size: f32,
}

/// Backend draw command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DrawCommand {
    Text(TextCommand),
    Emoji(EmojiCommand),
}

/// One composed canvas, ready for a rendering backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub font_size: f32,
    pub line_height: f32,
    /// Carried through from the layout solution; an overflowing frame
    /// came from the floor-size fallback and may paint outside budgets.
    pub overflowed: bool,
    /// Reveal step for animation sequences, absent for single images.
    pub reveal_count: Option<usize>,
    pub commands: Vec<DrawCommand>,
}

impl RenderFrame {
    /// Serialize for an out-of-process backend.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Position a layout solution on its canvas.
///
/// Horizontal rule: a line with at most one content segment is
/// left-aligned with natural advances; otherwise content segments are
/// justified with equal gaps of `(available - sum of content widths) /
/// (content count - 1)` and whitespace segments are absorbed into the
/// gaps. Vertical rule: the block is centered, except that a
/// single-line layout is top-padded when the config says so.
pub fn compose(solution: &LayoutSolution, cfg: &FitConfig) -> RenderFrame {
    let top = if solution.lines.len() == 1 && cfg.single_line_top_padding {
        cfg.padding
    } else {
        ((cfg.height - solution.block_height()) / 2.0).max(0.0)
    };

    let mut commands = Vec::new();
    for (index, line) in solution.lines.iter().enumerate() {
        let y = top + index as f32 * solution.line_height;
        let baseline_y = y + solution.font_size * ASCENT_RATIO;
        let content_count = line.content_count();

        if content_count <= 1 {
            let mut x = cfg.padding;
            for segment in &line.segments {
                if segment.kind.is_content() {
                    commands.push(draw_segment(segment, x, y, baseline_y, solution.font_size));
                }
                x += segment.width;
            }
        } else {
            let content_width: f32 = line
                .segments
                .iter()
                .filter(|s| s.kind.is_content())
                .map(|s| s.width)
                .sum();
            let gaps = (content_count - 1) as f32;
            let gap = (cfg.available_width() - content_width) / gaps;
            let mut x = cfg.padding;
            for segment in line.segments.iter().filter(|s| s.kind.is_content()) {
                commands.push(draw_segment(segment, x, y, baseline_y, solution.font_size));
                x += segment.width + gap;
            }
        }
    }

    debug!(
        "composed frame: lines={} commands={} top={:.1}",
        solution.lines.len(),
        commands.len(),
        top
    );
    RenderFrame {
        canvas_width: cfg.width,
        canvas_height: cfg.height,
        font_size: solution.font_size,
        line_height: solution.line_height,
        overflowed: solution.overflowed,
        reveal_count: None,
        commands,
    }
}

/// Position one animation frame, keeping its reveal step.
pub fn compose_frame(frame: &Frame, cfg: &FitConfig) -> RenderFrame {
    let mut rendered = compose(&frame.solution, cfg);
    rendered.reveal_count = Some(frame.reveal_count);
    rendered
}

/// Position an ordered reveal sequence.
pub fn compose_sequence(frames: &[Frame], cfg: &FitConfig) -> Vec<RenderFrame> {
    frames.iter().map(|f| compose_frame(f, cfg)).collect()
}

fn draw_segment(
    segment: &text_fit::Segment,
    x: f32,
    y: f32,
    baseline_y: f32,
    font_size: f32,
) -> DrawCommand {
    if segment.kind == SegmentKind::Emoji {
        DrawCommand::Emoji(EmojiCommand {
            x,
            y,
            cluster: segment.content.clone(),
            size: segment.width,
        })
    } else {
        DrawCommand::Text(TextCommand {
            x,
            y,
            baseline_y,
            text: segment.content.clone(),
            style: segment.kind.into(),
            font_size,
            width: segment.width,
        })
    }
}
