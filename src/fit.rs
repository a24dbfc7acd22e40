use std::sync::Arc;

use log::{debug, warn};

use crate::error::LayoutError;
use crate::measure::{HeuristicMeasurer, TextMeasurer, PROBE_FONT_SIZE};
use crate::pack::{pack, Line};
use crate::segment::{Segment, SegmentKind, Segmenter};

/// Configuration surface consumed by the fit search.
///
/// The two `bool` fields are aesthetic policies carried over from the
/// shapes this engine was built for; they are knobs, not correctness
/// requirements, and either can be switched off.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitConfig {
    /// Canvas width in pixels.
    pub width: f32,
    /// Canvas height in pixels.
    pub height: f32,
    /// Padding applied on every edge; the usable budget on each axis is
    /// the canvas dimension minus twice this value.
    pub padding: f32,
    /// Line height as a multiple of the font size.
    pub line_height_multiplier: f32,
    /// Largest candidate font size, where the scan starts.
    pub font_ceiling: f32,
    /// Smallest candidate font size, where the scan gives up.
    pub font_floor: f32,
    /// Linear decrement between candidates.
    pub font_step: f32,
    /// Prefer the largest size at which no logical source line wraps;
    /// wrapped layouts are only used when no such size exists.
    pub prefer_unwrapped: bool,
    /// When the input is exactly four plain words, require the winning
    /// layout to occupy exactly two lines.
    pub four_word_two_lines: bool,
    /// Top-pad (instead of vertically centering) single-line layouts.
    /// Consumed by the render composer, carried here so one config value
    /// describes the whole presentation.
    pub single_line_top_padding: bool,
}

impl FitConfig {
    /// Convenience for a canvas size with the default policy surface.
    pub fn for_canvas(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Usable horizontal budget.
    pub fn available_width(&self) -> f32 {
        self.width - 2.0 * self.padding
    }

    /// Usable vertical budget.
    pub fn available_height(&self) -> f32 {
        self.height - 2.0 * self.padding
    }

    fn validate(&self) -> Result<(), LayoutError> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(LayoutError::InvalidInput("canvas dimensions must be positive"));
        }
        if !(self.padding >= 0.0) || self.available_width() <= 0.0 || self.available_height() <= 0.0
        {
            return Err(LayoutError::InvalidInput("padding leaves no usable canvas"));
        }
        if !(self.line_height_multiplier > 0.0) {
            return Err(LayoutError::InvalidInput(
                "line height multiplier must be positive",
            ));
        }
        if !(self.font_floor > 0.0 && self.font_ceiling >= self.font_floor) {
            return Err(LayoutError::InvalidInput("font size range is empty"));
        }
        if !(self.font_step > 0.0) {
            return Err(LayoutError::InvalidInput("font step must be positive"));
        }
        Ok(())
    }
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            width: 512.0,
            height: 512.0,
            padding: 20.0,
            line_height_multiplier: 1.2,
            font_ceiling: 200.0,
            font_floor: 10.0,
            font_step: 2.0,
            prefer_unwrapped: true,
            four_word_two_lines: true,
            single_line_top_padding: true,
        }
    }
}

/// Output of the fit search: a font size plus its validated line block.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutSolution {
    /// Winning font size in pixels.
    pub font_size: f32,
    /// Vertical advance per line.
    pub line_height: f32,
    /// Packed lines, in source order.
    pub lines: Vec<Line>,
    /// Set when no candidate size satisfied the budgets and the
    /// floor-size layout was retained; such a layout may overflow.
    pub overflowed: bool,
}

impl LayoutSolution {
    /// Total block height.
    pub fn block_height(&self) -> f32 {
        self.lines.len() as f32 * self.line_height
    }

    /// Width of the widest line.
    pub fn widest_line(&self) -> f32 {
        self.lines.iter().map(Line::width).fold(0.0, f32::max)
    }
}

/// Shrink-to-fit search over a descending font-size scan.
///
/// Candidate sizes run from the ceiling down to the floor in fixed
/// steps. Each probe rebuilds segments and lines from scratch, so no
/// state leaks between sizes. The scan prefers, in order: the largest
/// size at which no logical line wraps, the largest size whose wrapped
/// layout still fits both budgets, and finally the floor-size layout
/// flagged as overflowing. The search therefore always produces a
/// usable solution for non-empty input.
#[derive(Clone, Debug)]
pub struct FitEngine {
    cfg: FitConfig,
    segmenter: Segmenter,
}

impl FitEngine {
    /// Create an engine using the built-in heuristic measurer.
    pub fn new(cfg: FitConfig) -> Self {
        Self {
            cfg,
            segmenter: Segmenter::new(Arc::new(HeuristicMeasurer)),
        }
    }

    /// Install a platform measurement service.
    pub fn with_measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        let family = self.segmenter.family().to_string();
        self.segmenter = Segmenter::new(measurer).with_family(family);
        self
    }

    /// Override the base font family used for measurement.
    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.segmenter = self.segmenter.with_family(family);
        self
    }

    pub fn config(&self) -> &FitConfig {
        &self.cfg
    }

    pub fn segmenter(&self) -> &Segmenter {
        &self.segmenter
    }

    /// Segment and pack `text` at one candidate font size.
    ///
    /// Each logical source line is packed independently; a blank source
    /// line yields an explicit empty line.
    fn layout_at(&self, text: &str, font_size: f32) -> Result<Vec<Line>, LayoutError> {
        let max_width = self.cfg.available_width();
        let mut lines = Vec::new();
        for source_line in text.split('\n') {
            if source_line.trim().is_empty() {
                lines.push(Line::empty());
                continue;
            }
            let segments = self.segmenter.segment(source_line, font_size)?;
            let packed = pack(segments, max_width, |sub, kind| {
                self.segmenter.measure(sub, kind, font_size)
            })?;
            lines.extend(packed);
        }
        Ok(lines)
    }

    /// Find the largest font size whose layout satisfies the budgets.
    pub fn fit(&self, text: &str) -> Result<LayoutSolution, LayoutError> {
        self.cfg.validate()?;
        let avail_w = self.cfg.available_width();
        let avail_h = self.cfg.available_height();
        let logical_lines = text.split('\n').count();
        let require_two_lines =
            self.cfg.four_word_two_lines && text.split_whitespace().count() == 4;

        // Largest budget-satisfying candidate seen, kept as the fallback
        // when the preferred shape (unwrapped, or two lines for the
        // four-word rule) is never reached.
        let mut fitting_fallback: Option<LayoutSolution> = None;
        let mut last_scanned: Option<LayoutSolution> = None;
        let mut checked_content = false;

        let mut font_size = self.cfg.font_ceiling;
        while font_size >= self.cfg.font_floor {
            let lines = self.layout_at(text, font_size)?;
            if !checked_content {
                if lines.iter().all(Line::is_empty) {
                    return Err(LayoutError::EmptyContent);
                }
                checked_content = true;
            }

            let line_height = font_size * self.cfg.line_height_multiplier;
            let block_height = lines.len() as f32 * line_height;
            let widest = lines.iter().map(Line::width).fold(0.0, f32::max);
            let fits = block_height <= avail_h && widest <= avail_w;
            debug!(
                "fit probe: size={} lines={} widest={:.1} block_height={:.1} fits={}",
                font_size,
                lines.len(),
                widest,
                block_height,
                fits
            );

            let solution = LayoutSolution {
                font_size,
                line_height,
                lines,
                overflowed: false,
            };

            if fits {
                let accepted = if require_two_lines {
                    solution.lines.len() == 2
                } else {
                    !self.cfg.prefer_unwrapped || solution.lines.len() == logical_lines
                };
                if accepted {
                    if let Some(single) = single_plain_token(&solution) {
                        let content = single.content.clone();
                        return self.fit_single_token(&content);
                    }
                    return Ok(solution);
                }
                if fitting_fallback.is_none() {
                    fitting_fallback = Some(solution);
                }
            } else {
                last_scanned = Some(solution);
            }

            font_size -= self.cfg.font_step;
        }

        if let Some(best) = fitting_fallback {
            return Ok(best);
        }
        let mut fallback = last_scanned
            .ok_or(LayoutError::InvalidInput("font size range yields no candidates"))?;
        warn!(
            "no font size in [{}, {}] fits the canvas; retaining floor-size layout",
            self.cfg.font_floor, self.cfg.font_ceiling
        );
        fallback.overflowed = true;
        Ok(fallback)
    }

    /// Analytic sizing for a single short token.
    ///
    /// A scan winner that collapses to one plain word under-uses the
    /// canvas, so its size is discarded and replaced by the smaller of
    /// the height-implied size and the size that scales a fixed-size
    /// probe measurement to exactly fill the available width.
    fn fit_single_token(&self, content: &str) -> Result<LayoutSolution, LayoutError> {
        let avail_w = self.cfg.available_width();
        let avail_h = self.cfg.available_height();

        let height_implied = avail_h / self.cfg.line_height_multiplier;
        let probe_width = self
            .segmenter
            .measure(content, SegmentKind::Plain, PROBE_FONT_SIZE)?;
        let width_implied = if probe_width > 0.0 {
            avail_w * PROBE_FONT_SIZE / probe_width
        } else {
            height_implied
        };
        let font_size = height_implied.min(width_implied).floor().max(1.0);
        debug!(
            "single-token analytic size: height_implied={:.1} width_implied={:.1} chosen={}",
            height_implied, width_implied, font_size
        );

        let width = self
            .segmenter
            .measure(content, SegmentKind::Plain, font_size)?;
        let mut line = Line::empty();
        line.segments
            .push(Segment::new(SegmentKind::Plain, content, width));
        Ok(LayoutSolution {
            font_size,
            line_height: font_size * self.cfg.line_height_multiplier,
            lines: vec![line],
            overflowed: false,
        })
    }
}

/// The degenerate shape: exactly one line holding one plain segment.
fn single_plain_token(solution: &LayoutSolution) -> Option<&Segment> {
    let [line] = solution.lines.as_slice() else {
        return None;
    };
    let [segment] = line.segments.as_slice() else {
        return None;
    };
    (segment.kind == SegmentKind::Plain).then_some(segment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::{MeasureError, TextStyle};

    /// Every character is half an em wide, independent of style.
    struct HalfEm;

    impl TextMeasurer for HalfEm {
        fn measure_px(&self, text: &str, style: &TextStyle) -> Result<f32, MeasureError> {
            Ok(text.chars().count() as f32 * 0.5 * style.size_px)
        }
    }

    fn engine() -> FitEngine {
        FitEngine::new(FitConfig::default()).with_measurer(Arc::new(HalfEm))
    }

    #[test]
    fn two_words_land_on_one_line_at_the_largest_unwrapped_size() {
        // 512x512 canvas, padding 20: budgets are 472 on both axes.
        // "HAPPY BIRTHDAY" is 14 chars = 7em, so one line fits when
        // 7 * size <= 472; the descending scan lands on 66.
        let solution = engine().fit("HAPPY BIRTHDAY").unwrap();
        assert_eq!(solution.font_size, 66.0);
        assert!(!solution.overflowed);
        assert_eq!(solution.lines.len(), 1);
        let segs = &solution.lines[0].segments;
        assert_eq!(segs.len(), 3);
        assert_eq!(
            (segs[0].kind, segs[0].content.as_str()),
            (SegmentKind::Plain, "HAPPY")
        );
        assert_eq!(
            (segs[1].kind, segs[1].content.as_str()),
            (SegmentKind::Whitespace, " ")
        );
        assert_eq!(
            (segs[2].kind, segs[2].content.as_str()),
            (SegmentKind::Plain, "BIRTHDAY")
        );
    }

    #[test]
    fn single_word_takes_the_analytic_branch() {
        // Height-implied: 472 / 1.2 = 393.33. Width-implied: a 100px
        // probe of "HELLO" measures 250, so 472 * 100 / 250 = 188.8.
        // The winner is the floor of the minimum, not a scan value.
        let solution = engine().fit("HELLO").unwrap();
        assert_eq!(solution.font_size, 188.0);
        assert_eq!(solution.lines.len(), 1);
        assert_eq!(solution.lines[0].segments.len(), 1);
    }

    #[test]
    fn four_words_occupy_exactly_two_lines() {
        let solution = engine().fit("AA BB CC DD").unwrap();
        assert_eq!(solution.lines.len(), 2);
        assert!(!solution.overflowed);
        assert!(solution.widest_line() <= 472.0);
        assert!(solution.block_height() <= 472.0);
    }

    #[test]
    fn four_word_rule_is_a_knob() {
        let mut cfg = FitConfig::default();
        cfg.four_word_two_lines = false;
        let solution = FitEngine::new(cfg)
            .with_measurer(Arc::new(HalfEm))
            .fit("AA BB CC DD")
            .unwrap();
        // Without the shaping rule the unwrapped single line wins.
        assert_eq!(solution.lines.len(), 1);
    }

    #[test]
    fn wrapped_fit_is_used_when_no_unwrapped_size_exists() {
        // Long enough that a single rendered line overflows the width
        // budget even at the floor size, forcing a wrapped winner.
        let text = "pack my box with five dozen liquor jugs and then pack another \
                    box with five dozen liquor jugs for the long road ahead tonight";
        let solution = engine().fit(text).unwrap();
        assert!(!solution.overflowed);
        assert!(solution.lines.len() > 1);
        assert!(solution.widest_line() <= 472.0);
        assert!(solution.block_height() <= 472.0);
    }

    #[test]
    fn floor_fallback_is_flagged_and_never_an_error() {
        let mut cfg = FitConfig::default();
        cfg.width = 40.0;
        cfg.height = 40.0;
        cfg.padding = 2.0;
        let solution = FitEngine::new(cfg)
            .with_measurer(Arc::new(HalfEm))
            .fit("overflowing content that cannot fit")
            .unwrap();
        assert!(solution.overflowed);
        assert_eq!(solution.font_size, 10.0);
    }

    #[test]
    fn blank_source_line_yields_an_explicit_empty_line() {
        let solution = engine().fit("up\n\ndown").unwrap();
        assert_eq!(solution.lines.len(), 3);
        assert!(solution.lines[1].is_empty());
        assert_eq!(solution.lines[0].text(), "up");
        assert_eq!(solution.lines[2].text(), "down");
    }

    #[test]
    fn whitespace_only_input_is_empty_content() {
        for text in ["", "   ", " \n\t "] {
            assert_eq!(engine().fit(text), Err(LayoutError::EmptyContent), "{text:?}");
        }
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let mut cfg = FitConfig::default();
        cfg.padding = 300.0;
        assert!(matches!(
            FitEngine::new(cfg).fit("hi"),
            Err(LayoutError::InvalidInput(_))
        ));

        let mut cfg = FitConfig::default();
        cfg.font_floor = 0.0;
        assert!(matches!(
            FitEngine::new(cfg).fit("hi"),
            Err(LayoutError::InvalidInput(_))
        ));
    }

    #[test]
    fn measurement_failure_aborts_the_search() {
        struct Unreachable;
        impl TextMeasurer for Unreachable {
            fn measure_px(&self, _: &str, _: &TextStyle) -> Result<f32, MeasureError> {
                Err(MeasureError::Unavailable("font service down".into()))
            }
        }
        let result = FitEngine::new(FitConfig::default())
            .with_measurer(Arc::new(Unreachable))
            .fit("hi");
        assert!(matches!(result, Err(LayoutError::Measurement(_))));
    }

    #[test]
    fn solutions_fit_budgets_unless_flagged() {
        let e = engine();
        for text in ["one", "one two three", "a\nb\nc", "🎉 party 🎉"] {
            let solution = e.fit(text).unwrap();
            if !solution.overflowed {
                assert!(solution.widest_line() <= 472.0, "{text}");
                assert!(solution.block_height() <= 472.0, "{text}");
            }
        }
    }
}
