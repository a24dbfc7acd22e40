//! Shrink-to-fit layout engine for short styled text.
//!
//! Renders-side concerns (pixels, bitmaps, encoders) live elsewhere;
//! this crate only answers the geometric question: given a canvas
//! budget, what is the largest font size at which a short piece of
//! text — optionally carrying lightweight markup and emoji — lays out
//! inside it, and where does every segment go.
//!
//! The pipeline runs strictly forward: raw text is classified into
//! typed, measured [`Segment`]s, packed greedily into [`Line`]s against
//! the width budget, and driven by the descending font-size scan in
//! [`FitEngine`] until a [`LayoutSolution`] satisfies both budgets.
//! Animation mode re-runs the whole pipeline per revealed token via
//! [`FrameSequencer`].
//!
//! Glyph metrics come from an injected [`TextMeasurer`]; the built-in
//! [`HeuristicMeasurer`] keeps the engine usable (and deterministic in
//! tests) without a platform font stack.

mod error;
mod fit;
mod measure;
mod pack;
mod segment;
mod sequence;

pub use error::LayoutError;
pub use fit::{FitConfig, FitEngine, LayoutSolution};
pub use measure::{
    HeuristicMeasurer, MeasureError, TextMeasurer, TextStyle, EMOJI_WIDTH_FACTOR,
};
pub use pack::{pack, Line, LineSegments};
pub use segment::{is_emoji_cluster, Segment, SegmentKind, Segmenter};
pub use sequence::{Frame, FrameSequencer};
