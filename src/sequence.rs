use log::warn;

use crate::error::LayoutError;
use crate::fit::{FitEngine, LayoutSolution};

/// One fully laid-out animation frame.
///
/// Frames are produced in increasing reveal order and are meant to be
/// handed to the rendering backend one at a time and discarded.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Number of tokens of the original text revealed in this frame.
    pub reveal_count: usize,
    pub solution: LayoutSolution,
}

/// Lazy per-token reveal sequence.
///
/// Each frame re-runs the full fit search on a growing prefix of the
/// token stream; frames share no state beyond the running prefix, so
/// the sequence is deterministic and each frame is independently
/// recomputable.
pub struct FrameSequencer<'a> {
    engine: &'a FitEngine,
    tokens: Vec<String>,
    revealed: usize,
}

impl FitEngine {
    /// Start a reveal sequence over the whitespace-delimited tokens of
    /// `text`. Explicit line breaks are kept as their own tokens.
    pub fn sequence(&self, text: &str) -> FrameSequencer<'_> {
        FrameSequencer {
            engine: self,
            tokens: tokenize(text),
            revealed: 0,
        }
    }
}

impl FrameSequencer<'_> {
    /// Total number of reveal steps (including skippable empty prefixes).
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Drain the sequence applying the documented failure policy:
    /// frames with no renderable content are skipped with a warning,
    /// while any other failure aborts the whole sequence, since every
    /// later frame would fail the same way.
    pub fn collect_frames(self) -> Result<Vec<Frame>, LayoutError> {
        let mut frames = Vec::with_capacity(self.tokens.len());
        for result in self {
            match result {
                Ok(frame) => frames.push(frame),
                Err(LayoutError::EmptyContent) => {
                    warn!("skipping frame with no renderable content");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(frames)
    }
}

impl Iterator for FrameSequencer<'_> {
    type Item = Result<Frame, LayoutError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.revealed < self.tokens.len() {
            self.revealed += 1;
            let prefix = join_tokens(&self.tokens[..self.revealed]);
            if prefix.trim().is_empty() {
                continue;
            }
            let reveal_count = self.revealed;
            return Some(
                self.engine
                    .fit(&prefix)
                    .map(|solution| Frame {
                        reveal_count,
                        solution,
                    }),
            );
        }
        None
    }
}

/// Whitespace-delimited tokens with explicit `\n` break tokens.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for (idx, line) in text.split('\n').enumerate() {
        if idx > 0 {
            tokens.push("\n".to_string());
        }
        tokens.extend(line.split_whitespace().map(str::to_string));
    }
    tokens
}

/// Rebuild a prefix string, joining with single spaces and keeping
/// break tokens free of surrounding whitespace.
fn join_tokens(tokens: &[String]) -> String {
    let mut out = String::new();
    for token in tokens {
        if token == "\n" {
            while out.ends_with(' ') {
                out.pop();
            }
            out.push('\n');
        } else {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push(' ');
            }
            out.push_str(token);
        }
    }
    out
}
