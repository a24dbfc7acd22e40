//! Shared test helpers: a deterministic measurement fake and engine
//! builders used across integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use text_fit::{FitConfig, FitEngine, MeasureError, TextMeasurer, TextStyle};

/// Fixed-metric fake: every character advances half an em regardless of
/// style. Keeps expected widths trivially computable in tests.
pub struct HalfEmMeasurer;

impl TextMeasurer for HalfEmMeasurer {
    fn measure_px(&self, text: &str, style: &TextStyle) -> Result<f32, MeasureError> {
        Ok(text.chars().count() as f32 * 0.5 * style.size_px)
    }
}

pub fn default_engine() -> FitEngine {
    FitEngine::new(FitConfig::default()).with_measurer(Arc::new(HalfEmMeasurer))
}

pub fn engine_for(cfg: FitConfig) -> FitEngine {
    FitEngine::new(cfg).with_measurer(Arc::new(HalfEmMeasurer))
}
