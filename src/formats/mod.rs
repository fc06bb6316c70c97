pub mod datev_payroll;

use std::collections::HashMap;

use crate::error::{LohnkostenError, Result};
use crate::models::{CostField, ExtractedRow};
use crate::table::RawTable;

pub use datev_payroll::DatevPayrollV1;

/// Detection below this confidence is a hard stop, never a silent
/// fallback to the wrong format.
pub const MIN_CONFIDENCE: f64 = 0.6;

/// One parser variant's claim on a loaded table.
#[derive(Debug, Clone)]
pub struct DetectionCandidate {
    pub format_id: &'static str,
    pub confidence: f64,
    /// Observed header row, kept as diagnostic evidence.
    #[allow(dead_code)]
    pub columns: Vec<String>,
}

/// Output of a format parser. `period` is the "unknown" placeholder
/// until the orchestrator stamps the one from the banner line.
#[derive(Debug)]
pub struct ParsedCsv {
    pub format_id: &'static str,
    pub period: String,
    /// Which actual column each semantic field resolved to.
    #[allow(dead_code)]
    pub columns_used: HashMap<CostField, String>,
    pub rows: Vec<ExtractedRow>,
}

/// Capability contract per supported source format. The registry only
/// ever sees this trait, so a new format is a new type, not a new
/// branch in the pipeline.
pub trait FormatParser {
    fn format_id(&self) -> &'static str;
    fn detect(&self, table: &RawTable) -> DetectionCandidate;
    fn parse(&self, table: &RawTable) -> ParsedCsv;
}

#[derive(Debug)]
pub struct Detection {
    pub chosen: DetectionCandidate,
    /// All candidates, ranked by confidence (registration order on ties).
    #[allow(dead_code)]
    pub candidates: Vec<DetectionCandidate>,
}

/// Owned collection of the known format parsers. Registration order is
/// the deterministic tie-break for equal confidence.
pub struct Registry {
    parsers: Vec<Box<dyn FormatParser>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    pub fn with_default_formats() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(DatevPayrollV1));
        registry
    }

    pub fn register(&mut self, parser: Box<dyn FormatParser>) {
        self.parsers.push(parser);
    }

    pub fn detect_best(&self, table: &RawTable, min_confidence: f64) -> Result<Detection> {
        let mut candidates: Vec<DetectionCandidate> =
            self.parsers.iter().map(|p| p.detect(table)).collect();
        // Stable sort keeps registration order among equal scores.
        candidates.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let best = candidates.first().cloned().ok_or(LohnkostenError::NoSuitableFormat {
            best: 0.0,
            min: min_confidence,
        })?;
        if best.confidence < min_confidence {
            return Err(LohnkostenError::NoSuitableFormat {
                best: best.confidence,
                min: min_confidence,
            });
        }

        Ok(Detection {
            chosen: best,
            candidates,
        })
    }

    pub fn get_by_format_id(&self, format_id: &str) -> Result<&dyn FormatParser> {
        self.parsers
            .iter()
            .find(|p| p.format_id() == format_id)
            .map(|p| p.as_ref())
            .ok_or_else(|| LohnkostenError::UnknownFormat(format_id.to_string()))
    }
}
