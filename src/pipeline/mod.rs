//! Transcript-to-report pipeline.
//!
//! Stages run in a fixed order: phonetic normalization, report-type
//! classification, rule-layer extraction, then merge-and-validate against
//! the template. ML-extracted fields are optional input; the pipeline is
//! fully functional without them.

pub mod classify;
pub mod extract;
pub mod merge;
pub mod phonetic;

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::templates::report_templates;

pub use classify::{classify, Classification};
pub use extract::extract_fallback;
pub use merge::{merge_and_validate, missing_required_fields, parse_ai_fields};
pub use phonetic::{normalize, splice_grid, to_phonetic};

/// Field id to value. Ordered so serialized output is stable.
pub type FieldMap = BTreeMap<String, String>;

/// A classified, merged, validated report ready for encoding.
#[derive(Debug, Clone, Serialize)]
pub struct StructuredReport {
    pub report_type: String,
    pub confidence: f32,
    pub fields: FieldMap,
}

/// Run the whole pipeline over one transcript.
///
/// `ai_fields` is the already-parsed output of an ML extractor, if one ran;
/// pass `None` to structure the report from the rule layer alone.
pub fn structure_report(transcript: &str, ai_fields: Option<FieldMap>) -> StructuredReport {
    let normalized = phonetic::normalize(transcript);
    let classification = classify::classify(&normalized, report_templates());
    let rule_fields = extract::extract_fallback(transcript, &classification.report_type);
    let fields = merge::merge_and_validate(
        &ai_fields.unwrap_or_default(),
        &rule_fields,
        transcript,
        &classification.report_type,
    );

    info!(
        report_type = %classification.report_type,
        confidence = classification.confidence,
        fields = fields.len(),
        "structured transcript into report"
    );

    StructuredReport {
        report_type: classification.report_type,
        confidence: classification.confidence,
        fields,
    }
}
