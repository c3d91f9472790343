//! Report-type classification via weighted keyword scoring.
//!
//! Deterministic given the indicator table: ties break toward the first
//! type in table order, and the table order matches the template table.

use serde::Serialize;

use crate::templates::ReportTemplate;

/// Result of classifying a transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub report_type: String,
    pub confidence: f32,
}

struct ReportIndicators {
    code: &'static str,
    keywords: &'static [&'static str],
    priority_indicators: &'static [&'static str],
    weight: f32,
}

/// Keyword indicators per report type. Weights bias toward the report
/// types whose traffic is most time-critical.
static INDICATORS: &[ReportIndicators] = &[
    ReportIndicators {
        code: "MEDEVAC",
        keywords: &[
            "casualty",
            "wounded",
            "injured",
            "medevac",
            "medical evacuation",
            "nine line",
            "9 line",
            "patient",
            "urgent surgical",
            "priority patient",
            "litter",
            "ambulatory",
            "ventilator",
            "bleeding",
        ],
        priority_indicators: &["urgent", "flash", "immediate", "critical"],
        weight: 2.0,
    },
    ReportIndicators {
        code: "CONTACTREP",
        keywords: &[
            "enemy contact",
            "troops in contact",
            "engaged",
            "receiving fire",
            "contact report",
            "hostile",
            "enemy activity",
            "under fire",
            "engagement",
        ],
        priority_indicators: &["immediate", "troops in contact", "casualty", "under fire"],
        weight: 2.0,
    },
    ReportIndicators {
        code: "SITREP",
        keywords: &[
            "situation report",
            "sitrep",
            "status update",
            "current situation",
            "nothing to report",
            "all quiet",
            "routine",
            "normal operations",
        ],
        priority_indicators: &["routine", "no change"],
        weight: 0.5,
    },
    ReportIndicators {
        code: "SPOTREP",
        keywords: &[
            "spot report",
            "spotrep",
            "observed",
            "sighting",
            "surveillance",
            "enemy movement",
            "vehicle spotted",
            "personnel observed",
        ],
        priority_indicators: &["immediate", "priority"],
        weight: 1.0,
    },
    ReportIndicators {
        code: "SALUTE",
        keywords: &[
            "salute report",
            "enemy observation",
            "size",
            "activity",
            "location",
            "unit",
            "equipment",
        ],
        priority_indicators: &["priority", "immediate"],
        weight: 1.2,
    },
    ReportIndicators {
        code: "PATROLREP",
        keywords: &[
            "patrol report",
            "patrolrep",
            "patrol complete",
            "returned to base",
            "route clear",
            "debrief",
        ],
        priority_indicators: &["priority"],
        weight: 0.8,
    },
];

/// Fallback when nothing in the transcript resembles a known report.
const DEFAULT_TYPE: &str = "SITREP";
const DEFAULT_CONFIDENCE: f32 = 0.3;

/// Classify a transcript against the known report templates.
///
/// Scoring: per-type keyword hits weighted by the type's weight, +0.5 per
/// priority-indicator phrase, normalized by keyword-list length. The
/// winner's confidence is `min(score / 2, 1)`. A winner below 0.3 falls
/// back to a literal report-code substring match at 0.8. If no keyword
/// fires for any type, the inert default is ("SITREP", 0.3).
pub fn classify(transcript: &str, templates: &[ReportTemplate]) -> Classification {
    let lower = transcript.to_lowercase();

    let mut best: Option<(&'static str, f32)> = None;
    let mut any_keyword_fired = false;

    for indicators in INDICATORS {
        if !templates.iter().any(|t| t.code == indicators.code) {
            continue;
        }

        let mut score = 0.0f32;
        let mut keyword_matches = 0usize;

        for keyword in indicators.keywords {
            if lower.contains(keyword) {
                keyword_matches += 1;
                score += indicators.weight;
            }
        }
        for phrase in indicators.priority_indicators {
            if lower.contains(phrase) {
                score += 0.5;
            }
        }

        let normalized = if keyword_matches > 0 {
            any_keyword_fired = true;
            score / indicators.keywords.len() as f32
        } else {
            0.0
        };

        // Strictly-greater keeps the first type on ties.
        match best {
            Some((_, top)) if normalized <= top => {}
            _ => best = Some((indicators.code, normalized)),
        }
    }

    if !any_keyword_fired {
        return Classification {
            report_type: DEFAULT_TYPE.to_string(),
            confidence: DEFAULT_CONFIDENCE,
        };
    }

    let (code, score) = best.unwrap_or((DEFAULT_TYPE, 0.0));
    let confidence = (score / 2.0).clamp(0.0, 1.0);

    if confidence < 0.3 {
        for template in templates {
            if lower.contains(&template.code.to_lowercase()) {
                return Classification {
                    report_type: template.code.to_string(),
                    confidence: 0.8,
                };
            }
        }
    }

    Classification {
        report_type: code.to_string(),
        confidence,
    }
}
