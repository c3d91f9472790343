//! Extraction merging and validation.
//!
//! The ML extractor is treated as untrusted input: any value carrying a
//! known prompt-example token is assumed to be contaminated by the few-shot
//! examples rather than read from the live transcript, and is replaced by
//! the rule-layer value (or emptied). After merging, per-report repairs
//! enforce cross-field consistency.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use super::FieldMap;
use crate::templates::template_for;

/// Literal tokens that appear in the few-shot prompt examples. An ML value
/// containing any of these verbatim is discarded as contamination.
const CONTAMINATION_TOKENS: &[&str] = &["RAZOR", "THUNDER", "18TWL", "purple smoke", "47.55"];

/// Echelon vocabulary for enemy-size estimates, smallest first.
const ECHELON_STRENGTH: &[(&str, u32)] =
    &[("team", 4), ("squad", 9), ("platoon", 30), ("company", 120)];

static BROAD_CALLSIGN_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"THIS IS ([A-Z][A-Z0-9\- ]+?)(?:,|\.|$)").unwrap(),
        Regex::new(r"([A-Z][A-Z0-9\- ]+?) CALLING").unwrap(),
        Regex::new(r"FROM ([A-Z][A-Z0-9\- ]+?)(?:,|\.|$)").unwrap(),
        Regex::new(r"CALL\s?SIGN ([A-Z][A-Z0-9\- ]+?)(?:,|\.|$)").unwrap(),
        Regex::new(r"^([A-Z][A-Z0-9\- ]+?) TO\b").unwrap(),
    ]
});

static GRID_SHAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{1,2}[A-Z]{1,3}[A-Z]{2}[0-9]+$").unwrap());

fn is_contaminated(value: &str) -> bool {
    CONTAMINATION_TOKENS.iter().any(|t| value.contains(t))
}

/// Merge ML-extracted fields with the rule layer and validate the result.
///
/// Precedence: uncontaminated ML value > rule value > empty string. Every
/// field the template declares is present in the output, empty if nothing
/// was found. Unknown report types pass fields through without completion.
pub fn merge_and_validate(
    ai_fields: &FieldMap,
    rule_fields: &FieldMap,
    transcript: &str,
    report_type: &str,
) -> FieldMap {
    let mut merged = FieldMap::new();

    for (id, value) in ai_fields {
        if !value.is_empty() && is_contaminated(value) {
            match rule_fields.get(id).filter(|v| !v.is_empty()) {
                Some(fallback) => {
                    warn!(field = %id, "contaminated extraction replaced by rule value");
                    merged.insert(id.clone(), fallback.clone());
                }
                None => {
                    warn!(field = %id, "contaminated extraction dropped, no rule value");
                    merged.insert(id.clone(), String::new());
                }
            }
        } else {
            merged.insert(id.clone(), value.clone());
        }
    }

    for (id, value) in rule_fields {
        let slot = merged.entry(id.clone()).or_default();
        if slot.is_empty() && !value.is_empty() {
            debug!(field = %id, "rule layer filled missing field");
            *slot = value.clone();
        }
    }

    if let Some(template) = template_for(report_type) {
        for field in template.fields {
            merged.entry(field.id.to_string()).or_default();
        }
    }

    if merged
        .get("reporting_unit")
        .map_or(true, |v| v.is_empty())
    {
        if let Some(callsign) = broad_callsign(transcript) {
            merged.insert("reporting_unit".to_string(), callsign);
        }
    }

    repair(report_type, &mut merged);
    merged
}

/// Wider callsign sweep than the rule layer, used only when merging still
/// left the reporting unit empty.
fn broad_callsign(transcript: &str) -> Option<String> {
    let upper = transcript.to_uppercase();
    for re in BROAD_CALLSIGN_RES.iter() {
        if let Some(caps) = re.captures(&upper) {
            let candidate = caps[1].trim().to_string();
            if candidate.len() > 2 && !candidate.chars().all(|c| c.is_ascii_digit()) {
                return Some(candidate);
            }
        }
    }
    None
}

fn parse_or_zero(fields: &FieldMap, id: &str) -> i64 {
    fields
        .get(id)
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(0)
}

fn repair(report_type: &str, fields: &mut FieldMap) {
    match report_type {
        "MEDEVAC" => repair_medevac(fields),
        "CONTACTREP" => repair_contactrep(fields),
        _ => {}
    }
    repair_universal(fields);
}

fn repair_medevac(fields: &mut FieldMap) {
    // Ventilator or trauma-team equipment implies a surgical patient, which
    // outranks a spoken precedence of "priority".
    let equipment = fields
        .get("special_equipment")
        .map(|v| v.to_lowercase())
        .unwrap_or_default();
    let precedence = fields
        .get("patient_precedence")
        .map(|v| v.trim().to_lowercase())
        .unwrap_or_default();
    if (equipment.contains("ventilator") || equipment.contains("trauma team"))
        && precedence == "priority"
    {
        warn!("upgrading patient precedence to urgent surgical from equipment");
        fields.insert("patient_precedence".to_string(), "Urgent surgical".to_string());
    }

    let total = parse_or_zero(fields, "number_patients");
    if total <= 0 {
        return;
    }
    let litter = parse_or_zero(fields, "number_litter");
    let ambulatory = parse_or_zero(fields, "number_ambulatory");
    if litter + ambulatory == total {
        return;
    }

    let (litter, ambulatory) = if litter > 0 && ambulatory == 0 && litter <= total {
        (litter, total - litter)
    } else if ambulatory > 0 && litter == 0 && ambulatory <= total {
        (total - ambulatory, ambulatory)
    } else {
        warn!(
            total,
            litter, ambulatory, "inconsistent patient counts, applying default split"
        );
        let litter = (total / 2).max(1);
        (litter, total - litter)
    };
    fields.insert("number_litter".to_string(), litter.to_string());
    fields.insert("number_ambulatory".to_string(), ambulatory.to_string());
}

fn repair_contactrep(fields: &mut FieldMap) {
    let Some(size) = fields.get("enemy_size") else {
        return;
    };
    if size.is_empty() || size.chars().any(|c| c.is_ascii_digit()) {
        return;
    }
    let lower = size.to_lowercase();
    for (echelon, strength) in ECHELON_STRENGTH {
        if lower.contains(echelon) {
            let annotated = format!("{size} (~{strength} personnel)");
            fields.insert("enemy_size".to_string(), annotated);
            return;
        }
    }
}

/// Every field id the encoder's callsign chain consults.
const CALLSIGN_FIELD_IDS: &[&str] = &["reporting_unit", "callsign", "unit", "from_unit"];

fn repair_universal(fields: &mut FieldMap) {
    for id in CALLSIGN_FIELD_IDS {
        let Some(unit) = fields.get(*id) else { continue };
        if unit.chars().any(|c| c.is_ascii_lowercase()) {
            let upper = unit.to_uppercase();
            fields.insert((*id).to_string(), upper);
        }
    }

    for id in ["location", "grid", "pickup_location"] {
        let Some(value) = fields.get(id) else { continue };
        if value.is_empty() {
            continue;
        }
        let compact: String = value
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();
        if GRID_SHAPE_RE.is_match(&compact) && compact != *value {
            fields.insert(id.to_string(), compact);
        }
    }
}

/// Parse the raw text an ML extractor returned into a field map.
///
/// Tolerates markdown code fences and leading/trailing prose around the
/// JSON object. Anything unparseable yields an empty map rather than an
/// error; the rule layer then carries the report alone.
pub fn parse_ai_fields(raw: &str) -> FieldMap {
    let body = if let Some(start) = raw.find("```json") {
        let rest = &raw[start + 7..];
        rest.find("```").map_or(rest, |end| &rest[..end])
    } else if let Some(start) = raw.find("```") {
        let rest = &raw[start + 3..];
        rest.find("```").map_or(rest, |end| &rest[..end])
    } else {
        match (raw.find('{'), raw.rfind('}')) {
            (Some(open), Some(close)) if close > open => &raw[open..=close],
            _ => raw,
        }
    };

    match serde_json::from_str::<serde_json::Value>(body.trim()) {
        Ok(serde_json::Value::Object(map)) => map
            .into_iter()
            .map(|(id, value)| {
                let text = match value {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                };
                (id, text)
            })
            .collect(),
        Ok(_) => {
            warn!("extractor output was valid JSON but not an object");
            FieldMap::new()
        }
        Err(error) => {
            warn!(%error, "extractor output was not parseable JSON");
            FieldMap::new()
        }
    }
}

/// Labels of required template fields still empty after merging.
pub fn missing_required_fields(report_type: &str, fields: &FieldMap) -> Vec<&'static str> {
    let Some(template) = template_for(report_type) else {
        return Vec::new();
    };
    template
        .fields
        .iter()
        .filter(|f| f.required && fields.get(f.id).map_or(true, |v| v.is_empty()))
        .map(|f| f.label)
        .collect()
}
