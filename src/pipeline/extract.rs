//! Rule-layer field extraction.
//!
//! Regex/keyword extraction of the mandatory field set, used as the
//! deterministic fallback when the ML extractor is absent, wrong, or
//! contaminated. Missing fields are simply absent from the returned map;
//! the merger turns absence into present-but-empty per the template.

use std::sync::LazyLock;

use regex::Regex;

use super::phonetic;
use super::FieldMap;
use crate::templates::template_for;

/// Callsign shapes: a word followed by one or more number groups,
/// "Warhawk 2-1" or the ASR-mangled "Warhawk, 2, 1".
const CALLSIGN_BODY: &str = r"[A-Za-z]+(?:[\s,]*[\-]?\s*\d+)+";

static CALLSIGN_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(&format!(
            r"(?i)(?:this is|i'?m|we'?re)[\s,]+({CALLSIGN_BODY})"
        ))
        .unwrap(),
        Regex::new(&format!(r"(?i)(?:callsign|call sign)[\s,]+({CALLSIGN_BODY})")).unwrap(),
        Regex::new(&format!(r"^\s*({CALLSIGN_BODY})")).unwrap(),
    ]
});

static GRID_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // Mixed digits and words after "grid"
        Regex::new(r"(?i)grid[\s:]+([\d][\d\s,]*[A-Za-z][A-Za-z\s,\-]*[\d][\d\s,]*)").unwrap(),
        // Already-compact form
        Regex::new(r"(?i)grid[\s:]+([0-9A-Za-z]+)").unwrap(),
        Regex::new(r"(?i)(?:location|position|at)\s+grid\s+([\d\sA-Za-z,]+)").unwrap(),
    ]
});

static FREQ_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)(?:freq|frequency|radio|channel)(?:\s+is)?\s+(\d+(?:\s*,\s*\d+)*(?:\.\d+)?)")
            .unwrap(),
        Regex::new(r"(?i)\bon\s+(\d+(?:\.\d+)?)\s*(?:mhz|megahertz)").unwrap(),
    ]
});

static PATIENT_COUNT_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)(\d+)\s+(?:casualties|casualty|patients?|wounded|down|injured|hurt)\b")
            .unwrap(),
        Regex::new(r"(?i)(\d+)\s+urgent\s+surgical").unwrap(),
    ]
});

static PRECEDENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s+urgent\s+surgical").unwrap());

static AMBULATORY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s+(?:can\s+walk|walking(?:\s+wounded)?|ambulatory)").unwrap()
});

const SMOKE_COLORS: &str = "purple|red|green|yellow|blue|white|orange|violet";

static MARKING_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)mark(?:ed|ing)?(?:\s+with)?\s+(\w+)\s+smoke").unwrap(),
        Regex::new(&format!(r"(?i)\b({SMOKE_COLORS})\s+smoke\b")).unwrap(),
        Regex::new(&format!(r"(?i)\bsmoke\s+({SMOKE_COLORS})\b")).unwrap(),
        Regex::new(r"(?i)(?:pop|throw|use)\s+(\w+)\s+smoke").unwrap(),
    ]
});

/// Equipment vocabulary; each entry is (canonical name, keyword regex).
static EQUIPMENT_RES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        (
            "Ventilator",
            Regex::new(r"(?i)\b(?:ventilator|vent|breathing support)\b").unwrap(),
        ),
        ("Hoist", Regex::new(r"(?i)\b(?:hoist|winch|cable)\b").unwrap()),
        (
            "Extraction",
            Regex::new(r"(?i)\bextraction(?:\s+(?:equipment|gear))?\b").unwrap(),
        ),
    ]
});

/// Security codes in contract order: N before P before E before X.
/// First matching code wins.
const SECURITY_KEYWORDS: &[(&str, &[&str])] = &[
    ("N", &["no enemy", "cold lz", "secure", "clear"]),
    ("P", &["possible enemy", "unknown", "not sure"]),
    ("E", &["enemy", "hot lz", "troops", "contact"]),
    ("X", &["heavy contact", "need escort", "under fire"]),
];

fn first_capture<'a>(patterns: &[Regex], text: &'a str) -> Option<regex::Match<'a>> {
    patterns.iter().find_map(|re| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
    })
}

fn normalize_callsign(raw: &str) -> String {
    static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[,\s]+").unwrap());
    SEPARATORS
        .replace_all(raw.trim(), " ")
        .trim()
        .to_uppercase()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

fn contains_phonetic_word(text: &str) -> bool {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .any(|token| phonetic::splice_grid(token).len() == 1 && token.len() > 1)
}

/// Extract the field set for `report_type` from a raw transcript using
/// regex pattern families only. Never fails; fields that cannot be found
/// are absent from the returned map.
pub fn extract_fallback(transcript: &str, report_type: &str) -> FieldMap {
    let mut fields = FieldMap::new();

    if let Some(m) = first_capture(&CALLSIGN_RES, transcript) {
        let callsign = normalize_callsign(m.as_str());
        if callsign.len() > 2 && !callsign.chars().all(|c| c.is_ascii_digit()) {
            fields.insert("reporting_unit".to_string(), callsign);
        }
    }

    if let Some(m) = first_capture(&GRID_RES, transcript) {
        let raw = m.as_str();
        let grid = if raw.contains(',') || contains_phonetic_word(raw) {
            phonetic::splice_grid(raw)
        } else {
            raw.to_uppercase().split_whitespace().collect()
        };
        if !grid.is_empty() {
            fields.insert("location".to_string(), grid);
        }
    }

    if let Some(m) = first_capture(&FREQ_RES, transcript) {
        // normalize() collapses a comma-separated digit run into one number
        let freq = phonetic::normalize(m.as_str()).replace(' ', "");
        fields.insert("frequency".to_string(), freq);
    }

    if let Some(m) = first_capture(&PATIENT_COUNT_RES, transcript) {
        fields.insert("number_patients".to_string(), m.as_str().to_string());
    }

    if let Some(caps) = PRECEDENCE_RE.captures(transcript) {
        fields.insert(
            "patient_precedence".to_string(),
            format!("{} urgent surgical", &caps[1]),
        );
    }

    if let Some(caps) = AMBULATORY_RE.captures(transcript) {
        let ambulatory = caps[1].to_string();
        if let Some(total) = fields
            .get("number_patients")
            .and_then(|v| v.parse::<i64>().ok())
        {
            if let Ok(amb) = ambulatory.parse::<i64>() {
                // Litter is derived by subtraction; a wrong (negative)
                // number is worse than no number.
                if total >= amb {
                    fields.insert("number_litter".to_string(), (total - amb).to_string());
                }
            }
        }
        fields.insert("number_ambulatory".to_string(), ambulatory);
    }

    let equipment: Vec<&str> = EQUIPMENT_RES
        .iter()
        .filter(|(_, re)| re.is_match(transcript))
        .map(|(name, _)| *name)
        .collect();
    if !equipment.is_empty() {
        fields.insert("special_equipment".to_string(), equipment.join(", "));
    }

    for re in MARKING_RES.iter() {
        if let Some(caps) = re.captures(transcript) {
            fields.insert(
                "method_of_marking".to_string(),
                format!("{} smoke", capitalize(&caps[1])),
            );
            break;
        }
    }

    let lower = transcript.to_lowercase();
    for (code, keywords) in SECURITY_KEYWORDS {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            fields.insert("security_at_pickup".to_string(), (*code).to_string());
            break;
        }
    }

    // Keep only fields the template declares; unknown types keep everything.
    if let Some(template) = template_for(report_type) {
        fields.retain(|id, _| template.fields.iter().any(|f| f.id == id.as_str()));
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEDEVAC_TRANSCRIPT: &str = "WARHAWK 2-1, requesting medevac, grid 35VNF61105197, \
        freq 124.5, 3 down, 1 urgent surgical, 2 can walk, purple smoke";

    #[test]
    fn extracts_leading_callsign() {
        let fields = extract_fallback(MEDEVAC_TRANSCRIPT, "MEDEVAC");
        assert_eq!(fields.get("reporting_unit").unwrap(), "WARHAWK 2-1");
    }

    #[test]
    fn extracts_this_is_callsign() {
        let fields = extract_fallback("break, this is Viper 2 1, enemy contact", "CONTACTREP");
        assert_eq!(fields.get("reporting_unit").unwrap(), "VIPER 2 1");
    }

    #[test]
    fn extracts_compact_grid() {
        let fields = extract_fallback(MEDEVAC_TRANSCRIPT, "MEDEVAC");
        assert_eq!(fields.get("location").unwrap(), "35VNF61105197");
    }

    #[test]
    fn extracts_phonetic_grid() {
        let fields = extract_fallback(
            "this is Viper 2 1, we are at grid 1, 8, Tango, Whiskey, Lima, 8, 7, 6, 5, over",
            "MEDEVAC",
        );
        assert_eq!(fields.get("location").unwrap(), "18TWL8765");
    }

    #[test]
    fn extracts_spaced_grid_without_splicing() {
        let fields = extract_fallback("position at grid 18TWL8765 4321 over", "MEDEVAC");
        assert_eq!(fields.get("location").unwrap(), "18TWL87654321");
    }

    #[test]
    fn extracts_frequency_without_swallowing_count() {
        let fields = extract_fallback(MEDEVAC_TRANSCRIPT, "MEDEVAC");
        assert_eq!(fields.get("frequency").unwrap(), "124.5");
    }

    #[test]
    fn extracts_comma_spoken_frequency() {
        let fields = extract_fallback("radio is 1, 2, 4, 0.5, WARHAWK 2-1", "MEDEVAC");
        assert_eq!(fields.get("frequency").unwrap(), "124.5");
    }

    #[test]
    fn patient_count_from_adjacent_integer() {
        let fields = extract_fallback(MEDEVAC_TRANSCRIPT, "MEDEVAC");
        assert_eq!(fields.get("number_patients").unwrap(), "3");
    }

    #[test]
    fn patient_count_falls_back_to_urgent_surgical() {
        let fields = extract_fallback("need evac, 2 urgent surgical", "MEDEVAC");
        assert_eq!(fields.get("number_patients").unwrap(), "2");
        assert_eq!(fields.get("patient_precedence").unwrap(), "2 urgent surgical");
    }

    #[test]
    fn litter_derived_from_total_minus_ambulatory() {
        let fields = extract_fallback(MEDEVAC_TRANSCRIPT, "MEDEVAC");
        assert_eq!(fields.get("number_ambulatory").unwrap(), "2");
        assert_eq!(fields.get("number_litter").unwrap(), "1");
    }

    #[test]
    fn litter_unset_when_subtraction_would_go_negative() {
        let fields = extract_fallback("1 casualty, 3 can walk", "MEDEVAC");
        assert_eq!(fields.get("number_ambulatory").unwrap(), "3");
        assert!(fields.get("number_litter").is_none());
    }

    #[test]
    fn marking_color_before_smoke() {
        let fields = extract_fallback(MEDEVAC_TRANSCRIPT, "MEDEVAC");
        assert_eq!(fields.get("method_of_marking").unwrap(), "Purple smoke");
    }

    #[test]
    fn marking_smoke_before_color() {
        let fields = extract_fallback("line 7, smoke red, over", "MEDEVAC");
        assert_eq!(fields.get("method_of_marking").unwrap(), "Red smoke");
    }

    #[test]
    fn marking_explicit_phrase() {
        let fields = extract_fallback("will mark with green smoke", "MEDEVAC");
        assert_eq!(fields.get("method_of_marking").unwrap(), "Green smoke");
    }

    #[test]
    fn equipment_vocabulary_membership() {
        let fields = extract_fallback(
            "need a ventilator and hoist for the pickup",
            "MEDEVAC",
        );
        assert_eq!(fields.get("special_equipment").unwrap(), "Ventilator, Hoist");
    }

    #[test]
    fn equipment_word_boundary_respected() {
        let fields = extract_fallback("prevent further events at this location", "MEDEVAC");
        assert!(fields.get("special_equipment").is_none());
    }

    #[test]
    fn security_code_priority_order() {
        // "no enemy" (N) must win over the bare "enemy" (E) substring
        let fields = extract_fallback("no enemy in area", "MEDEVAC");
        assert_eq!(fields.get("security_at_pickup").unwrap(), "N");

        let fields = extract_fallback("enemy troops spotted nearby", "MEDEVAC");
        assert_eq!(fields.get("security_at_pickup").unwrap(), "E");

        let fields = extract_fallback("heavy contact, need escort", "MEDEVAC");
        // "contact" is an E keyword and E precedes X
        assert_eq!(fields.get("security_at_pickup").unwrap(), "E");
    }

    #[test]
    fn fields_filtered_to_template() {
        let fields = extract_fallback(MEDEVAC_TRANSCRIPT, "CONTACTREP");
        assert!(fields.get("frequency").is_none());
        assert!(fields.get("method_of_marking").is_none());
        assert_eq!(fields.get("reporting_unit").unwrap(), "WARHAWK 2-1");
    }

    #[test]
    fn empty_transcript_yields_empty_map() {
        assert!(extract_fallback("", "MEDEVAC").is_empty());
    }
}
