//! End-to-end pipeline properties: transcript in, CoT XML out.

use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

use repgen::cot::{to_xml, CotEvent};
use repgen::location;
use repgen::pipeline::{self, FieldMap};

const MEDEVAC_TRANSCRIPT: &str = "WARHAWK 2-1, requesting medevac, grid 35VNF61105197, \
     freq 124.5, 3 down, 1 urgent surgical, 2 can walk, purple smoke";

#[test]
fn medevac_transcript_structures_exactly() {
    let report = pipeline::structure_report(MEDEVAC_TRANSCRIPT, None);

    assert_eq!(report.report_type, "MEDEVAC");
    let f = &report.fields;
    assert_eq!(f.get("reporting_unit").unwrap(), "WARHAWK 2-1");
    assert_eq!(f.get("location").unwrap(), "35VNF61105197");
    assert_eq!(f.get("frequency").unwrap(), "124.5");
    assert_eq!(f.get("number_patients").unwrap(), "3");
    assert_eq!(f.get("number_ambulatory").unwrap(), "2");
    assert_eq!(f.get("number_litter").unwrap(), "1");
    assert_eq!(f.get("method_of_marking").unwrap(), "Purple smoke");
    assert_eq!(f.get("patient_precedence").unwrap(), "1 urgent surgical");
}

#[test]
fn contact_transcript_classifies_with_usable_confidence() {
    let report = pipeline::structure_report("enemy contact, troops in contact, receiving fire", None);
    assert_eq!(report.report_type, "CONTACTREP");
    assert!(report.confidence >= 0.3, "confidence {}", report.confidence);
}

#[test]
fn normalizer_is_idempotent_on_its_own_output() {
    let inputs = [
        MEDEVAC_TRANSCRIPT,
        "this is Viper 2 1 at grid 1, 8, Tango, Whiskey, Lima, 8, 7, 6, 5",
        "say again your last, over",
    ];
    for input in inputs {
        let once = pipeline::normalize(input);
        assert_eq!(pipeline::normalize(&once), once, "input: {input}");
    }
}

#[test]
fn contaminated_ml_value_never_survives_merge() {
    let mut ai = FieldMap::new();
    ai.insert("reporting_unit".to_string(), "RAZOR 3-1".to_string());
    ai.insert("method_of_marking".to_string(), "purple smoke flare".to_string());

    let report = pipeline::structure_report(MEDEVAC_TRANSCRIPT, Some(ai));

    // Both fall back to the rule layer, which read the live transcript.
    assert_eq!(report.fields.get("reporting_unit").unwrap(), "WARHAWK 2-1");
    assert_eq!(report.fields.get("method_of_marking").unwrap(), "Purple smoke");
}

#[test]
fn patient_counts_always_reconcile() {
    let cases: &[&[(&str, &str)]] = &[
        &[("number_patients", "6")],
        &[("number_patients", "6"), ("number_litter", "2")],
        &[("number_patients", "6"), ("number_ambulatory", "9")],
        &[("number_patients", "1"), ("number_litter", "4"), ("number_ambulatory", "4")],
    ];
    for case in cases {
        let ai: FieldMap = case
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let report = pipeline::structure_report("medevac request", Some(ai));
        assert_eq!(report.report_type, "MEDEVAC");
        let total: i64 = report.fields.get("number_patients").unwrap().parse().unwrap();
        let litter: i64 = report.fields.get("number_litter").unwrap().parse().unwrap();
        let ambulatory: i64 = report
            .fields
            .get("number_ambulatory")
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(litter + ambulatory, total, "case: {case:?}");
    }
}

#[test]
fn resolver_accuracy_ordering() {
    let grid = location::resolve("35VNF61105197");
    let pair = location::resolve("58.97, 26.31");
    let prose = location::resolve("somewhere north of the bridge");

    assert_eq!(grid.ce, 10.0);
    assert_eq!(pair.ce, 100.0);
    assert!(prose.ce >= 9_999_999.0);
}

#[test]
fn routine_sitrep_goes_stale_after_four_hours() {
    let now = Utc::now();
    let mut fields = FieldMap::new();
    fields.insert("reporting_unit".to_string(), "OUTPOST 7".to_string());
    fields.insert("priority".to_string(), "routine".to_string());

    let event = CotEvent::build_at("SITREP", &fields, None, now);
    assert_eq!(event.stale - event.time, Duration::hours(4));
}

#[test]
fn xml_round_trip_recovers_every_field() {
    let report = pipeline::structure_report(MEDEVAC_TRANSCRIPT, None);
    let event = CotEvent::build("MEDEVAC", &report.fields, None);
    let xml = String::from_utf8(to_xml(&event).unwrap()).unwrap();

    let (cot_type, point_attrs, detail_fields) = parse_cot(&xml);

    assert_eq!(cot_type, event.cot_type);
    assert_eq!(point_attrs.get("ce").unwrap(), "10.0");
    let lat: f64 = point_attrs.get("lat").unwrap().parse().unwrap();
    assert!((lat - event.point.lat).abs() < 1e-5);

    for (id, value) in &event.detail_fields {
        assert_eq!(
            detail_fields.get(id),
            Some(value),
            "field {id} lost in round trip"
        );
    }
    assert_eq!(detail_fields.len(), event.detail_fields.len());
}

/// Minimal CoT reader: root type attribute, point attributes, and the
/// children of the report detail block.
fn parse_cot(
    xml: &str,
) -> (
    String,
    BTreeMap<String, String>,
    BTreeMap<String, String>,
) {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut cot_type = String::new();
    let mut point_attrs = BTreeMap::new();
    let mut detail_fields = BTreeMap::new();
    let mut depth = 0usize;
    let mut current_field: Option<String> = None;

    loop {
        match reader.read_event().expect("well-formed XML") {
            Event::Start(e) => {
                depth += 1;
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if depth == 1 && name == "event" {
                    for attr in e.attributes() {
                        let attr = attr.unwrap();
                        if attr.key.as_ref() == b"type" {
                            cot_type = String::from_utf8_lossy(&attr.value).into_owned();
                        }
                    }
                } else if depth == 4 {
                    // a field element inside the report detail block;
                    // remarks sits at depth 3 and is skipped here
                    current_field = Some(name);
                }
            }
            Event::Empty(e) => {
                if e.name().as_ref() == b"point" {
                    for attr in e.attributes() {
                        let attr = attr.unwrap();
                        point_attrs.insert(
                            String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                            String::from_utf8_lossy(&attr.value).into_owned(),
                        );
                    }
                }
            }
            Event::Text(t) => {
                if let Some(field) = current_field.clone() {
                    detail_fields.insert(field, t.unescape().unwrap().into_owned());
                }
            }
            Event::End(_) => {
                depth -= 1;
                current_field = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    (cot_type, point_attrs, detail_fields)
}
