//! CoT event construction from a structured report.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::location::{self, GeoPoint};
use crate::pipeline::FieldMap;
use crate::templates::template_for;

/// Message precedence, derived from spoken priority fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Flash,
    Immediate,
    Priority,
    Routine,
}

/// Field ids scanned for a spoken precedence keyword.
const PRIORITY_FIELDS: &[&str] = &["priority", "precedence", "urgency", "patient_precedence"];

impl Priority {
    /// Scan the merged fields for a precedence keyword. Unknown or absent
    /// wording is routine.
    pub fn from_fields(fields: &FieldMap) -> Self {
        for id in PRIORITY_FIELDS {
            let Some(value) = fields.get(*id) else { continue };
            let value = value.to_lowercase();
            if value.contains("flash") {
                return Priority::Flash;
            }
            if value.contains("immediate") || value.contains("urgent") {
                return Priority::Immediate;
            }
            if value.contains("priority") {
                return Priority::Priority;
            }
        }
        Priority::Routine
    }

    /// How long the event stays fresh on receiving clients.
    pub fn stale_window(self) -> Duration {
        match self {
            Priority::Flash => Duration::minutes(30),
            Priority::Immediate => Duration::minutes(60),
            Priority::Priority => Duration::minutes(120),
            Priority::Routine => Duration::minutes(240),
        }
    }

    fn remarks_prefix(self) -> &'static str {
        match self {
            Priority::Flash => "**FLASH** ",
            Priority::Immediate => "**IMMEDIATE** ",
            _ => "",
        }
    }
}

/// CoT type code for a report, with priority overrides for the report
/// types whose urgency changes the displayed symbol.
fn cot_type_for(report_type: &str, priority: Priority) -> &'static str {
    match report_type {
        "MEDEVAC" => match priority {
            Priority::Flash => "a-f-G-E-V-A-M",
            Priority::Immediate => "a-f-G-U-C-I-M-E",
            Priority::Priority => "a-f-G-U-C-I-M",
            Priority::Routine => "a-f-G-U-C-I",
        },
        "CONTACTREP" => match priority {
            Priority::Immediate => "a-h-G-E-V-A",
            _ => "a-h-G",
        },
        other => template_for(other).map_or("a-f-G-U-C", |t| t.cot_type),
    }
}

/// Candidate field ids searched for a position fix when no template is
/// known for the report type.
const DEFAULT_LOCATION_FIELDS: &[&str] = &["location", "grid"];

/// Candidate field ids for the event callsign, in precedence order.
const CALLSIGN_FIELDS: &[&str] = &["reporting_unit", "callsign", "unit", "from_unit"];

/// A fully assembled CoT event, ready for XML encoding.
#[derive(Debug, Clone)]
pub struct CotEvent {
    pub uid: String,
    pub cot_type: String,
    pub time: DateTime<Utc>,
    pub start: DateTime<Utc>,
    pub stale: DateTime<Utc>,
    pub point: GeoPoint,
    pub callsign: String,
    pub group_name: String,
    pub group_role: String,
    pub remarks: String,
    pub detail_element: String,
    pub detail_fields: Vec<(String, String)>,
}

impl CotEvent {
    /// Assemble an event from a structured report at the current instant.
    pub fn build(
        report_type: &str,
        fields: &FieldMap,
        callsign_override: Option<&str>,
    ) -> CotEvent {
        Self::build_at(report_type, fields, callsign_override, Utc::now())
    }

    /// Assemble an event with an explicit timestamp.
    pub fn build_at(
        report_type: &str,
        fields: &FieldMap,
        callsign_override: Option<&str>,
        now: DateTime<Utc>,
    ) -> CotEvent {
        let template = template_for(report_type);
        let priority = Priority::from_fields(fields);

        let location_candidates =
            template.map_or(DEFAULT_LOCATION_FIELDS, |t| t.location_fields);
        let point = location_candidates
            .iter()
            .filter_map(|id| fields.get(*id))
            .find(|v| !v.is_empty())
            .map_or_else(GeoPoint::unknown, |text| location::resolve(text));
        if point.is_unknown() {
            debug!(%report_type, "no resolvable location, emitting sentinel point");
        }

        let callsign = callsign_override
            .map(str::to_string)
            .or_else(|| {
                CALLSIGN_FIELDS
                    .iter()
                    .filter_map(|id| fields.get(*id))
                    .find(|v| !v.is_empty())
                    .cloned()
            })
            .unwrap_or_else(|| "UNKNOWN".to_string())
            .to_uppercase();

        let detail_fields: Vec<(String, String)> = match template {
            Some(t) => t
                .fields
                .iter()
                .filter_map(|f| {
                    fields
                        .get(f.id)
                        .filter(|v| !v.is_empty())
                        .map(|v| (f.id.to_string(), v.clone()))
                })
                .collect(),
            None => fields
                .iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        };

        CotEvent {
            uid: format!("{}-{}", report_type, Uuid::new_v4()),
            cot_type: cot_type_for(report_type, priority).to_string(),
            time: now,
            start: now,
            stale: now + priority.stale_window(),
            point,
            callsign: callsign.clone(),
            group_name: template.map_or("Blue", |t| t.group_color).to_string(),
            group_role: "Team Member".to_string(),
            remarks: format!(
                "{}{} from {}",
                priority.remarks_prefix(),
                report_type,
                callsign
            ),
            detail_element: template
                .map_or_else(|| report_type.to_lowercase(), |t| t.detail_element.to_string()),
            detail_fields,
        }
    }
}
