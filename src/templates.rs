//! Static NATO-format report templates.
//!
//! Pure configuration data: adding a report type means adding a template
//! here plus (optionally) classifier keywords and a CoT detail mapping.
//! Never mutated at runtime.

/// One field of a report template.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub required: bool,
}

/// A report template: title, CoT base type, and the ordered field set.
/// `location_fields` is the candidate order the CoT encoder searches for
/// a position fix; `detail_element` names the report-specific XML block.
#[derive(Debug, Clone, Copy)]
pub struct ReportTemplate {
    pub code: &'static str,
    pub title: &'static str,
    pub cot_type: &'static str,
    pub detail_element: &'static str,
    pub group_color: &'static str,
    pub location_fields: &'static [&'static str],
    pub fields: &'static [FieldSpec],
}

const fn field(id: &'static str, label: &'static str, required: bool) -> FieldSpec {
    FieldSpec { id, label, required }
}

static MEDEVAC_FIELDS: &[FieldSpec] = &[
    field("location", "Pickup Site Grid", true),
    field("frequency", "Radio Frequency", true),
    field("reporting_unit", "Callsign", true),
    field("number_patients", "Number of Patients", true),
    field("patient_precedence", "Patients by Precedence", true),
    field("special_equipment", "Special Equipment Required", false),
    field("number_litter", "Litter Patients", true),
    field("number_ambulatory", "Ambulatory Patients", true),
    field("security_at_pickup", "Security at Pickup Site", true),
    field("method_of_marking", "Method of Marking Pickup Site", true),
    field("patient_nationality", "Patient Nationality and Status", false),
    field("nbc_contamination", "NBC Contamination", false),
];

static CONTACTREP_FIELDS: &[FieldSpec] = &[
    field("reporting_unit", "Reporting Unit", true),
    field("time_of_contact", "Time of Contact", true),
    field("location", "Enemy Location", true),
    field("enemy_size", "Size of Enemy Unit", true),
    field("enemy_activity", "Activity of Enemy", true),
    field("enemy_equipment", "Equipment Observed", true),
    field("distance_direction", "Distance and Direction", false),
    field("friendly_status", "Friendly Status", true),
];

static SITREP_FIELDS: &[FieldSpec] = &[
    field("reporting_unit", "Reporting Unit", true),
    field("location", "Location", true),
    field("personnel_status", "Personnel Status", true),
    field("ammunition_status", "Ammunition Status", true),
    field("fuel_status", "Fuel Status", true),
    field("current_activity", "Current Activity", true),
    field("enemy_activity", "Enemy Activity", true),
    field("requests", "Requests", false),
];

static SPOTREP_FIELDS: &[FieldSpec] = &[
    field("reporting_unit", "Reporting Unit", true),
    field("size", "Size", true),
    field("activity", "Activity", true),
    field("location", "Location", true),
    field("unit", "Unit", true),
    field("time_observed", "Time Observed", true),
    field("equipment", "Equipment", true),
];

static SALUTE_FIELDS: &[FieldSpec] = &[
    field("reporting_unit", "Reporting Unit", true),
    field("size", "Size", true),
    field("activity", "Activity", true),
    field("location", "Location", true),
    field("unit", "Unit", true),
    field("time", "Time", true),
    field("equipment", "Equipment", true),
];

static PATROLREP_FIELDS: &[FieldSpec] = &[
    field("reporting_unit", "Reporting Unit", true),
    field("patrol_number", "Patrol Number", true),
    field("task_purpose", "Task and Purpose", true),
    field("time_departed", "Time Departed", true),
    field("time_returned", "Time Returned", true),
    field("route", "Route Used", true),
    field("location", "Current Location", false),
    field("enemy_contact", "Enemy Contact", true),
    field("obstacles", "Obstacles Encountered", false),
    field("conclusion", "Conclusion", true),
];

/// Insertion order is the classifier tie-break order. Keep stable.
static TEMPLATES: &[ReportTemplate] = &[
    ReportTemplate {
        code: "MEDEVAC",
        title: "Medical Evacuation Request",
        cot_type: "a-f-G-U-C-I-M-E",
        detail_element: "medevac",
        group_color: "White",
        location_fields: &["location", "pickup_location", "grid"],
        fields: MEDEVAC_FIELDS,
    },
    ReportTemplate {
        code: "CONTACTREP",
        title: "Contact Report",
        cot_type: "a-h-G",
        detail_element: "contact_report",
        group_color: "Red",
        location_fields: &["location", "enemy_location", "grid"],
        fields: CONTACTREP_FIELDS,
    },
    ReportTemplate {
        code: "SITREP",
        title: "Situation Report",
        cot_type: "a-f-G-U-C",
        detail_element: "sitrep",
        group_color: "Blue",
        location_fields: &["location", "grid"],
        fields: SITREP_FIELDS,
    },
    ReportTemplate {
        code: "SPOTREP",
        title: "Spot Report",
        cot_type: "a-f-G-E",
        detail_element: "spot_report",
        group_color: "Yellow",
        location_fields: &["location", "grid"],
        fields: SPOTREP_FIELDS,
    },
    ReportTemplate {
        code: "SALUTE",
        title: "SALUTE Report",
        cot_type: "a-h-G-U-C-I",
        detail_element: "salute",
        group_color: "Blue",
        location_fields: &["location", "grid"],
        fields: SALUTE_FIELDS,
    },
    ReportTemplate {
        code: "PATROLREP",
        title: "Patrol Report",
        cot_type: "a-f-G-P",
        detail_element: "patrol_report",
        group_color: "Blue",
        location_fields: &["location", "grid"],
        fields: PATROLREP_FIELDS,
    },
];

/// All known templates, in stable declaration order.
pub fn report_templates() -> &'static [ReportTemplate] {
    TEMPLATES
}

/// Look up a template by report-type code.
pub fn template_for(code: &str) -> Option<&'static ReportTemplate> {
    TEMPLATES.iter().find(|t| t.code == code)
}
