//! CoT XML serialization.

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::event::CotEvent;

/// CoT schema version emitted on the event element.
const COT_VERSION: &str = "2.0";
/// How-produced code for machine-generated reports.
const COT_HOW: &str = "h-g-i-g-o";

/// CoT timestamps carry millisecond precision and a literal Z suffix.
fn format_time(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Serialize an event to a CoT XML document.
pub fn to_xml(event: &CotEvent) -> Result<Vec<u8>, quick_xml::Error> {
    let mut writer = Writer::new(Vec::new());

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

    let mut root = BytesStart::new("event");
    root.push_attribute(("version", COT_VERSION));
    root.push_attribute(("uid", event.uid.as_str()));
    root.push_attribute(("type", event.cot_type.as_str()));
    root.push_attribute(("time", format_time(event.time).as_str()));
    root.push_attribute(("start", format_time(event.start).as_str()));
    root.push_attribute(("stale", format_time(event.stale).as_str()));
    root.push_attribute(("how", COT_HOW));
    writer.write_event(Event::Start(root))?;

    let mut point = BytesStart::new("point");
    point.push_attribute(("lat", format!("{:.6}", event.point.lat).as_str()));
    point.push_attribute(("lon", format!("{:.6}", event.point.lon).as_str()));
    point.push_attribute(("hae", format!("{:.1}", event.point.hae).as_str()));
    point.push_attribute(("ce", format!("{:.1}", event.point.ce).as_str()));
    point.push_attribute(("le", format!("{:.1}", event.point.le).as_str()));
    writer.write_event(Event::Empty(point))?;

    writer.write_event(Event::Start(BytesStart::new("detail")))?;

    let mut contact = BytesStart::new("contact");
    contact.push_attribute(("callsign", event.callsign.as_str()));
    writer.write_event(Event::Empty(contact))?;

    let mut group = BytesStart::new("__group");
    group.push_attribute(("name", event.group_name.as_str()));
    group.push_attribute(("role", event.group_role.as_str()));
    writer.write_event(Event::Empty(group))?;

    writer.write_event(Event::Start(BytesStart::new("remarks")))?;
    writer.write_event(Event::Text(BytesText::new(&event.remarks)))?;
    writer.write_event(Event::End(BytesEnd::new("remarks")))?;

    writer.write_event(Event::Start(BytesStart::new(event.detail_element.as_str())))?;
    for (id, value) in &event.detail_fields {
        writer.write_event(Event::Start(BytesStart::new(id.as_str())))?;
        writer.write_event(Event::Text(BytesText::new(value)))?;
        writer.write_event(Event::End(BytesEnd::new(id.as_str())))?;
    }
    writer.write_event(Event::End(BytesEnd::new(event.detail_element.as_str())))?;

    writer.write_event(Event::End(BytesEnd::new("detail")))?;
    writer.write_event(Event::End(BytesEnd::new("event")))?;

    Ok(writer.into_inner())
}
