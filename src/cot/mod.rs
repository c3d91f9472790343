//! Cursor-on-Target encoding.

pub mod event;
pub mod xml;

pub use event::{CotEvent, Priority};
pub use xml::to_xml;
