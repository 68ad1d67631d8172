//! Substituted tree → request XML.
//!
//! Every request is wrapped as `<Envelope><Body>[<Command>]…</Command></Body></Envelope>`.
//! Per-value expansion rules:
//!
//! - [`Value::Tree`]: child elements nested inside the tag
//! - [`Value::List`]: one sibling element per item, all with the same tag
//! - [`Value::Map`]: one element per entry, each holding `<NAME>`/`<VALUE>`
//! - `Bool(true)`: self-closing tag; `Bool(false)`, `Null`, falsy scalars: omitted
//! - other scalars: element text
//!
//! A `COLUMN` element is always appended inside its own `COLUMNS` wrapper.

use crate::value::Value;
use crate::xml::element::XmlElement;
use crate::xml::error::XmlError;

pub const ENVELOPE: &str = "Envelope";
pub const BODY: &str = "Body";

const COLUMN: &str = "COLUMN";
const COLUMNS: &str = "COLUMNS";

/// Wraps `content` in `Envelope > Body`, and in `command` when given.
pub fn envelope(command: Option<&str>, content: Vec<XmlElement>) -> XmlElement {
    let mut body = XmlElement::new(BODY);
    match command {
        Some(command) => {
            let mut command = XmlElement::new(command);
            command.children = content;
            body.push(command);
        }
        None => body.children = content,
    }

    let mut envelope = XmlElement::new(ENVELOPE);
    envelope.push(body);
    envelope
}

/// Builds the request document for `tree` without serializing it.
pub fn build_document(tree: &[(String, Value)], command: Option<&str>) -> XmlElement {
    let mut content = Vec::with_capacity(tree.len());
    append_entries(&mut content, tree);
    envelope(command, content)
}

/// Serializes `tree` into a complete request document.
pub fn map_to_xml(tree: &[(String, Value)], command: Option<&str>) -> Result<String, XmlError> {
    let xml = build_document(tree, command).to_xml_string()?;
    tracing::trace!(bytes = xml.len(), command = ?command, "serialized request");
    Ok(xml)
}

fn append_entries(parent: &mut Vec<XmlElement>, entries: &[(String, Value)]) {
    for (tag, value) in entries {
        append_value(parent, tag, value);
    }
}

fn append_value(parent: &mut Vec<XmlElement>, tag: &str, value: &Value) {
    match value {
        Value::Tree(children) => {
            let mut element = XmlElement::new(tag);
            append_entries(&mut element.children, children);
            attach(parent, element);
        }
        Value::List(items) => {
            for item in items {
                append_value(parent, tag, item);
            }
        }
        Value::Map(entries) => {
            for (name, entry) in entries {
                let mut element = XmlElement::new(tag);
                append_value(&mut element.children, "NAME", &Value::Text(name.clone()));
                append_value(&mut element.children, "VALUE", entry);
                attach(parent, element);
            }
        }
        Value::Bool(true) => attach(parent, XmlElement::new(tag)),
        Value::Bool(false) | Value::Null => {}
        Value::Text(_) | Value::Integer(_) => {
            if value.is_truthy() {
                attach(parent, XmlElement::with_text(tag, value.to_string()));
            }
        }
    }
}

fn attach(parent: &mut Vec<XmlElement>, element: XmlElement) {
    if element.name == COLUMN {
        let mut columns = XmlElement::new(COLUMNS);
        columns.push(element);
        parent.push(columns);
    } else {
        parent.push(element);
    }
}
