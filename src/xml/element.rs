//! Minimal in-memory XML element tree on top of quick-xml.
//!
//! Requests are assembled as [`XmlElement`] trees and written in one pass, which
//! lets the writer decide per element whether it is empty (self-closing) or not.
//! Responses are read back into the same structure before normalization.

use std::borrow::Cow;
use std::io::{self, Write};

use quick_xml::escape::{partial_escape, resolve_predefined_entity, unescape};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::xml::error::XmlError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut element = Self::new(name);
        element.text = Some(text.into());
        element
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(child);
    }

    /// Text content, `""` when the element has none.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First direct child called `name`.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// First element called `name` in document order, `self` included.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    fn is_empty(&self) -> bool {
        self.children.is_empty() && self.text.as_deref().map_or(true, str::is_empty)
    }

    /// Serializes the element without an XML declaration or whitespace.
    pub fn to_xml_string(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new(Vec::with_capacity(256));
        self.write(&mut writer)?;
        String::from_utf8(writer.into_inner()).map_err(|e| XmlError::ParseError(e.to_string()))
    }

    fn write<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            let escaped = escape_attribute(value);
            start.push_attribute((key.as_bytes(), escaped.as_bytes()));
        }

        if self.is_empty() {
            return writer.write_event(Event::Empty(start));
        }

        writer.write_event(Event::Start(start))?;
        if let Some(text) = self.text.as_deref().filter(|t| !t.is_empty()) {
            writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))?;
        }
        for child in &self.children {
            child.write(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))
    }

    /// Parses a complete document with a single root element.
    ///
    /// Element names are stored without namespace prefixes. Text is unescaped
    /// and kept verbatim, except that whitespace-only text counts as no text.
    /// After the root closes only whitespace, comments and processing
    /// instructions may follow; anything else is a [`XmlError::ParseError`].
    pub fn parse(xml: &str) -> Result<XmlElement, XmlError> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<XmlElement> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(e) => stack.push(element_from_start(&e)?),
                Event::Empty(e) => {
                    let element = element_from_start(&e)?;
                    match stack.last_mut() {
                        Some(parent) => parent.push(element),
                        None => return finish_document(&mut reader, element),
                    }
                }
                Event::Text(e) => {
                    if let Some(current) = stack.last_mut() {
                        let decoded = e
                            .decode()
                            .map_err(|err| XmlError::ParseError(err.to_string()))?;
                        let unescaped = unescape(&decoded)
                            .map_err(|err| XmlError::ParseError(err.to_string()))?;
                        current.append_text(&unescaped);
                    }
                }
                Event::CData(e) => {
                    if let Some(current) = stack.last_mut() {
                        let decoded = e
                            .decode()
                            .map_err(|err| XmlError::ParseError(err.to_string()))?;
                        current.append_text(&decoded);
                    }
                }
                Event::GeneralRef(e) => {
                    if let Some(current) = stack.last_mut() {
                        let resolved = match e
                            .resolve_char_ref()
                            .map_err(|err| XmlError::ParseError(err.to_string()))?
                        {
                            Some(ch) => Cow::Owned(ch.to_string()),
                            None => {
                                let name = e
                                    .decode()
                                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                                let entity = resolve_predefined_entity(&name).ok_or_else(|| {
                                    XmlError::ParseError(format!("unknown entity &{};", name))
                                })?;
                                Cow::Borrowed(entity)
                            }
                        };
                        current.append_text(&resolved);
                    }
                }
                Event::End(_) => {
                    let Some(mut element) = stack.pop() else {
                        return Err(XmlError::ParseError("unmatched end tag".to_string()));
                    };
                    element.finish_text();
                    match stack.last_mut() {
                        Some(parent) => parent.push(element),
                        None => return finish_document(&mut reader, element),
                    }
                }
                Event::Eof => {
                    return match stack.last() {
                        Some(open) => Err(XmlError::UnexpectedEof(open.name.clone())),
                        None => Err(XmlError::MissingElement("root element".to_string())),
                    };
                }
                // Declarations, comments, processing instructions, doctypes.
                _ => {}
            }
        }
    }

    fn append_text(&mut self, text: &str) {
        self.text.get_or_insert_with(String::new).push_str(text);
    }

    fn finish_text(&mut self) {
        if self.text.as_deref().is_some_and(|text| text.trim().is_empty()) {
            self.text = None;
        }
    }
}

/// Reads past the closed root element, rejecting any further markup or text.
fn finish_document(
    reader: &mut Reader<&[u8]>,
    root: XmlElement,
) -> Result<XmlElement, XmlError> {
    loop {
        match reader.read_event()? {
            Event::Eof => return Ok(root),
            Event::Comment(_) | Event::PI(_) => {}
            Event::Text(e) if e.iter().all(u8::is_ascii_whitespace) => {}
            _ => {
                return Err(XmlError::ParseError(format!(
                    "unexpected content after root element <{}>",
                    root.name
                )))
            }
        }
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement, XmlError> {
    let local = start.local_name();
    let name = std::str::from_utf8(local.as_ref())
        .map_err(|e| XmlError::ParseError(e.to_string()))?;
    let mut element = XmlElement::new(name);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlError::ParseError(e.to_string()))?;
        let key = std::str::from_utf8(attr.key.local_name().as_ref())
            .map_err(|e| XmlError::ParseError(e.to_string()))?
            .to_string();
        let raw = std::str::from_utf8(&attr.value)
            .map_err(|e| XmlError::ParseError(e.to_string()))?;
        let value = unescape(raw).map_err(|e| XmlError::ParseError(e.to_string()))?;
        element.attributes.push((key, value.into_owned()));
    }

    Ok(element)
}

/// Attribute escaping: markup characters, double quotes and whitespace
/// control characters.
fn escape_attribute(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\n', '\r', '\t']) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#09;"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}
