//! Response XML → [`ApiResponse`].
//!
//! The children of the `RESULT` element are flattened into a [`ResponseMap`] keyed
//! by uppercase tag name. A tag seen once maps to its value; a tag repeated under
//! the same parent becomes a [`ResponseNode::List`] in document order.
//!
//! A top-level `<SUCCESS>false</SUCCESS>` (any case) turns the response into a
//! [`ResponseFault`] built from the envelope's `Fault` element.

use std::fmt;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::errors::ApiError;
use crate::xml::element::XmlElement;
use crate::xml::error::XmlError;

const RESULT: &str = "RESULT";
const SUCCESS: &str = "SUCCESS";
const COLUMNS: &str = "COLUMNS";

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseNode {
    Text(String),
    Map(ResponseMap),
    List(Vec<ResponseNode>),
}

impl ResponseNode {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ResponseNode::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ResponseMap> {
        match self {
            ResponseNode::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ResponseNode]> {
        match self {
            ResponseNode::List(items) => Some(items),
            _ => None,
        }
    }

    /// Iterates a collapsed list, or yields a single node once.
    ///
    /// Useful for tags that repeat only sometimes (one `LIST` vs several).
    pub fn iter_items(&self) -> impl Iterator<Item = &ResponseNode> {
        let items: &[ResponseNode] = match self {
            ResponseNode::List(items) => items,
            single => std::slice::from_ref(single),
        };
        items.iter()
    }
}

/// Ordered tag → node mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseMap {
    entries: Vec<(String, ResponseNode)>,
}

impl ResponseMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks `key` up as given, then upper-cased.
    pub fn get(&self, key: &str) -> Option<&ResponseNode> {
        self.lookup(key).or_else(|| {
            let upper = key.to_ascii_uppercase();
            (upper != key).then(|| self.lookup(&upper)).flatten()
        })
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ResponseNode::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResponseNode)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts `value`, promoting an existing `key` to a list.
    pub fn insert_collapsing(&mut self, key: String, value: ResponseNode) {
        let Some(index) = self.entries.iter().position(|(k, _)| *k == key) else {
            self.entries.push((key, value));
            return;
        };
        match &mut self.entries[index].1 {
            ResponseNode::List(items) => items.push(value),
            existing => {
                let first = std::mem::replace(existing, ResponseNode::List(Vec::new()));
                *existing = ResponseNode::List(vec![first, value]);
            }
        }
    }

    fn lookup(&self, key: &str) -> Option<&ResponseNode> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl Serialize for ResponseNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResponseNode::Text(s) => serializer.serialize_str(s),
            ResponseNode::Map(m) => m.serialize(serializer),
            ResponseNode::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl Serialize for ResponseMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// A normalized, successful API response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ApiResponse {
    fields: ResponseMap,
}

impl ApiResponse {
    /// Value of the `SUCCESS` field; `None` when the operation omits it.
    ///
    /// A repeated `SUCCESS` is false if any occurrence is `false`.
    pub fn success(&self) -> Option<bool> {
        let node = self.fields.get(SUCCESS)?;
        let mut flags = node
            .iter_items()
            .filter_map(ResponseNode::as_str)
            .peekable();
        flags.peek()?;
        Some(!flags.any(|flag| flag.trim().eq_ignore_ascii_case("false")))
    }

    pub fn get(&self, key: &str) -> Option<&ResponseNode> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get_str(key)
    }

    /// Walks nested maps, e.g. `["COLUMNS", "email"]`.
    pub fn get_path(&self, path: &[&str]) -> Option<&ResponseNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.fields.get(first)?;
        for key in rest {
            node = node.as_map()?.get(key)?;
        }
        Some(node)
    }

    /// The `COLUMNS` name → value mapping, when the response carried one.
    pub fn columns(&self) -> Option<&ResponseMap> {
        self.fields.get(COLUMNS).and_then(ResponseNode::as_map)
    }

    pub fn fields(&self) -> &ResponseMap {
        &self.fields
    }

    pub fn into_fields(self) -> ResponseMap {
        self.fields
    }
}

/// The vendor's description of a rejected request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFault {
    pub message: String,
    pub code: Option<String>,
    pub error_id: Option<String>,
}

impl fmt::Display for ResponseFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_id {
            Some(id) => write!(f, "{} (error {})", self.message, id),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ResponseFault {}

/// Parses a raw response body.
///
/// Returns [`ApiError::Fault`] for `SUCCESS=false` responses and
/// [`ApiError::Xml`] for bodies that are not XML or carry no `RESULT`.
pub fn parse_response(xml: &str) -> Result<ApiResponse, ApiError> {
    let root = XmlElement::parse(xml)?;

    let Some(result) = root.find(RESULT) else {
        if root.find("Fault").is_some() {
            return Err(ApiError::Fault(extract_fault(&root)));
        }
        return Err(XmlError::MissingElement(RESULT.to_string()).into());
    };

    let response = ApiResponse {
        fields: flatten_result(result),
    };

    if response.success() == Some(false) {
        return Err(ApiError::Fault(extract_fault(&root)));
    }

    Ok(response)
}

fn flatten_result(result: &XmlElement) -> ResponseMap {
    let mut map = ResponseMap::new();
    for child in &result.children {
        let key = child.name.to_ascii_uppercase();
        let value = if key == COLUMNS {
            columns_map(child).unwrap_or_else(|| flatten(child))
        } else {
            flatten(child)
        };
        map.insert_collapsing(key, value);
    }
    map
}

fn flatten(element: &XmlElement) -> ResponseNode {
    if element.children.is_empty() {
        return ResponseNode::Text(element.text().to_string());
    }
    let mut map = ResponseMap::new();
    for child in &element.children {
        map.insert_collapsing(child.name.to_ascii_uppercase(), flatten(child));
    }
    ResponseNode::Map(map)
}

/// `<COLUMNS><COLUMN><NAME>n</NAME><VALUE>v</VALUE></COLUMN>…` → `{n: v}`.
///
/// `None` when some `COLUMN` lacks a `NAME`/`VALUE` pair (list metadata
/// describes columns with `TYPE` and friends instead).
fn columns_map(columns: &XmlElement) -> Option<ResponseNode> {
    let mut map = ResponseMap::new();
    for column in &columns.children {
        if !column.name.eq_ignore_ascii_case("COLUMN") {
            return None;
        }
        let name = column.child("NAME")?.text().to_string();
        let value = column.child("VALUE")?.text().to_string();
        map.insert_collapsing(name, ResponseNode::Text(value));
    }
    Some(ResponseNode::Map(map))
}

fn extract_fault(root: &XmlElement) -> ResponseFault {
    let fault = root.find("Fault");
    let text_of = |name: &str| {
        fault
            .and_then(|f| f.find(name))
            .map(XmlElement::text)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    };

    ResponseFault {
        message: text_of("FaultString")
            .unwrap_or_else(|| "request rejected without a fault description".to_string()),
        code: text_of("FaultCode"),
        error_id: text_of("errorid"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(result: &str) -> String {
        format!("<Envelope><Body><RESULT>{}</RESULT></Body></Envelope>", result)
    }

    #[test]
    fn test_success_response() {
        let response =
            parse_response(&envelope("<SUCCESS>true</SUCCESS><RecipientId>42</RecipientId>"))
                .unwrap();
        assert_eq!(response.success(), Some(true));
        assert_eq!(response.get_str("RECIPIENTID"), Some("42"));
        assert_eq!(response.get_str("recipientid"), Some("42"));
    }

    #[test]
    fn test_fault_response() {
        let xml = "<Envelope><Body>\
            <RESULT><SUCCESS>false</SUCCESS></RESULT>\
            <Fault><Request/><FaultCode/><FaultString>Invalid List Id.</FaultString>\
            <detail><error><errorid>122</errorid><module/><class>SP.API</class></error></detail>\
            </Fault></Body></Envelope>";

        match parse_response(xml) {
            Err(ApiError::Fault(fault)) => {
                assert_eq!(fault.message, "Invalid List Id.");
                assert_eq!(fault.code, None);
                assert_eq!(fault.error_id.as_deref(), Some("122"));
            }
            other => panic!("expected fault, got {:?}", other),
        }
    }

    #[test]
    fn test_success_flag_is_case_insensitive() {
        let xml = "<Envelope><Body><RESULT><SUCCESS>FALSE</SUCCESS></RESULT>\
            <Fault><FaultString>X</FaultString></Fault></Body></Envelope>";
        assert!(matches!(parse_response(xml), Err(ApiError::Fault(f)) if f.message == "X"));

        let response = parse_response(&envelope("<SUCCESS>TRUE</SUCCESS>")).unwrap();
        assert_eq!(response.success(), Some(true));
    }

    #[test]
    fn test_repeated_success_with_false_is_a_fault() {
        let xml = "<Envelope><Body><RESULT><SUCCESS>true</SUCCESS><SUCCESS>false</SUCCESS></RESULT>\
            <Fault><FaultString>X</FaultString></Fault></Body></Envelope>";
        assert!(matches!(parse_response(xml), Err(ApiError::Fault(f)) if f.message == "X"));

        let both_false = "<Envelope><Body><RESULT><SUCCESS>false</SUCCESS>\
            <SUCCESS>false</SUCCESS></RESULT></Body></Envelope>";
        assert!(matches!(parse_response(both_false), Err(ApiError::Fault(_))));

        let response =
            parse_response(&envelope("<SUCCESS>TRUE</SUCCESS><SUCCESS>true</SUCCESS>")).unwrap();
        assert_eq!(response.success(), Some(true));
    }

    #[test]
    fn test_success_flag_ignores_surrounding_whitespace() {
        let xml = "<Envelope><Body><RESULT><SUCCESS>\n  false\n</SUCCESS></RESULT>\
            </Body></Envelope>";
        assert!(matches!(parse_response(xml), Err(ApiError::Fault(_))));
    }

    #[test]
    fn test_trailing_markup_is_a_parse_error() {
        let xml = "<Envelope><Body><RESULT><SUCCESS>true</SUCCESS></RESULT></Body></Envelope>\
                   <oops><unclosed>";
        assert!(matches!(
            parse_response(xml),
            Err(ApiError::Xml(XmlError::ParseError(_)))
        ));
    }

    #[test]
    fn test_missing_success_is_not_a_fault() {
        let response = parse_response(&envelope("<JOB_ID>7</JOB_ID>")).unwrap();
        assert_eq!(response.success(), None);
        assert_eq!(response.get_str("JOB_ID"), Some("7"));
    }

    #[test]
    fn test_repeated_tags_collapse_in_document_order() {
        let response = parse_response(&envelope(
            "<SUCCESS>true</SUCCESS>\
             <LIST><ID>1</ID><ITEM>a</ITEM><ITEM>b</ITEM><ITEM>c</ITEM></LIST>\
             <LIST><ID>2</ID></LIST>",
        ))
        .unwrap();

        let lists = response.get("LIST").and_then(ResponseNode::as_list).unwrap();
        assert_eq!(lists.len(), 2);

        let first = lists[0].as_map().unwrap();
        assert_eq!(first.get_str("ID"), Some("1"));
        let items: Vec<_> = first
            .get("ITEM")
            .unwrap()
            .iter_items()
            .filter_map(ResponseNode::as_str)
            .collect();
        assert_eq!(items, vec!["a", "b", "c"]);

        assert_eq!(lists[1].as_map().unwrap().get_str("ID"), Some("2"));
    }

    #[test]
    fn test_columns_become_name_value_mapping() {
        let response = parse_response(&envelope(
            "<SUCCESS>TRUE</SUCCESS><EMAIL>a@b.com</EMAIL>\
             <COLUMNS>\
             <COLUMN><NAME>Customer Id</NAME><VALUE>123-45</VALUE></COLUMN>\
             <COLUMN><NAME>donor_email</NAME><VALUE/></COLUMN>\
             </COLUMNS>",
        ))
        .unwrap();

        let columns = response.columns().unwrap();
        assert_eq!(columns.get_str("Customer Id"), Some("123-45"));
        assert_eq!(columns.get_str("donor_email"), Some(""));
        assert_eq!(
            response
                .get_path(&["COLUMNS", "Customer Id"])
                .and_then(ResponseNode::as_str),
            Some("123-45")
        );
    }

    #[test]
    fn test_column_metadata_falls_back_to_generic_flattening() {
        let response = parse_response(&envelope(
            "<SUCCESS>TRUE</SUCCESS><COLUMNS>\
             <COLUMN><NAME>EMAIL</NAME><TYPE>9</TYPE></COLUMN>\
             <COLUMN><NAME>City</NAME><TYPE>0</TYPE></COLUMN>\
             </COLUMNS>",
        ))
        .unwrap();

        let columns = response.get_path(&["COLUMNS", "COLUMN"]).unwrap();
        let names: Vec<_> = columns
            .iter_items()
            .filter_map(|c| c.as_map()?.get_str("NAME"))
            .collect();
        assert_eq!(names, vec!["EMAIL", "City"]);
    }

    #[test]
    fn test_missing_result_is_a_parse_error() {
        assert!(matches!(
            parse_response("<Envelope><Body/></Envelope>"),
            Err(ApiError::Xml(XmlError::MissingElement(_)))
        ));
    }

    #[test]
    fn test_fault_without_result() {
        let xml = "<Envelope><Body><Fault><FaultString>Session expired</FaultString></Fault>\
                   </Body></Envelope>";
        assert!(matches!(
            parse_response(xml),
            Err(ApiError::Fault(f)) if f.message == "Session expired"
        ));
    }

    #[test]
    fn test_non_xml_body_is_a_parse_error() {
        assert!(matches!(
            parse_response("<html><body>Bad Gateway"),
            Err(ApiError::Xml(_))
        ));
        assert!(matches!(parse_response("not xml"), Err(ApiError::Xml(_))));
    }

    #[test]
    fn test_serializes_to_ordered_json() {
        let response = parse_response(&envelope(
            "<SUCCESS>true</SUCCESS><Z>1</Z><A><B>x</B><B>y</B></A>",
        ))
        .unwrap();
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"SUCCESS":"true","Z":"1","A":{"B":["x","y"]}}"#
        );
    }
}
