//! XML layer: request serialization, the relational row encoder, and response
//! normalization, all on top of a small quick-xml backed element tree.

pub mod element;
pub mod error;
pub mod relational;
pub mod request;
pub mod response;

pub use element::XmlElement;
pub use error::XmlError;
pub use relational::{encode_rows, RelationalRow};
pub use request::map_to_xml;
pub use response::{parse_response, ApiResponse, ResponseFault, ResponseMap, ResponseNode};
