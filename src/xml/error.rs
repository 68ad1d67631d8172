//! XML serialization/parsing errors.

use std::io;

/// Errors that can occur while writing request XML or reading response XML.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// An I/O error during XML writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An error from the underlying quick-xml library.
    #[error("XML processing error: {0}")]
    QuickXml(#[from] quick_xml::Error),

    /// A required XML element was missing.
    #[error("missing required XML element: {0}")]
    MissingElement(String),

    /// The document ended while elements were still open.
    #[error("unexpected end of document inside <{0}>")]
    UnexpectedEof(String),

    /// Text or names that could not be decoded.
    #[error("failed to parse value: {0}")]
    ParseError(String),
}
