//! Silverpop / IBM Marketing Cloud XML API Client Library
//!
//! This library turns named operations and their arguments into the vendor's
//! XML request documents, posts them over an OAuth-authenticated transport,
//! and normalizes the XML responses into ordered maps.
//!
//! # Modules
//!
//! - `catalog`: Static operation records (command, request shape, arguments).
//! - `client`: High-level client that invokes catalog operations.
//! - `config`: Configuration management.
//! - `definition`: Definition templates and argument substitution.
//! - `dispatch`: Argument validation and generic request building.
//! - `errors`: Error handling types.
//! - `transport`: HTTP transport and OAuth token cache.
//! - `value`: Argument values and ordered argument sets.
//! - `xml`: Request serialization, relational encoder, response normalizer.

pub mod catalog;
pub mod client;
pub mod config;
pub mod definition;
pub mod dispatch;
pub mod errors;
pub mod transport;
pub mod value;
pub mod xml;

pub use client::SilverpopClient;
pub use config::Config;
pub use errors::ApiError;
pub use value::{Args, Value};
pub use xml::{ApiResponse, ResponseFault};
