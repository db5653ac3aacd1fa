//! Adapters between dispatcher values and the Qualys wire format.
//!
//! - [`form`] renders request parameters as `application/x-www-form-urlencoded`.
//! - [`normalize`] turns XML response bodies into JSON values.
//! - [`transport`] defines the seam the dispatcher sends requests through.
//! - [`qualys`] implements that seam over pooled HTTPS connections.

#![warn(missing_docs, clippy::pedantic)]

pub mod form;
pub mod normalize;
pub mod qualys;
pub mod transport;

mod http_client;

pub use form::{FormBody, bool_token, encode_form};
pub use normalize::{RAW_FIELD, is_raw, normalize};
pub use qualys::QualysClient;
pub use transport::{
    FORM_CONTENT_TYPE, JSON_CONTENT_TYPE, Transport, TransportError, TransportResult, WireRequest,
    WireResponse,
};
