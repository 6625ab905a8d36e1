//! # knx-router
//!
//! The resource router: a registry of application resources
//! plus a small set of illustrative core resources, URI matching (exact
//! then wildcard), interface-mask access control, and content-type
//! negotiation.
//!
//! ## Modules
//!
//! - [`resource`] — `Resource` fields and the interface-mask bitset.
//! - [`registry`] — The resource list itself: register, exact/wildcard
//!   lookup, and the fixed set of illustrative core resources.
//! - [`linkformat`] — `/.well-known/core` and `/p` link-format rendering.

pub mod linkformat;
pub mod registry;
pub mod resource;

pub use registry::{check_access, check_method, negotiate_content_format, ResourceRegistry};
pub use resource::{InterfaceMask, MethodMask, Resource};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RouterError {
    #[error("no resource matches this URI")]
    NotFound,
    #[error("method not allowed on this resource")]
    MethodNotAllowed,
    #[error("insufficient interface-mask scope")]
    Forbidden,
    #[error("requested content format is not acceptable")]
    NotAcceptable,
}

pub type Result<T> = std::result::Result<T, RouterError>;
