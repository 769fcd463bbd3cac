//! Inspection backend library modules.
//!
//! Hexagonal layout: `domain` holds roles, permissions, organisation scope,
//! and template versioning behind ports; `inbound` and `outbound` adapt
//! those ports to HTTP, PostgreSQL, in-memory storage, and signed tokens.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;

/// Public OpenAPI surface used by tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
