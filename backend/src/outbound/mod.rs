//! Outbound adapters implementing domain ports.
//!
//! - **identity**: OAuth 2.0 authorisation-code exchange against an external
//!   identity provider
//! - **memory**: in-process repositories for single-node runs and tests
//! - **persistence**: PostgreSQL repositories using Diesel
//! - **token**: HS256 JWT codec for identity claims
//!
//! Adapters translate between domain types and infrastructure
//! representations and hold no business rules.

pub mod identity;
pub mod memory;
pub mod persistence;
pub mod token;
