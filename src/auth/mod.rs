//! Authentication boundary types
//!
//! Credential validation itself is external: a principal resolver verifies
//! the bearer credential and yields a user id. This module only defines the
//! typed value the transport layer constructs from that output.

pub mod principal;

pub use principal::AuthenticatedPrincipal;
