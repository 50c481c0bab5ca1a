//! Utility modules for the RBAC engine
//!
//! - **error**: error taxonomy and the crate-wide `Result` alias
//! - **logging**: tracing subscriber setup

pub mod error;
pub mod logging;

pub use error::{RbacError, Result};
pub use logging::{LogFormat, init_logging};
