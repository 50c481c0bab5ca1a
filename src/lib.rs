//! # mealplan-rbac
//!
//! Role-based access control engine for a recipe and meal-planning backend.
//!
//! The engine manages the catalog of permissions, roles and hierarchical
//! menus, binds roles to users, and resolves a user's effective permission
//! set and permission-filtered menu tree. It is storage-agnostic: all
//! persistence goes through the [`storage::DocumentStore`] contract, with an
//! in-memory implementation provided for tests and embedded use.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mealplan_rbac::{RbacEngine, RbacConfig, MemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!     let engine = RbacEngine::new(store, RbacConfig::default());
//!
//!     // Materialize the default permission/role/menu dataset.
//!     engine.seed_defaults("system").await?;
//!
//!     // Bind a role and check a permission.
//!     let admin = engine.roles.get_by_code("admin").await?.unwrap();
//!     engine
//!         .bindings
//!         .assign_roles("user-42", &[admin.id], "system", None)
//!         .await?;
//!     assert!(engine.resolver.check_permission("user-42", "role:read").await);
//!
//!     Ok(())
//! }
//! ```
//!
//! Credential validation, transport, and domain CRUD are external
//! collaborators; the engine only ever receives an authenticated user id.

#![warn(clippy::all)]

pub mod auth;
pub mod config;
pub mod rbac;
pub mod storage;
pub mod utils;

// Re-export the main types
pub use auth::AuthenticatedPrincipal;
pub use config::{Config, RbacConfig};
pub use rbac::{
    AuthorizationResolver, MenuNode, MenuTree, PermissionCatalog, RbacEngine, RbacSeeder,
    RoleCatalog, SeedSummary, UserRoleBindings,
};
pub use storage::{DocumentStore, MemoryStore};
pub use utils::error::{RbacError, Result};
