//! Role-based access control engine
//!
//! The engine is composed of five parts over one shared document store:
//! the permission and role catalogs, the menu tree, user-role bindings,
//! and the authorization resolver that answers permission checks and
//! builds permission-filtered menu trees.

pub mod bindings;
pub mod bootstrap;
pub mod menus;
pub mod permissions;
pub mod resolver;
pub mod roles;
#[cfg(test)]
mod tests;
pub mod types;

pub use bindings::UserRoleBindings;
pub use bootstrap::{RbacSeeder, SeedSummary};
pub use menus::{MenuListFilter, MenuTree};
pub use permissions::{PermissionCatalog, PermissionListFilter};
pub use resolver::AuthorizationResolver;
pub use roles::{RoleCatalog, RoleListFilter};
pub use types::{
    CreateMenu, CreatePermission, CreateRole, Menu, MenuNode, MenuStatus, MenuType, Permission,
    PermissionAction, Role, RoleType, UpdateMenu, UpdatePermission, UpdateRole, UserRoleBinding,
};

use crate::config::RbacConfig;
use crate::storage::DocumentStore;
use crate::utils::error::Result;
use std::sync::Arc;
use tracing::info;

/// The assembled RBAC engine
#[derive(Debug, Clone)]
pub struct RbacEngine {
    /// Permission catalog
    pub permissions: PermissionCatalog,
    /// Role catalog
    pub roles: RoleCatalog,
    /// Menu catalog and tree construction
    pub menus: MenuTree,
    /// User-role binding assignment and resolution
    pub bindings: UserRoleBindings,
    /// Effective-permission and menu-tree resolution
    pub resolver: AuthorizationResolver,
}

impl RbacEngine {
    /// Assemble the engine over a shared document store
    pub fn new(store: Arc<dyn DocumentStore>, config: RbacConfig) -> Self {
        info!("initializing RBAC engine");
        Self {
            permissions: PermissionCatalog::new(store.clone()),
            roles: RoleCatalog::new(store.clone()),
            menus: MenuTree::new(store.clone(), config.tree_fetch_limit),
            bindings: UserRoleBindings::new(store.clone(), config.clone()),
            resolver: AuthorizationResolver::new(store, config),
        }
    }

    /// Seed the default permission, role and menu dataset. Idempotent;
    /// created entities carry `actor_id` as provenance.
    pub async fn seed_defaults(&self, actor_id: &str) -> Result<SeedSummary> {
        RbacSeeder::new(self, actor_id).run().await
    }
}
