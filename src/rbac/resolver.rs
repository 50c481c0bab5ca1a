//! Authorization resolver
//!
//! Composes the catalogs to answer "what can this user do" and "which menus
//! can this user see". Boolean permission checks are fail-closed: any
//! resolution failure is logged and reported as denied, never raised,
//! because permission checks gate ordinary request flows and must not
//! become a crash vector.

use crate::auth::AuthenticatedPrincipal;
use crate::config::RbacConfig;
use crate::storage::{DocumentStore, collections};
use crate::utils::error::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use super::bindings::UserRoleBindings;
use super::menus::MenuTree;
use super::types::{MenuNode, Permission};

/// Resolves effective permission sets and permission-filtered menu trees
#[derive(Debug, Clone)]
pub struct AuthorizationResolver {
    store: Arc<dyn DocumentStore>,
    bindings: UserRoleBindings,
    menus: MenuTree,
}

impl AuthorizationResolver {
    /// Create a resolver over the given store
    pub fn new(store: Arc<dyn DocumentStore>, config: RbacConfig) -> Self {
        let bindings = UserRoleBindings::new(store.clone(), config.clone());
        let menus = MenuTree::new(store.clone(), config.tree_fetch_limit);
        Self {
            store,
            bindings,
            menus,
        }
    }

    /// Compute the user's effective permission set: the deduplicated union
    /// of permission codes over every active role bound through an active
    /// binding, counting only permissions that are themselves active.
    ///
    /// An unknown user or a user with no bindings yields an empty set,
    /// never an error.
    pub async fn get_user_permissions(&self, user_id: &str) -> Result<HashSet<String>> {
        let roles = self.bindings.get_user_roles(user_id).await?;

        let mut permission_ids = HashSet::new();
        for role in roles.iter().filter(|role| role.active) {
            permission_ids.extend(role.permissions.iter().cloned());
        }

        let mut codes = HashSet::with_capacity(permission_ids.len());
        for permission_id in &permission_ids {
            let Some(doc) = self
                .store
                .find_by_id(collections::PERMISSIONS, permission_id)
                .await?
            else {
                continue;
            };
            let permission: Permission = serde_json::from_value(doc)?;
            if permission.active {
                codes.insert(permission.code);
            }
        }

        debug!(user = %user_id, permissions = codes.len(), "resolved effective permission set");
        Ok(codes)
    }

    /// Whether the user's effective set contains `code`. Fail-closed: a
    /// resolution error is reported as denied.
    pub async fn check_permission(&self, user_id: &str, code: &str) -> bool {
        match self.get_user_permissions(user_id).await {
            Ok(granted) => granted.contains(code),
            Err(error) => {
                warn!(user = %user_id, code = %code, %error, "permission check failed, denying");
                false
            }
        }
    }

    /// Test several codes against the effective set, resolving it once.
    /// Combines with AND when `require_all`, otherwise OR. Fail-closed.
    pub async fn check_permissions(
        &self,
        user_id: &str,
        codes: &[String],
        require_all: bool,
    ) -> bool {
        let granted = match self.get_user_permissions(user_id).await {
            Ok(granted) => granted,
            Err(error) => {
                warn!(user = %user_id, %error, "permission check failed, denying");
                return false;
            }
        };

        if require_all {
            codes.iter().all(|code| granted.contains(code))
        } else {
            codes.iter().any(|code| granted.contains(code))
        }
    }

    /// The menu forest visible to the user: active menus whose
    /// `permission_code` is absent or contained in the user's effective set.
    ///
    /// A role granted every permission (the conventional super-admin setup)
    /// sees the unfiltered tree without special-casing.
    pub async fn get_menu_tree(&self, user_id: &str) -> Result<Vec<MenuNode>> {
        let granted = self.get_user_permissions(user_id).await?;
        self.menus.tree(Some(&granted)).await
    }

    /// Build the typed principal value for the request boundary: the user
    /// id plus the codes of the roles currently bound to it.
    pub async fn principal(&self, user_id: &str) -> Result<AuthenticatedPrincipal> {
        let roles = self.bindings.get_user_roles(user_id).await?;
        let codes = roles
            .into_iter()
            .filter(|role| role.active)
            .map(|role| role.code)
            .collect();
        Ok(AuthenticatedPrincipal::new(user_id, codes))
    }
}
