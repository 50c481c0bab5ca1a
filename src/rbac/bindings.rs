//! User-role bindings
//!
//! Assignment is a wholesale replace: the user's existing bindings are
//! removed and one fresh binding is inserted per requested role. A prior
//! binding not present in the new set is thereby revoked.

use crate::config::RbacConfig;
use crate::storage::{DocumentStore, Filter, Page, collections};
use crate::utils::error::{RbacError, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::types::{Role, UserRoleBinding};

/// Assignment and resolution of user-role bindings
#[derive(Debug, Clone)]
pub struct UserRoleBindings {
    store: Arc<dyn DocumentStore>,
    config: RbacConfig,
}

impl UserRoleBindings {
    /// Create a binding service over the given store
    pub fn new(store: Arc<dyn DocumentStore>, config: RbacConfig) -> Self {
        Self { store, config }
    }

    /// Replace the user's bindings with one binding per id in `role_ids`.
    ///
    /// Every role id must resolve, otherwise [`RbacError::NotFound`] and no
    /// binding is touched. The replace is two store operations (delete, then
    /// inserts), not a transaction: a concurrent resolution between the two
    /// observes the user with no roles. Stores with multi-document
    /// transactions can wrap this call to close the window.
    pub async fn assign_roles(
        &self,
        user_id: &str,
        role_ids: &[String],
        assigner_id: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Vec<UserRoleBinding>> {
        if user_id.is_empty() {
            return Err(RbacError::validation("user id is required"));
        }

        for role_id in role_ids {
            if self
                .store
                .find_by_id(collections::ROLES, role_id)
                .await?
                .is_none()
            {
                return Err(RbacError::not_found(format!("role {} not found", role_id)));
            }
        }

        let removed = self
            .store
            .delete_by_filter(collections::USER_ROLES, &Filter::new().eq("user_id", user_id))
            .await?;
        debug!(user = %user_id, removed, "cleared previous role bindings");

        let now = Utc::now();
        let mut bindings = Vec::with_capacity(role_ids.len());
        for role_id in role_ids {
            let binding = UserRoleBinding {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                role_id: role_id.clone(),
                assigned_by: assigner_id.to_string(),
                assigned_at: now,
                expires_at,
                active: true,
            };
            self.store
                .insert(collections::USER_ROLES, serde_json::to_value(&binding)?)
                .await?;
            bindings.push(binding);
        }

        info!(user = %user_id, roles = bindings.len(), "assigned roles");
        Ok(bindings)
    }

    /// The user's bindings with `active = true`, unresolved
    pub async fn list_bindings(&self, user_id: &str) -> Result<Vec<UserRoleBinding>> {
        let filter = Filter::new().eq("user_id", user_id).eq("active", true);
        let docs = self
            .store
            .find(collections::USER_ROLES, &filter, Page::all(), &[])
            .await?;

        let mut bindings: Vec<UserRoleBinding> = docs
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(RbacError::from))
            .collect::<Result<_>>()?;

        if self.config.enforce_expiration {
            let now = Utc::now();
            bindings.retain(|binding| binding.expires_at.map(|at| at > now).unwrap_or(true));
        }

        Ok(bindings)
    }

    /// Resolve the user's active bindings to role entities, skipping role
    /// ids that no longer resolve. An unknown user yields an empty list.
    pub async fn get_user_roles(&self, user_id: &str) -> Result<Vec<Role>> {
        let bindings = self.list_bindings(user_id).await?;

        let mut roles = Vec::with_capacity(bindings.len());
        for binding in &bindings {
            match self
                .store
                .find_by_id(collections::ROLES, &binding.role_id)
                .await?
            {
                Some(doc) => roles.push(serde_json::from_value(doc)?),
                None => {
                    warn!(
                        user = %user_id,
                        role = %binding.role_id,
                        "skipping stale role binding"
                    );
                }
            }
        }
        Ok(roles)
    }
}
