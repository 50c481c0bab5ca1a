//! Role catalog
//!
//! CRUD over role entities. A role references permissions by id; the
//! references are validated on create and update, while resolution of an
//! already-stored role tolerates ids that no longer resolve.

use crate::storage::{DocumentStore, Filter, Page, SortKey, collections};
use crate::utils::error::{RbacError, Result};
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::types::{CreateRole, Permission, Role, RoleType, UpdateRole};

/// List filter for roles
#[derive(Debug, Clone, Default)]
pub struct RoleListFilter {
    /// Case-insensitive substring match on the display name
    pub name: Option<String>,
    /// Exact match on the role category
    pub role_type: Option<RoleType>,
}

/// Catalog of role entities
#[derive(Debug, Clone)]
pub struct RoleCatalog {
    store: Arc<dyn DocumentStore>,
}

impl RoleCatalog {
    /// Create a catalog over the given store
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a role. Fails with [`RbacError::Conflict`] when the `code`
    /// already exists and with [`RbacError::Validation`] when a referenced
    /// permission id does not resolve.
    pub async fn create(&self, data: CreateRole, creator_id: &str) -> Result<Role> {
        if data.code.is_empty() || data.name.is_empty() {
            return Err(RbacError::validation("role code and name are required"));
        }

        if self.get_by_code(&data.code).await?.is_some() {
            return Err(RbacError::conflict(format!(
                "role code {} already exists",
                data.code
            )));
        }

        self.check_permission_refs(&data.permissions).await?;

        let now = Utc::now();
        let role = Role {
            id: Uuid::new_v4().to_string(),
            name: data.name,
            code: data.code,
            role_type: data.role_type,
            description: data.description,
            active: data.active,
            is_default: data.is_default,
            sort_order: data.sort_order,
            permissions: data.permissions,
            created_by: Some(creator_id.to_string()),
            created_at: now,
            updated_at: now,
        };

        self.store
            .insert(collections::ROLES, serde_json::to_value(&role)?)
            .await?;

        info!(code = %role.code, permissions = role.permissions.len(), "created role");
        Ok(role)
    }

    /// Fetch a role by id; absence is not an error
    pub async fn get(&self, id: &str) -> Result<Option<Role>> {
        match self.store.find_by_id(collections::ROLES, id).await? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    /// Fetch a role by its stable code
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Role>> {
        let filter = Filter::new().eq("code", code);
        let mut found = self
            .store
            .find(collections::ROLES, &filter, Page::first(1), &[])
            .await?;
        match found.pop() {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    /// Apply the non-`None` fields of `data` and refresh `updated_at`.
    /// Fails with [`RbacError::NotFound`] when the id does not resolve.
    pub async fn update(&self, id: &str, data: UpdateRole) -> Result<Role> {
        if self.get(id).await?.is_none() {
            return Err(RbacError::not_found(format!("role {} not found", id)));
        }

        let mut fields = Map::new();
        if let Some(name) = data.name {
            fields.insert("name".to_string(), Value::String(name));
        }
        if let Some(description) = data.description {
            fields.insert("description".to_string(), Value::String(description));
        }
        if let Some(active) = data.active {
            fields.insert("active".to_string(), Value::Bool(active));
        }
        if let Some(is_default) = data.is_default {
            fields.insert("is_default".to_string(), Value::Bool(is_default));
        }
        if let Some(sort_order) = data.sort_order {
            fields.insert("sort_order".to_string(), sort_order.into());
        }
        if let Some(permissions) = data.permissions {
            self.check_permission_refs(&permissions).await?;
            fields.insert("permissions".to_string(), serde_json::to_value(permissions)?);
        }
        fields.insert("updated_at".to_string(), serde_json::to_value(Utc::now())?);

        self.store
            .update_fields(collections::ROLES, id, fields)
            .await?;

        debug!(id = %id, "updated role");
        self.get(id)
            .await?
            .ok_or_else(|| RbacError::not_found(format!("role {} not found", id)))
    }

    /// Delete a role. Fails with [`RbacError::Conflict`] while any user-role
    /// binding references it, and with [`RbacError::NotFound`] when the id
    /// does not resolve.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let bound_users = self
            .store
            .count(collections::USER_ROLES, &Filter::new().eq("role_id", id))
            .await?;
        if bound_users > 0 {
            return Err(RbacError::conflict(format!(
                "role {} is bound to {} user(s) and cannot be deleted",
                id, bound_users
            )));
        }

        let deleted = self.store.delete(collections::ROLES, id).await?;
        if deleted == 0 {
            return Err(RbacError::not_found(format!("role {} not found", id)));
        }

        info!(id = %id, "deleted role");
        Ok(true)
    }

    /// List roles ordered by `sort_order` ascending, ties broken by newest
    /// creation first
    pub async fn list(
        &self,
        skip: usize,
        limit: usize,
        filter: RoleListFilter,
    ) -> Result<Vec<Role>> {
        let mut store_filter = Filter::new();
        if let Some(name) = filter.name {
            store_filter = store_filter.contains_ci("name", name);
        }
        if let Some(role_type) = filter.role_type {
            store_filter = store_filter.eq("type", serde_json::to_value(role_type)?);
        }

        let sort = [SortKey::asc("sort_order"), SortKey::desc("created_at")];
        let docs = self
            .store
            .find(
                collections::ROLES,
                &store_filter,
                Page::new(skip, limit),
                &sort,
            )
            .await?;

        docs.into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(RbacError::from))
            .collect()
    }

    /// Resolve the role's permission ids to entities, silently skipping ids
    /// that no longer resolve. An unknown role id yields an empty list.
    pub async fn get_role_permissions(&self, role_id: &str) -> Result<Vec<Permission>> {
        let Some(role) = self.get(role_id).await? else {
            return Ok(Vec::new());
        };

        let mut permissions = Vec::with_capacity(role.permissions.len());
        for permission_id in &role.permissions {
            match self
                .store
                .find_by_id(collections::PERMISSIONS, permission_id)
                .await?
            {
                Some(doc) => permissions.push(serde_json::from_value(doc)?),
                None => {
                    warn!(
                        role = %role_id,
                        permission = %permission_id,
                        "skipping stale permission reference"
                    );
                }
            }
        }
        Ok(permissions)
    }

    /// Validate that each id resolves to a stored permission
    async fn check_permission_refs(&self, permission_ids: &[String]) -> Result<()> {
        for permission_id in permission_ids {
            if self
                .store
                .find_by_id(collections::PERMISSIONS, permission_id)
                .await?
                .is_none()
            {
                return Err(RbacError::validation(format!(
                    "permission {} does not exist",
                    permission_id
                )));
            }
        }
        Ok(())
    }
}
