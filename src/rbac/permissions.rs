//! Permission catalog
//!
//! CRUD over permission entities. A permission's `code` is immutable after
//! creation, and a permission referenced by any role cannot be deleted.

use crate::storage::{DocumentStore, Filter, Page, SortKey, collections};
use crate::utils::error::{RbacError, Result};
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::types::{CreatePermission, Permission, PermissionAction, UpdatePermission};

/// List filter for permissions; fields combine with AND, exact match
#[derive(Debug, Clone, Default)]
pub struct PermissionListFilter {
    /// Restrict to this resource
    pub resource: Option<String>,
    /// Restrict to this action
    pub action: Option<PermissionAction>,
}

/// Catalog of permission entities
#[derive(Debug, Clone)]
pub struct PermissionCatalog {
    store: Arc<dyn DocumentStore>,
}

impl PermissionCatalog {
    /// Create a catalog over the given store
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a permission. Fails with [`RbacError::Conflict`] when the
    /// `code` already exists.
    pub async fn create(&self, data: CreatePermission, creator_id: &str) -> Result<Permission> {
        if data.code.is_empty() || data.name.is_empty() || data.resource.is_empty() {
            return Err(RbacError::validation(
                "permission code, name and resource are required",
            ));
        }

        if self.get_by_code(&data.code).await?.is_some() {
            return Err(RbacError::conflict(format!(
                "permission code {} already exists",
                data.code
            )));
        }

        let now = Utc::now();
        let permission = Permission {
            id: Uuid::new_v4().to_string(),
            name: data.name,
            code: data.code,
            description: data.description,
            resource: data.resource,
            action: data.action,
            active: data.active,
            created_by: Some(creator_id.to_string()),
            created_at: now,
            updated_at: now,
        };

        self.store
            .insert(collections::PERMISSIONS, serde_json::to_value(&permission)?)
            .await?;

        info!(
            code = %permission.code,
            resource = %permission.resource,
            "created permission"
        );
        Ok(permission)
    }

    /// Fetch a permission by id; absence is not an error
    pub async fn get(&self, id: &str) -> Result<Option<Permission>> {
        match self.store.find_by_id(collections::PERMISSIONS, id).await? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    /// Fetch a permission by its stable code
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Permission>> {
        let filter = Filter::new().eq("code", code);
        let mut found = self
            .store
            .find(collections::PERMISSIONS, &filter, Page::first(1), &[])
            .await?;
        match found.pop() {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    /// Apply the non-`None` fields of `data` and refresh `updated_at`.
    /// Fails with [`RbacError::NotFound`] when the id does not resolve.
    pub async fn update(&self, id: &str, data: UpdatePermission) -> Result<Permission> {
        if self.get(id).await?.is_none() {
            return Err(RbacError::not_found(format!("permission {} not found", id)));
        }

        let mut fields = Map::new();
        if let Some(name) = data.name {
            fields.insert("name".to_string(), Value::String(name));
        }
        if let Some(description) = data.description {
            fields.insert("description".to_string(), Value::String(description));
        }
        if let Some(resource) = data.resource {
            fields.insert("resource".to_string(), Value::String(resource));
        }
        if let Some(action) = data.action {
            fields.insert("action".to_string(), serde_json::to_value(action)?);
        }
        if let Some(active) = data.active {
            fields.insert("active".to_string(), Value::Bool(active));
        }
        fields.insert("updated_at".to_string(), serde_json::to_value(Utc::now())?);

        self.store
            .update_fields(collections::PERMISSIONS, id, fields)
            .await?;

        debug!(id = %id, "updated permission");
        self.get(id)
            .await?
            .ok_or_else(|| RbacError::not_found(format!("permission {} not found", id)))
    }

    /// Delete a permission. Fails with [`RbacError::Conflict`] while any
    /// role's permission set references it, and with
    /// [`RbacError::NotFound`] when the id does not resolve.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let referencing_roles = self
            .store
            .count(
                collections::ROLES,
                &Filter::new().array_contains("permissions", id),
            )
            .await?;
        if referencing_roles > 0 {
            return Err(RbacError::conflict(format!(
                "permission {} is referenced by {} role(s) and cannot be deleted",
                id, referencing_roles
            )));
        }

        let deleted = self.store.delete(collections::PERMISSIONS, id).await?;
        if deleted == 0 {
            return Err(RbacError::not_found(format!("permission {} not found", id)));
        }

        info!(id = %id, "deleted permission");
        Ok(true)
    }

    /// List permissions ordered by `resource` then `action`
    pub async fn list(
        &self,
        skip: usize,
        limit: usize,
        filter: PermissionListFilter,
    ) -> Result<Vec<Permission>> {
        let mut store_filter = Filter::new();
        if let Some(resource) = filter.resource {
            store_filter = store_filter.eq("resource", resource);
        }
        if let Some(action) = filter.action {
            store_filter = store_filter.eq("action", serde_json::to_value(action)?);
        }

        let sort = [SortKey::asc("resource"), SortKey::asc("action")];
        let docs = self
            .store
            .find(
                collections::PERMISSIONS,
                &store_filter,
                Page::new(skip, limit),
                &sort,
            )
            .await?;

        docs.into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(RbacError::from))
            .collect()
    }
}
