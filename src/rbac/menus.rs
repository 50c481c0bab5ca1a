//! Menu tree
//!
//! CRUD over menu entities arranged in a parent/child forest, plus the tree
//! construction used by the navigation surface. The `parent_id` graph must
//! stay acyclic; re-parenting walks the candidate parent's ancestor chain
//! before accepting the change.

use crate::storage::{DocumentStore, Filter, Page, SortKey, collections};
use crate::utils::error::{RbacError, Result};
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::types::{CreateMenu, Menu, MenuNode, MenuStatus, MenuType, UpdateMenu};

/// List filter for menus
#[derive(Debug, Clone, Default)]
pub struct MenuListFilter {
    /// Exact match on the entry kind
    pub menu_type: Option<MenuType>,
    /// Case-insensitive substring match on the display title
    pub title: Option<String>,
}

/// Catalog of menu entities and the tree construction over them
#[derive(Debug, Clone)]
pub struct MenuTree {
    store: Arc<dyn DocumentStore>,
    fetch_limit: usize,
}

impl MenuTree {
    /// Create a menu catalog over the given store. `fetch_limit` bounds the
    /// number of active menus fetched when building the tree.
    pub fn new(store: Arc<dyn DocumentStore>, fetch_limit: usize) -> Self {
        Self { store, fetch_limit }
    }

    /// Create a menu. A set `parent_id` must resolve to an existing menu,
    /// otherwise [`RbacError::BadRequest`]; a duplicate symbolic `name` is a
    /// [`RbacError::Conflict`].
    pub async fn create(&self, data: CreateMenu, creator_id: &str) -> Result<Menu> {
        if data.name.is_empty() || data.title.is_empty() {
            return Err(RbacError::validation("menu name and title are required"));
        }

        if self.get_by_name(&data.name).await?.is_some() {
            return Err(RbacError::conflict(format!(
                "menu name {} already exists",
                data.name
            )));
        }

        if let Some(parent_id) = &data.parent_id {
            if self.get(parent_id).await?.is_none() {
                return Err(RbacError::bad_request(format!(
                    "parent menu {} does not exist",
                    parent_id
                )));
            }
        }

        let now = Utc::now();
        let menu = Menu {
            id: Uuid::new_v4().to_string(),
            name: data.name,
            title: data.title,
            path: data.path,
            component: data.component,
            icon: data.icon,
            menu_type: data.menu_type,
            parent_id: data.parent_id,
            sort_order: data.sort_order,
            is_hidden: data.is_hidden,
            is_cache: data.is_cache,
            is_affix: data.is_affix,
            status: data.status,
            permission_code: data.permission_code,
            redirect: data.redirect,
            meta: data.meta,
            created_by: Some(creator_id.to_string()),
            created_at: now,
            updated_at: now,
        };

        self.store
            .insert(collections::MENUS, serde_json::to_value(&menu)?)
            .await?;

        info!(name = %menu.name, parent = ?menu.parent_id, "created menu");
        Ok(menu)
    }

    /// Fetch a menu by id; absence is not an error
    pub async fn get(&self, id: &str) -> Result<Option<Menu>> {
        match self.store.find_by_id(collections::MENUS, id).await? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    /// Fetch a menu by its symbolic name
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Menu>> {
        let filter = Filter::new().eq("name", name);
        let mut found = self
            .store
            .find(collections::MENUS, &filter, Page::first(1), &[])
            .await?;
        match found.pop() {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    /// Apply the non-`None` fields of `data` and refresh `updated_at`.
    /// A new `parent_id` must resolve and must not introduce a cycle.
    pub async fn update(&self, id: &str, data: UpdateMenu) -> Result<Menu> {
        if self.get(id).await?.is_none() {
            return Err(RbacError::not_found(format!("menu {} not found", id)));
        }

        if let Some(parent_id) = &data.parent_id {
            if self.get(parent_id).await?.is_none() {
                return Err(RbacError::bad_request(format!(
                    "parent menu {} does not exist",
                    parent_id
                )));
            }
            self.check_no_cycle(id, parent_id).await?;
        }

        let mut fields = Map::new();
        if let Some(title) = data.title {
            fields.insert("title".to_string(), Value::String(title));
        }
        if let Some(path) = data.path {
            fields.insert("path".to_string(), Value::String(path));
        }
        if let Some(component) = data.component {
            fields.insert("component".to_string(), Value::String(component));
        }
        if let Some(icon) = data.icon {
            fields.insert("icon".to_string(), Value::String(icon));
        }
        if let Some(menu_type) = data.menu_type {
            fields.insert("type".to_string(), serde_json::to_value(menu_type)?);
        }
        if let Some(parent_id) = data.parent_id {
            fields.insert("parent_id".to_string(), Value::String(parent_id));
        }
        if let Some(sort_order) = data.sort_order {
            fields.insert("sort_order".to_string(), sort_order.into());
        }
        if let Some(is_hidden) = data.is_hidden {
            fields.insert("is_hidden".to_string(), Value::Bool(is_hidden));
        }
        if let Some(is_cache) = data.is_cache {
            fields.insert("is_cache".to_string(), Value::Bool(is_cache));
        }
        if let Some(is_affix) = data.is_affix {
            fields.insert("is_affix".to_string(), Value::Bool(is_affix));
        }
        if let Some(status) = data.status {
            fields.insert("status".to_string(), serde_json::to_value(status)?);
        }
        if let Some(permission_code) = data.permission_code {
            fields.insert("permission_code".to_string(), Value::String(permission_code));
        }
        if let Some(redirect) = data.redirect {
            fields.insert("redirect".to_string(), Value::String(redirect));
        }
        if let Some(meta) = data.meta {
            fields.insert("meta".to_string(), Value::Object(meta));
        }
        fields.insert("updated_at".to_string(), serde_json::to_value(Utc::now())?);

        self.store
            .update_fields(collections::MENUS, id, fields)
            .await?;

        debug!(id = %id, "updated menu");
        self.get(id)
            .await?
            .ok_or_else(|| RbacError::not_found(format!("menu {} not found", id)))
    }

    /// Delete a menu. Fails with [`RbacError::Conflict`] while any menu
    /// declares it as parent, and with [`RbacError::NotFound`] when the id
    /// does not resolve. Deleting a leaf never cascades.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let children = self
            .store
            .count(collections::MENUS, &Filter::new().eq("parent_id", id))
            .await?;
        if children > 0 {
            return Err(RbacError::conflict(format!(
                "menu {} has {} child menu(s) and cannot be deleted",
                id, children
            )));
        }

        let deleted = self.store.delete(collections::MENUS, id).await?;
        if deleted == 0 {
            return Err(RbacError::not_found(format!("menu {} not found", id)));
        }

        info!(id = %id, "deleted menu");
        Ok(true)
    }

    /// List menus ordered by `sort_order`, ties broken by creation time
    pub async fn list(
        &self,
        skip: usize,
        limit: usize,
        filter: MenuListFilter,
    ) -> Result<Vec<Menu>> {
        let mut store_filter = Filter::new();
        if let Some(menu_type) = filter.menu_type {
            store_filter = store_filter.eq("type", serde_json::to_value(menu_type)?);
        }
        if let Some(title) = filter.title {
            store_filter = store_filter.contains_ci("title", title);
        }

        let sort = [SortKey::asc("sort_order"), SortKey::asc("created_at")];
        let docs = self
            .store
            .find(
                collections::MENUS,
                &store_filter,
                Page::new(skip, limit),
                &sort,
            )
            .await?;

        docs.into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(RbacError::from))
            .collect()
    }

    /// Build the forest of active menus, ordered by `sort_order`.
    ///
    /// When `permission_filter` is given, only menus whose `permission_code`
    /// is absent or contained in the set are retained. Parent/child links are
    /// resolved in a single pass over an id-keyed map; a retained menu whose
    /// parent was filtered out becomes a root.
    pub async fn tree(&self, permission_filter: Option<&HashSet<String>>) -> Result<Vec<MenuNode>> {
        let filter = Filter::new().eq("status", serde_json::to_value(MenuStatus::Active)?);
        let sort = [SortKey::asc("sort_order")];
        let docs = self
            .store
            .find(
                collections::MENUS,
                &filter,
                Page::first(self.fetch_limit),
                &sort,
            )
            .await?;

        let mut menus: Vec<Menu> = docs
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(RbacError::from))
            .collect::<Result<_>>()?;

        if let Some(granted) = permission_filter {
            menus.retain(|menu| {
                menu.permission_code
                    .as_ref()
                    .map(|code| granted.contains(code))
                    .unwrap_or(true)
            });
        }

        Ok(build_forest(menus))
    }

    /// Walk the ancestor chain starting at `candidate_parent`; reject the
    /// re-parenting when the chain reaches `menu_id`.
    async fn check_no_cycle(&self, menu_id: &str, candidate_parent: &str) -> Result<()> {
        if menu_id == candidate_parent {
            return Err(RbacError::bad_request(
                "menu cannot be its own parent".to_string(),
            ));
        }

        let mut visited = HashSet::new();
        let mut current = candidate_parent.to_string();
        loop {
            if current == menu_id {
                return Err(RbacError::bad_request(format!(
                    "setting parent {} on menu {} would create a cycle",
                    candidate_parent, menu_id
                )));
            }
            if !visited.insert(current.clone()) {
                // Pre-existing cycle in stored data; refuse to extend it.
                warn!(menu = %menu_id, "ancestor chain already contains a cycle");
                return Err(RbacError::bad_request(
                    "menu ancestor chain contains a cycle".to_string(),
                ));
            }
            match self.get(&current).await?.and_then(|menu| menu.parent_id) {
                Some(parent_id) => current = parent_id,
                None => return Ok(()),
            }
        }
    }
}

/// Attach every menu to its parent in one pass over an id-keyed index.
/// Menus whose `parent_id` is unset or not in the retained set are roots.
fn build_forest(menus: Vec<Menu>) -> Vec<MenuNode> {
    let index_by_id: HashMap<String, usize> = menus
        .iter()
        .enumerate()
        .map(|(index, menu)| (menu.id.clone(), index))
        .collect();

    let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); menus.len()];
    let mut roots = Vec::new();
    for (index, menu) in menus.iter().enumerate() {
        match menu
            .parent_id
            .as_ref()
            .and_then(|parent_id| index_by_id.get(parent_id))
        {
            Some(&parent_index) => children_of[parent_index].push(index),
            None => roots.push(index),
        }
    }

    fn build(index: usize, menus: &mut Vec<Option<Menu>>, children_of: &[Vec<usize>]) -> Option<MenuNode> {
        let menu = menus[index].take()?;
        let children = children_of[index]
            .iter()
            .filter_map(|&child| build(child, menus, children_of))
            .collect();
        Some(MenuNode { menu, children })
    }

    let mut slots: Vec<Option<Menu>> = menus.into_iter().map(Some).collect();
    roots
        .into_iter()
        .filter_map(|root| build(root, &mut slots, &children_of))
        .collect()
}
