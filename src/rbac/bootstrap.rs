//! Default dataset seeding
//!
//! Materializes the stock permission catalog, the four stock roles, and the
//! default menu forest. Seeding is idempotent: entities whose code or name
//! already exists are skipped and their stored ids recorded, so re-running
//! against a populated store is safe.
//!
//! Menus declare their parent by symbolic name, before the parent's id
//! exists. They are materialized with a two-pass builder: pass 1 inserts
//! every menu with no parent and records a name-to-id map, pass 2 patches
//! each child's `parent_id` from an explicit child/parent table.

use crate::utils::error::Result;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use tracing::{debug, info};

use super::RbacEngine;
use super::types::{
    CreateMenu, CreatePermission, CreateRole, MenuStatus, MenuType, PermissionAction, RoleType,
    UpdateMenu,
};

/// Counts of entities confirmed (created or already present) by a seed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Permissions confirmed
    pub permissions: usize,
    /// Roles confirmed
    pub roles: usize,
    /// Menus confirmed
    pub menus: usize,
}

struct PermissionSeed {
    name: &'static str,
    code: &'static str,
    resource: &'static str,
    action: PermissionAction,
    description: &'static str,
}

struct MenuSeed {
    name: &'static str,
    title: &'static str,
    path: &'static str,
    component: &'static str,
    icon: &'static str,
    sort_order: i64,
    permission_code: Option<&'static str>,
}

/// Seeds the default RBAC dataset through the engine's catalogs
pub struct RbacSeeder<'a> {
    engine: &'a RbacEngine,
    actor_id: String,
    permission_ids: HashMap<&'static str, String>,
    role_ids: HashMap<&'static str, String>,
    menu_ids: HashMap<&'static str, String>,
}

impl<'a> RbacSeeder<'a> {
    /// Create a seeder; created entities carry `actor_id` as provenance
    pub fn new(engine: &'a RbacEngine, actor_id: impl Into<String>) -> Self {
        Self {
            engine,
            actor_id: actor_id.into(),
            permission_ids: HashMap::new(),
            role_ids: HashMap::new(),
            menu_ids: HashMap::new(),
        }
    }

    /// Run the full seeding flow: permissions, then roles, then menus
    pub async fn run(mut self) -> Result<SeedSummary> {
        info!("seeding default RBAC dataset");

        self.seed_permissions().await?;
        self.seed_roles().await?;
        self.seed_menus().await?;

        let summary = SeedSummary {
            permissions: self.permission_ids.len(),
            roles: self.role_ids.len(),
            menus: self.menu_ids.len(),
        };
        info!(
            permissions = summary.permissions,
            roles = summary.roles,
            menus = summary.menus,
            "default RBAC dataset seeded"
        );
        Ok(summary)
    }

    async fn seed_permissions(&mut self) -> Result<()> {
        for seed in default_permissions() {
            if let Some(existing) = self.engine.permissions.get_by_code(seed.code).await? {
                debug!(code = %seed.code, "permission already exists, skipping");
                self.permission_ids.insert(seed.code, existing.id);
                continue;
            }

            let created = self
                .engine
                .permissions
                .create(
                    CreatePermission {
                        name: seed.name.to_string(),
                        code: seed.code.to_string(),
                        description: Some(seed.description.to_string()),
                        resource: seed.resource.to_string(),
                        action: seed.action,
                        active: true,
                    },
                    &self.actor_id,
                )
                .await?;
            self.permission_ids.insert(seed.code, created.id);
        }
        Ok(())
    }

    async fn seed_roles(&mut self) -> Result<()> {
        let all_permission_ids: Vec<String> = self.permission_ids.values().cloned().collect();
        let ids_for = |codes: &[&str], map: &HashMap<&'static str, String>| -> Vec<String> {
            codes.iter().filter_map(|code| map.get(code).cloned()).collect()
        };

        let admin_permissions = ids_for(
            &[
                "role:read",
                "permission:read",
                "menu:read",
                "user_role:assign",
                "user_role:read",
                "user_permission:read",
                "user:read",
                "user:update",
                "recipe:manage",
                "order:manage",
                "stats:view",
                "report:export",
            ],
            &self.permission_ids,
        );
        let member_permissions = ids_for(&["recipe:manage", "stats:view"], &self.permission_ids);

        let roles = [
            (
                "super_admin",
                "Super Administrator",
                RoleType::SuperAdmin,
                "Unrestricted administrator holding every permission",
                false,
                1,
                all_permission_ids,
            ),
            (
                "admin",
                "Administrator",
                RoleType::Admin,
                "Administrator with the management permission subset",
                false,
                2,
                admin_permissions,
            ),
            (
                "member",
                "Member",
                RoleType::Member,
                "Paying member with premium content access",
                false,
                3,
                member_permissions,
            ),
            (
                "user",
                "Regular User",
                RoleType::User,
                "Regular user with baseline access",
                true,
                4,
                Vec::new(),
            ),
        ];

        for (code, name, role_type, description, is_default, sort_order, permissions) in roles {
            if let Some(existing) = self.engine.roles.get_by_code(code).await? {
                debug!(code = %code, "role already exists, skipping");
                self.role_ids.insert(code, existing.id);
                continue;
            }

            let created = self
                .engine
                .roles
                .create(
                    CreateRole {
                        name: name.to_string(),
                        code: code.to_string(),
                        role_type,
                        description: Some(description.to_string()),
                        active: true,
                        is_default,
                        sort_order,
                        permissions,
                    },
                    &self.actor_id,
                )
                .await?;
            self.role_ids.insert(code, created.id);
        }
        Ok(())
    }

    async fn seed_menus(&mut self) -> Result<()> {
        // Pass 1: insert every menu with no parent, recording name -> id.
        for seed in default_menus() {
            if let Some(existing) = self.engine.menus.get_by_name(seed.name).await? {
                debug!(name = %seed.name, "menu already exists, skipping");
                self.menu_ids.insert(seed.name, existing.id);
                continue;
            }

            let created = self
                .engine
                .menus
                .create(
                    CreateMenu {
                        name: seed.name.to_string(),
                        title: seed.title.to_string(),
                        path: Some(seed.path.to_string()),
                        component: Some(seed.component.to_string()),
                        icon: Some(seed.icon.to_string()),
                        menu_type: MenuType::Menu,
                        parent_id: None,
                        sort_order: seed.sort_order,
                        is_hidden: false,
                        is_cache: true,
                        is_affix: false,
                        status: MenuStatus::Active,
                        permission_code: seed.permission_code.map(str::to_string),
                        redirect: None,
                        meta: menu_meta(seed.title, seed.icon),
                    },
                    &self.actor_id,
                )
                .await?;
            self.menu_ids.insert(seed.name, created.id);
        }

        // Pass 2: patch each child's parent_id from the symbolic-name table.
        for (child_name, parent_name) in MENU_PARENTS {
            let (Some(child_id), Some(parent_id)) = (
                self.menu_ids.get(child_name),
                self.menu_ids.get(parent_name),
            ) else {
                continue;
            };

            self.engine
                .menus
                .update(
                    child_id,
                    UpdateMenu {
                        parent_id: Some(parent_id.clone()),
                        ..UpdateMenu::default()
                    },
                )
                .await?;
            debug!(child = %child_name, parent = %parent_name, "linked menu to parent");
        }
        Ok(())
    }
}

fn menu_meta(title: &str, icon: &str) -> Map<String, Value> {
    let mut meta = Map::new();
    meta.insert("title".to_string(), json!(title));
    meta.insert("icon".to_string(), json!(icon));
    meta
}

/// Child menu name -> parent menu name. Applied after every menu exists.
const MENU_PARENTS: &[(&str, &str)] = &[
    ("user-management", "system"),
    ("role-management", "system"),
    ("permission-management", "system"),
    ("menu-management", "system"),
    ("dict-management", "system"),
    ("notice-management", "system"),
    ("recipe-management", "content"),
    ("order-management", "content"),
    ("data-stats", "analytics"),
    ("report-export", "analytics"),
];

fn default_permissions() -> Vec<PermissionSeed> {
    use PermissionAction::{Delete, Read, Write};

    let seed = |name, code, resource, action, description| PermissionSeed {
        name,
        code,
        resource,
        action,
        description,
    };

    vec![
        // Role administration
        seed("Create roles", "role:create", "role", Write, "Create new roles"),
        seed("View roles", "role:read", "role", Read, "View role information"),
        seed("Update roles", "role:update", "role", Write, "Update role information"),
        seed("Delete roles", "role:delete", "role", Delete, "Delete roles"),
        // Permission administration
        seed("Create permissions", "permission:create", "permission", Write, "Create new permissions"),
        seed("View permissions", "permission:read", "permission", Read, "View permission information"),
        seed("Update permissions", "permission:update", "permission", Write, "Update permission information"),
        seed("Delete permissions", "permission:delete", "permission", Delete, "Delete permissions"),
        // Menu administration
        seed("Create menus", "menu:create", "menu", Write, "Create new menus"),
        seed("View menus", "menu:read", "menu", Read, "View menu information"),
        seed("Update menus", "menu:update", "menu", Write, "Update menu information"),
        seed("Delete menus", "menu:delete", "menu", Delete, "Delete menus"),
        // User-role administration
        seed("Assign user roles", "user_role:assign", "user_role", Write, "Assign roles to users"),
        seed("View user roles", "user_role:read", "user_role", Read, "View user role bindings"),
        seed("View user permissions", "user_permission:read", "user_permission", Read, "View resolved user permissions"),
        // User administration
        seed("Create users", "user:create", "user", Write, "Create new users"),
        seed("View users", "user:read", "user", Read, "View user information"),
        seed("Update users", "user:update", "user", Write, "Update user information"),
        seed("Delete users", "user:delete", "user", Delete, "Delete users"),
        // System administration
        seed("System configuration", "system:config", "system", Write, "Manage system configuration"),
        seed("Dictionary management", "dict:manage", "dict", Write, "Manage dictionary data"),
        seed("Announcement management", "notice:manage", "notice", Write, "Manage announcements"),
        // Content administration
        seed("Recipe management", "recipe:manage", "recipe", Write, "Manage recipe content"),
        seed("Order management", "order:manage", "order", Write, "Manage orders"),
        // Analytics
        seed("View statistics", "stats:view", "stats", Read, "View usage statistics"),
        seed("Export reports", "report:export", "report", Read, "Export report data"),
    ]
}

fn default_menus() -> Vec<MenuSeed> {
    let seed = |name, title, path, component, icon, sort_order, permission_code| MenuSeed {
        name,
        title,
        path,
        component,
        icon,
        sort_order,
        permission_code,
    };

    vec![
        seed("dashboard", "Dashboard", "/dashboard", "Dashboard", "dashboard", 1, None),
        seed("system", "System", "/system", "Layout", "system", 2, Some("system:config")),
        seed("user-management", "Users", "/system/users", "UserManagement", "user", 1, Some("user:read")),
        seed("role-management", "Roles", "/system/roles", "RoleManagement", "role", 2, Some("role:read")),
        seed("permission-management", "Permissions", "/system/permissions", "PermissionManagement", "permission", 3, Some("permission:read")),
        seed("menu-management", "Menus", "/system/menus", "MenuManagement", "menu", 4, Some("menu:read")),
        seed("dict-management", "Dictionaries", "/system/dict", "DictManagement", "dict", 5, Some("dict:manage")),
        seed("notice-management", "Announcements", "/system/notices", "NoticeManagement", "notice", 6, Some("notice:manage")),
        seed("content", "Content", "/content", "Layout", "content", 3, Some("recipe:manage")),
        seed("recipe-management", "Recipes", "/content/recipes", "RecipeManagement", "recipe", 1, Some("recipe:manage")),
        seed("order-management", "Orders", "/content/orders", "OrderManagement", "order", 2, Some("order:manage")),
        seed("analytics", "Analytics", "/analytics", "Layout", "analytics", 4, Some("stats:view")),
        seed("data-stats", "Statistics", "/analytics/stats", "DataStats", "stats", 1, Some("stats:view")),
        seed("report-export", "Reports", "/analytics/reports", "ReportExport", "report", 2, Some("report:export")),
    ]
}
