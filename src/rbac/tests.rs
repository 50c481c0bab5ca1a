//! End-to-end tests for the RBAC engine over the in-memory store

use crate::config::RbacConfig;
use crate::rbac::RbacEngine;
use crate::rbac::types::{
    CreateMenu, CreatePermission, CreateRole, MenuStatus, MenuType, PermissionAction, RoleType,
    UpdateMenu, UpdateRole,
};
use crate::storage::MemoryStore;
use crate::utils::error::RbacError;
use chrono::{Duration, Utc};
use std::sync::Arc;

fn test_engine() -> RbacEngine {
    RbacEngine::new(Arc::new(MemoryStore::new()), RbacConfig::default())
}

fn permission(code: &str) -> CreatePermission {
    let (resource, _) = code.split_once(':').unwrap_or((code, ""));
    CreatePermission {
        name: code.to_string(),
        code: code.to_string(),
        description: None,
        resource: resource.to_string(),
        action: PermissionAction::Read,
        active: true,
    }
}

fn role(code: &str, permissions: Vec<String>) -> CreateRole {
    CreateRole {
        name: code.to_string(),
        code: code.to_string(),
        role_type: RoleType::User,
        description: None,
        active: true,
        is_default: false,
        sort_order: 0,
        permissions,
    }
}

fn menu(name: &str, parent_id: Option<String>, permission_code: Option<&str>) -> CreateMenu {
    CreateMenu {
        name: name.to_string(),
        title: name.to_string(),
        path: Some(format!("/{}", name)),
        component: None,
        icon: None,
        menu_type: MenuType::Menu,
        parent_id,
        sort_order: 0,
        is_hidden: false,
        is_cache: true,
        is_affix: false,
        status: MenuStatus::Active,
        permission_code: permission_code.map(str::to_string),
        redirect: None,
        meta: Default::default(),
    }
}

#[tokio::test]
async fn test_duplicate_permission_code_conflicts() {
    let engine = test_engine();

    engine
        .permissions
        .create(permission("role:read"), "admin")
        .await
        .unwrap();
    let result = engine
        .permissions
        .create(permission("role:read"), "admin")
        .await;
    assert!(matches!(result, Err(RbacError::Conflict(_))));

    // Exactly one entity persisted.
    let listed = engine
        .permissions
        .list(0, 100, Default::default())
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_duplicate_role_code_conflicts() {
    let engine = test_engine();

    engine.roles.create(role("viewer", vec![]), "admin").await.unwrap();
    let result = engine.roles.create(role("viewer", vec![]), "admin").await;
    assert!(matches!(result, Err(RbacError::Conflict(_))));
}

#[tokio::test]
async fn test_permission_update_merges_non_null_fields() {
    let engine = test_engine();
    let created = engine
        .permissions
        .create(permission("role:read"), "admin")
        .await
        .unwrap();

    let updated = engine
        .permissions
        .update(
            &created.id,
            crate::rbac::types::UpdatePermission {
                name: Some("Read roles".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Read roles");
    // Untouched fields survive the merge, and the code stays immutable.
    assert_eq!(updated.code, "role:read");
    assert_eq!(updated.resource, "role");
    assert!(updated.updated_at >= created.updated_at);
}

#[tokio::test]
async fn test_update_unknown_permission_is_not_found() {
    let engine = test_engine();
    let result = engine
        .permissions
        .update("missing", Default::default())
        .await;
    assert!(matches!(result, Err(RbacError::NotFound(_))));
}

#[tokio::test]
async fn test_permission_delete_blocked_while_referenced() {
    let engine = test_engine();
    let perm = engine
        .permissions
        .create(permission("recipe:read"), "admin")
        .await
        .unwrap();
    let holder = engine
        .roles
        .create(role("cook", vec![perm.id.clone()]), "admin")
        .await
        .unwrap();

    let result = engine.permissions.delete(&perm.id).await;
    assert!(matches!(result, Err(RbacError::Conflict(_))));

    // After removing it from every role, deletion succeeds.
    engine
        .roles
        .update(
            &holder.id,
            UpdateRole {
                permissions: Some(vec![]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(engine.permissions.delete(&perm.id).await.unwrap());
}

#[tokio::test]
async fn test_role_delete_blocked_while_bound() {
    let engine = test_engine();
    let bound = engine.roles.create(role("viewer", vec![]), "admin").await.unwrap();
    engine
        .bindings
        .assign_roles("u1", &[bound.id.clone()], "admin", None)
        .await
        .unwrap();

    let result = engine.roles.delete(&bound.id).await;
    assert!(matches!(result, Err(RbacError::Conflict(_))));

    // Clearing the user's bindings unblocks the delete.
    engine.bindings.assign_roles("u1", &[], "admin", None).await.unwrap();
    assert!(engine.roles.delete(&bound.id).await.unwrap());
}

#[tokio::test]
async fn test_role_create_rejects_unknown_permission_ref() {
    let engine = test_engine();
    let result = engine
        .roles
        .create(role("viewer", vec!["no-such-permission".to_string()]), "admin")
        .await;
    assert!(matches!(result, Err(RbacError::Validation(_))));
}

#[tokio::test]
async fn test_role_list_ordering_and_filter() {
    let engine = test_engine();
    for (code, sort_order) in [("gamma", 3), ("alpha", 1), ("beta", 2)] {
        let mut data = role(code, vec![]);
        data.sort_order = sort_order;
        engine.roles.create(data, "admin").await.unwrap();
    }

    let listed = engine.roles.list(0, 100, Default::default()).await.unwrap();
    let codes: Vec<&str> = listed.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, ["alpha", "beta", "gamma"]);

    let filtered = engine
        .roles
        .list(
            0,
            100,
            crate::rbac::RoleListFilter {
                name: Some("ALPH".to_string()),
                role_type: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].code, "alpha");
}

#[tokio::test]
async fn test_get_role_permissions_skips_stale_refs() {
    let engine = test_engine();
    let perm = engine
        .permissions
        .create(permission("stats:view"), "admin")
        .await
        .unwrap();
    let holder = engine
        .roles
        .create(role("analyst", vec![perm.id.clone()]), "admin")
        .await
        .unwrap();

    let resolved = engine.roles.get_role_permissions(&holder.id).await.unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].code, "stats:view");

    // Unknown role yields an empty list rather than an error.
    assert!(engine.roles.get_role_permissions("missing").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_menu_create_requires_existing_parent() {
    let engine = test_engine();
    let result = engine
        .menus
        .create(menu("orphan", Some("missing".to_string()), None), "admin")
        .await;
    assert!(matches!(result, Err(RbacError::BadRequest(_))));
}

#[tokio::test]
async fn test_menu_delete_blocked_while_it_has_children() {
    let engine = test_engine();
    let parent = engine.menus.create(menu("system", None, None), "admin").await.unwrap();
    let child = engine
        .menus
        .create(menu("roles", Some(parent.id.clone()), None), "admin")
        .await
        .unwrap();

    let result = engine.menus.delete(&parent.id).await;
    assert!(matches!(result, Err(RbacError::Conflict(_))));

    // Leaf deletes succeed, then the now-childless parent can go too.
    assert!(engine.menus.delete(&child.id).await.unwrap());
    assert!(engine.menus.delete(&parent.id).await.unwrap());
}

#[tokio::test]
async fn test_menu_reparent_cycle_rejected() {
    let engine = test_engine();
    let top = engine.menus.create(menu("top", None, None), "admin").await.unwrap();
    let mid = engine
        .menus
        .create(menu("mid", Some(top.id.clone()), None), "admin")
        .await
        .unwrap();
    let leaf = engine
        .menus
        .create(menu("leaf", Some(mid.id.clone()), None), "admin")
        .await
        .unwrap();

    // top -> leaf would close the loop top -> mid -> leaf -> top.
    let result = engine
        .menus
        .update(
            &top.id,
            UpdateMenu {
                parent_id: Some(leaf.id.clone()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(RbacError::BadRequest(_))));

    let result = engine
        .menus
        .update(
            &top.id,
            UpdateMenu {
                parent_id: Some(top.id.clone()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(RbacError::BadRequest(_))));
}

#[tokio::test]
async fn test_tree_contains_every_active_menu() {
    let engine = test_engine();
    let parent = engine.menus.create(menu("system", None, None), "admin").await.unwrap();
    engine
        .menus
        .create(menu("roles", Some(parent.id.clone()), None), "admin")
        .await
        .unwrap();
    let mut hidden = menu("retired", None, None);
    hidden.status = MenuStatus::Inactive;
    engine.menus.create(hidden, "admin").await.unwrap();

    let tree = engine.menus.tree(None).await.unwrap();
    let total: usize = tree.iter().map(|node| node.len()).sum();
    assert_eq!(total, 2);

    // Every non-root node hangs under its declared parent.
    let system = tree.iter().find(|node| node.menu.name == "system").unwrap();
    assert_eq!(system.children.len(), 1);
    assert_eq!(system.children[0].menu.parent_id.as_ref(), Some(&parent.id));
}

#[tokio::test]
async fn test_tree_permission_filter() {
    let engine = test_engine();
    engine.menus.create(menu("dashboard", None, None), "admin").await.unwrap();
    engine
        .menus
        .create(menu("admin-area", None, Some("system:config")), "admin")
        .await
        .unwrap();

    let granted = std::collections::HashSet::new();
    let tree = engine.menus.tree(Some(&granted)).await.unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].menu.name, "dashboard");

    let granted: std::collections::HashSet<String> =
        ["system:config".to_string()].into_iter().collect();
    let tree = engine.menus.tree(Some(&granted)).await.unwrap();
    assert_eq!(tree.len(), 2);
}

#[tokio::test]
async fn test_filtered_parent_makes_child_a_root() {
    let engine = test_engine();
    let gated = engine
        .menus
        .create(menu("gated-parent", None, Some("system:config")), "admin")
        .await
        .unwrap();
    engine
        .menus
        .create(menu("open-child", Some(gated.id.clone()), None), "admin")
        .await
        .unwrap();

    let granted = std::collections::HashSet::new();
    let tree = engine.menus.tree(Some(&granted)).await.unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].menu.name, "open-child");
    assert!(tree[0].children.is_empty());
}

#[tokio::test]
async fn test_assign_roles_is_a_full_replace() {
    let engine = test_engine();
    let a = engine.roles.create(role("a", vec![]), "admin").await.unwrap();
    let b = engine.roles.create(role("b", vec![]), "admin").await.unwrap();
    let c = engine.roles.create(role("c", vec![]), "admin").await.unwrap();

    engine
        .bindings
        .assign_roles("u1", &[a.id.clone(), b.id.clone()], "admin", None)
        .await
        .unwrap();
    engine
        .bindings
        .assign_roles("u1", &[c.id.clone()], "admin", None)
        .await
        .unwrap();

    let roles = engine.bindings.get_user_roles("u1").await.unwrap();
    let codes: Vec<&str> = roles.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, ["c"]);
}

#[tokio::test]
async fn test_assign_roles_rejects_unknown_role() {
    let engine = test_engine();
    let result = engine
        .bindings
        .assign_roles("u1", &["missing".to_string()], "admin", None)
        .await;
    assert!(matches!(result, Err(RbacError::NotFound(_))));
}

#[tokio::test]
async fn test_permission_resolution_scenario() {
    let engine = test_engine();
    let read = engine
        .permissions
        .create(permission("role:read"), "admin")
        .await
        .unwrap();
    let viewer = engine
        .roles
        .create(role("viewer", vec![read.id.clone()]), "admin")
        .await
        .unwrap();
    engine
        .bindings
        .assign_roles("u123", &[viewer.id.clone()], "admin", None)
        .await
        .unwrap();

    assert!(engine.resolver.check_permission("u123", "role:read").await);
    assert!(!engine.resolver.check_permission("u123", "role:write").await);

    // Unknown user resolves to an empty set, not an error.
    let granted = engine.resolver.get_user_permissions("nobody").await.unwrap();
    assert!(granted.is_empty());
    assert!(!engine.resolver.check_permission("nobody", "role:read").await);
}

#[tokio::test]
async fn test_check_permissions_matches_single_checks() {
    let engine = test_engine();
    let read = engine
        .permissions
        .create(permission("role:read"), "admin")
        .await
        .unwrap();
    let stats = engine
        .permissions
        .create(permission("stats:view"), "admin")
        .await
        .unwrap();
    let analyst = engine
        .roles
        .create(role("analyst", vec![read.id, stats.id]), "admin")
        .await
        .unwrap();
    engine
        .bindings
        .assign_roles("u1", &[analyst.id], "admin", None)
        .await
        .unwrap();

    let codes = vec![
        "role:read".to_string(),
        "stats:view".to_string(),
        "menu:read".to_string(),
    ];

    let mut all = true;
    let mut any = false;
    for code in &codes {
        let granted = engine.resolver.check_permission("u1", code).await;
        all &= granted;
        any |= granted;
    }

    assert_eq!(engine.resolver.check_permissions("u1", &codes, true).await, all);
    assert_eq!(engine.resolver.check_permissions("u1", &codes, false).await, any);
    assert!(!all);
    assert!(any);
}

#[tokio::test]
async fn test_deactivated_role_drops_out_of_resolution() {
    let engine = test_engine();
    let read = engine
        .permissions
        .create(permission("role:read"), "admin")
        .await
        .unwrap();
    let viewer = engine
        .roles
        .create(role("viewer", vec![read.id]), "admin")
        .await
        .unwrap();
    engine
        .bindings
        .assign_roles("u1", &[viewer.id.clone()], "admin", None)
        .await
        .unwrap();
    assert!(engine.resolver.check_permission("u1", "role:read").await);

    // Disable the role without touching the binding.
    engine
        .roles
        .update(
            &viewer.id,
            UpdateRole {
                active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!engine.resolver.check_permission("u1", "role:read").await);
}

#[tokio::test]
async fn test_inactive_permission_excluded_from_effective_set() {
    let engine = test_engine();
    let mut data = permission("role:read");
    data.active = false;
    let dormant = engine.permissions.create(data, "admin").await.unwrap();
    let viewer = engine
        .roles
        .create(role("viewer", vec![dormant.id]), "admin")
        .await
        .unwrap();
    engine
        .bindings
        .assign_roles("u1", &[viewer.id], "admin", None)
        .await
        .unwrap();

    assert!(!engine.resolver.check_permission("u1", "role:read").await);
}

#[tokio::test]
async fn test_expiration_advisory_by_default() {
    let engine = test_engine();
    let viewer = engine.roles.create(role("viewer", vec![]), "admin").await.unwrap();
    let expired = Utc::now() - Duration::hours(1);
    engine
        .bindings
        .assign_roles("u1", &[viewer.id], "admin", Some(expired))
        .await
        .unwrap();

    // Only the active flag is consulted unless enforcement is enabled.
    assert_eq!(engine.bindings.get_user_roles("u1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_expiration_enforced_when_configured() {
    let store = Arc::new(MemoryStore::new());
    let config = RbacConfig {
        enforce_expiration: true,
        ..Default::default()
    };
    let engine = RbacEngine::new(store, config);

    let viewer = engine.roles.create(role("viewer", vec![]), "admin").await.unwrap();
    let expired = Utc::now() - Duration::hours(1);
    engine
        .bindings
        .assign_roles("u1", &[viewer.id.clone()], "admin", Some(expired))
        .await
        .unwrap();
    assert!(engine.bindings.get_user_roles("u1").await.unwrap().is_empty());

    let future = Utc::now() + Duration::hours(1);
    engine
        .bindings
        .assign_roles("u1", &[viewer.id], "admin", Some(future))
        .await
        .unwrap();
    assert_eq!(engine.bindings.get_user_roles("u1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_principal_carries_bound_role_codes() {
    let engine = test_engine();
    let viewer = engine.roles.create(role("viewer", vec![]), "admin").await.unwrap();
    engine
        .bindings
        .assign_roles("u1", &[viewer.id], "admin", None)
        .await
        .unwrap();

    let principal = engine.resolver.principal("u1").await.unwrap();
    assert_eq!(principal.id, "u1");
    assert!(principal.has_role("viewer"));
    assert!(!principal.has_role("admin"));
}

#[tokio::test]
async fn test_bootstrap_links_children_by_symbolic_name() {
    let engine = test_engine();
    let summary = engine.seed_defaults("system").await.unwrap();
    assert_eq!(summary.roles, 4);
    assert!(summary.permissions > 0);
    assert!(summary.menus > 0);

    // Children declared parents by name before the parent id existed; the
    // stored parent_id must be the real id, never null or a placeholder.
    let system = engine.menus.get_by_name("system").await.unwrap().unwrap();
    let roles_menu = engine
        .menus
        .get_by_name("role-management")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(roles_menu.parent_id.as_ref(), Some(&system.id));
}

#[tokio::test]
async fn test_bootstrap_is_idempotent() {
    let engine = test_engine();
    let first = engine.seed_defaults("system").await.unwrap();
    let second = engine.seed_defaults("system").await.unwrap();
    assert_eq!(first, second);

    let listed = engine
        .permissions
        .list(0, 1000, Default::default())
        .await
        .unwrap();
    assert_eq!(listed.len(), first.permissions);
}

#[tokio::test]
async fn test_super_admin_sees_unfiltered_tree() {
    let engine = test_engine();
    engine.seed_defaults("system").await.unwrap();

    let super_admin = engine.roles.get_by_code("super_admin").await.unwrap().unwrap();
    engine
        .bindings
        .assign_roles("root", &[super_admin.id], "system", None)
        .await
        .unwrap();

    let full = engine.menus.tree(None).await.unwrap();
    let visible = engine.resolver.get_menu_tree("root").await.unwrap();
    let count = |nodes: &[crate::rbac::MenuNode]| -> usize {
        nodes.iter().map(|node| node.len()).sum()
    };
    assert_eq!(count(&visible), count(&full));

    // A user with no roles only sees ungated menus.
    let bare = engine.resolver.get_menu_tree("nobody").await.unwrap();
    assert_eq!(count(&bare), 1);
    assert_eq!(bare[0].menu.name, "dashboard");
}
