//! RBAC entity and request types
//!
//! Document field names (`code`, `resource`, `action`, `parent_id`,
//! `permission_code`, `user_id`, `role_id`, `expires_at`, `active`) are the
//! stable stored-data contract and must not be renamed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Operation a permission allows on its resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionAction {
    /// Read access
    Read,
    /// Create or update access
    Write,
    /// Delete access
    Delete,
    /// Execute access
    Execute,
}

/// Broad role category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleType {
    /// Unrestricted administrator
    SuperAdmin,
    /// Administrator
    Admin,
    /// Paying member
    Member,
    /// Regular user
    User,
}

/// Kind of menu entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuType {
    /// Navigable menu item
    Menu,
    /// Action button inside a page
    Button,
    /// API endpoint entry
    Api,
}

/// Menu visibility status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuStatus {
    /// Shown in the tree
    Active,
    /// Excluded from the tree
    Inactive,
}

/// An atomic capability, identified by a stable `code`, scoped to a
/// resource/action pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    /// Assigned identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Globally unique, immutable string key such as `"role:read"`
    pub code: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Resource the permission applies to
    pub resource: String,
    /// Action the permission allows
    pub action: PermissionAction,
    /// Whether the permission participates in resolution
    #[serde(default = "default_true")]
    pub active: bool,
    /// Id of the administrator who created the permission
    #[serde(default)]
    pub created_by: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// A named bundle of permissions assignable to users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    /// Assigned identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Globally unique string key
    pub code: String,
    /// Role category
    #[serde(rename = "type")]
    pub role_type: RoleType,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the role participates in resolution
    #[serde(default = "default_true")]
    pub active: bool,
    /// Whether this role is granted to users with no explicit binding
    #[serde(default)]
    pub is_default: bool,
    /// Display ordering; ties broken by creation time
    #[serde(default)]
    pub sort_order: i64,
    /// Ids of the permissions this role grants (references, not ownership)
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Id of the administrator who created the role
    #[serde(default)]
    pub created_by: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// A navigable or actionable item in the hierarchical menu forest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Menu {
    /// Assigned identifier
    pub id: String,
    /// Symbolic name, unique within the tree
    pub name: String,
    /// Display title
    pub title: String,
    /// Route path
    #[serde(default)]
    pub path: Option<String>,
    /// Frontend component reference
    #[serde(default)]
    pub component: Option<String>,
    /// Icon name
    #[serde(default)]
    pub icon: Option<String>,
    /// Kind of entry
    #[serde(rename = "type")]
    pub menu_type: MenuType,
    /// Weak reference to the parent menu id; deleting a menu never cascades
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Ordering among siblings
    #[serde(default)]
    pub sort_order: i64,
    /// Hidden from navigation while still resolvable
    #[serde(default)]
    pub is_hidden: bool,
    /// Whether the frontend may cache the component
    #[serde(default = "default_true")]
    pub is_cache: bool,
    /// Whether the entry is pinned as a fixed tab
    #[serde(default)]
    pub is_affix: bool,
    /// Visibility status
    pub status: MenuStatus,
    /// Optional permission `code` (not id) gating visibility
    #[serde(default)]
    pub permission_code: Option<String>,
    /// Redirect path
    #[serde(default)]
    pub redirect: Option<String>,
    /// Free-form metadata
    #[serde(default)]
    pub meta: Map<String, Value>,
    /// Id of the administrator who created the menu
    #[serde(default)]
    pub created_by: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Association of a role to a user, with provenance and optional expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRoleBinding {
    /// Assigned identifier
    pub id: String,
    /// Opaque user identifier supplied by the principal resolver
    pub user_id: String,
    /// Bound role id
    pub role_id: String,
    /// Id of the administrator who assigned the role
    pub assigned_by: String,
    /// Assignment timestamp
    pub assigned_at: DateTime<Utc>,
    /// Optional expiry; advisory unless expiration enforcement is enabled
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether the binding participates in resolution
    #[serde(default = "default_true")]
    pub active: bool,
}

/// A menu with its resolved children, as returned by tree construction
#[derive(Debug, Clone, Serialize)]
pub struct MenuNode {
    /// The menu entry itself
    #[serde(flatten)]
    pub menu: Menu,
    /// Child nodes in sibling sort order
    pub children: Vec<MenuNode>,
}

impl MenuNode {
    /// Total number of nodes in this subtree, including self
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(MenuNode::len).sum::<usize>()
    }

    /// Always false; a node counts itself
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Fields for creating a permission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePermission {
    /// Display name
    pub name: String,
    /// Globally unique string key
    pub code: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Resource the permission applies to
    pub resource: String,
    /// Action the permission allows
    pub action: PermissionAction,
    /// Initial active flag
    #[serde(default = "default_true")]
    pub active: bool,
}

/// Partial update for a permission; only `Some` fields are applied.
/// The `code` is immutable and deliberately absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePermission {
    /// New display name
    #[serde(default)]
    pub name: Option<String>,
    /// New description
    #[serde(default)]
    pub description: Option<String>,
    /// New resource
    #[serde(default)]
    pub resource: Option<String>,
    /// New action
    #[serde(default)]
    pub action: Option<PermissionAction>,
    /// New active flag
    #[serde(default)]
    pub active: Option<bool>,
}

/// Fields for creating a role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    /// Display name
    pub name: String,
    /// Globally unique string key
    pub code: String,
    /// Role category
    #[serde(rename = "type")]
    pub role_type: RoleType,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Initial active flag
    #[serde(default = "default_true")]
    pub active: bool,
    /// Whether this is the default role
    #[serde(default)]
    pub is_default: bool,
    /// Display ordering
    #[serde(default)]
    pub sort_order: i64,
    /// Ids of permissions to grant; each must resolve
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Partial update for a role; only `Some` fields are applied
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRole {
    /// New display name
    #[serde(default)]
    pub name: Option<String>,
    /// New description
    #[serde(default)]
    pub description: Option<String>,
    /// New active flag
    #[serde(default)]
    pub active: Option<bool>,
    /// New default flag
    #[serde(default)]
    pub is_default: Option<bool>,
    /// New ordering
    #[serde(default)]
    pub sort_order: Option<i64>,
    /// Replacement permission id set; each must resolve
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
}

/// Fields for creating a menu
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMenu {
    /// Symbolic name, unique within the tree
    pub name: String,
    /// Display title
    pub title: String,
    /// Route path
    #[serde(default)]
    pub path: Option<String>,
    /// Frontend component reference
    #[serde(default)]
    pub component: Option<String>,
    /// Icon name
    #[serde(default)]
    pub icon: Option<String>,
    /// Kind of entry
    #[serde(rename = "type", default = "default_menu_type")]
    pub menu_type: MenuType,
    /// Parent menu id; must resolve when set
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Ordering among siblings
    #[serde(default)]
    pub sort_order: i64,
    /// Hidden from navigation
    #[serde(default)]
    pub is_hidden: bool,
    /// Frontend caching flag
    #[serde(default = "default_true")]
    pub is_cache: bool,
    /// Fixed-tab flag
    #[serde(default)]
    pub is_affix: bool,
    /// Visibility status
    #[serde(default = "default_menu_status")]
    pub status: MenuStatus,
    /// Optional gating permission code
    #[serde(default)]
    pub permission_code: Option<String>,
    /// Redirect path
    #[serde(default)]
    pub redirect: Option<String>,
    /// Free-form metadata
    #[serde(default)]
    pub meta: Map<String, Value>,
}

/// Partial update for a menu; only `Some` fields are applied.
/// The symbolic `name` is immutable and deliberately absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMenu {
    /// New display title
    #[serde(default)]
    pub title: Option<String>,
    /// New route path
    #[serde(default)]
    pub path: Option<String>,
    /// New component reference
    #[serde(default)]
    pub component: Option<String>,
    /// New icon
    #[serde(default)]
    pub icon: Option<String>,
    /// New kind
    #[serde(rename = "type", default)]
    pub menu_type: Option<MenuType>,
    /// New parent id; must resolve and must not introduce a cycle
    #[serde(default)]
    pub parent_id: Option<String>,
    /// New ordering
    #[serde(default)]
    pub sort_order: Option<i64>,
    /// New hidden flag
    #[serde(default)]
    pub is_hidden: Option<bool>,
    /// New caching flag
    #[serde(default)]
    pub is_cache: Option<bool>,
    /// New fixed-tab flag
    #[serde(default)]
    pub is_affix: Option<bool>,
    /// New status
    #[serde(default)]
    pub status: Option<MenuStatus>,
    /// New gating permission code
    #[serde(default)]
    pub permission_code: Option<String>,
    /// New redirect path
    #[serde(default)]
    pub redirect: Option<String>,
    /// Replacement metadata map
    #[serde(default)]
    pub meta: Option<Map<String, Value>>,
}

pub(crate) fn default_true() -> bool {
    true
}

fn default_menu_type() -> MenuType {
    MenuType::Menu
}

fn default_menu_status() -> MenuStatus {
    MenuStatus::Active
}
