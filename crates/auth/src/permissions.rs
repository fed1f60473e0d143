use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Role;

/// Permission identifier.
///
/// Permissions are modeled as opaque `resource.action` strings
/// (e.g. "document.read"). The role matrix below is the only place that maps
/// roles onto them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Every permission the application checks.
pub mod catalog {
    use super::Permission;

    pub const USER_CREATE: Permission = Permission::from_static("user.create");
    pub const USER_READ: Permission = Permission::from_static("user.read");
    pub const USER_UPDATE: Permission = Permission::from_static("user.update");
    pub const USER_DELETE: Permission = Permission::from_static("user.delete");

    pub const DOCUMENT_CREATE: Permission = Permission::from_static("document.create");
    pub const DOCUMENT_READ: Permission = Permission::from_static("document.read");
    pub const DOCUMENT_UPDATE: Permission = Permission::from_static("document.update");
    pub const DOCUMENT_DELETE: Permission = Permission::from_static("document.delete");

    /// Create, edit, toggle and delete access rules.
    pub const PERMISSIONS_MANAGE: Permission = Permission::from_static("permissions.manage");
    pub const SYSTEM_MANAGE: Permission = Permission::from_static("system.manage");
}

static ADMIN_PERMISSIONS: [Permission; 10] = [
    catalog::USER_CREATE,
    catalog::USER_READ,
    catalog::USER_UPDATE,
    catalog::USER_DELETE,
    catalog::DOCUMENT_CREATE,
    catalog::DOCUMENT_READ,
    catalog::DOCUMENT_UPDATE,
    catalog::DOCUMENT_DELETE,
    catalog::PERMISSIONS_MANAGE,
    catalog::SYSTEM_MANAGE,
];

static CONTRIBUTOR_PERMISSIONS: [Permission; 4] = [
    catalog::DOCUMENT_CREATE,
    catalog::DOCUMENT_READ,
    catalog::DOCUMENT_UPDATE,
    catalog::DOCUMENT_DELETE,
];

static READER_PERMISSIONS: [Permission; 1] = [catalog::DOCUMENT_READ];

/// Role → permission matrix.
pub fn role_permissions(role: Role) -> &'static [Permission] {
    match role {
        Role::Admin => &ADMIN_PERMISSIONS,
        Role::Contributor => &CONTRIBUTOR_PERMISSIONS,
        Role::Reader => &READER_PERMISSIONS,
    }
}
