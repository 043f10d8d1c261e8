//! Record and collection identifiers for the permission store.
use serde_json::Value;
use uuid::Uuid;

/// The projection of a stored record this migration reads and rewrites.
///
/// `permissions` holds a packed rule set; absent means the empty rule list.
/// All other columns of the backing row are left untouched by the migrator.
#[derive(Debug, Clone, PartialEq)]
pub struct PermissionRecord {
    pub id: Uuid,
    pub permissions: Option<Value>,
}

/// The three record collections whose permission rule sets get rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionCollection {
    /// Project-scoped role definitions.
    ProjectRoles,
    /// Machine-identity privilege grants scoped to a project.
    IdentityPrivileges,
    /// User privilege grants scoped to a project.
    UserPrivileges,
}

impl PermissionCollection {
    /// Fixed processing order for a migration pass.
    pub const ALL: [PermissionCollection; 3] = [
        PermissionCollection::ProjectRoles,
        PermissionCollection::IdentityPrivileges,
        PermissionCollection::UserPrivileges,
    ];

    /// Backing table for the collection.
    pub fn table_name(self) -> &'static str {
        match self {
            PermissionCollection::ProjectRoles => "project_roles",
            PermissionCollection::IdentityPrivileges => "identity_additional_privileges",
            PermissionCollection::UserPrivileges => "user_additional_privileges",
        }
    }
}

impl std::fmt::Display for PermissionCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}
