use serde::{Deserialize, Serialize};

use docgate_auth::Role;

/// Versioned local-role → external-group table.
///
/// The version travels in the ID token so the consumer can tell which table
/// produced the `groups` claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMapping {
    pub version: u32,
    pub admin: String,
    pub contributor: String,
    pub reader: String,
}

impl GroupMapping {
    pub fn group_for(&self, role: Role) -> &str {
        match role {
            Role::Admin => &self.admin,
            Role::Contributor => &self.contributor,
            Role::Reader => &self.reader,
        }
    }

    pub fn groups_for(&self, role: Role) -> Vec<String> {
        vec![self.group_for(role).to_string()]
    }
}

impl Default for GroupMapping {
    fn default() -> Self {
        Self {
            version: 1,
            admin: "Administrators".to_string(),
            contributor: "SSO_Restricted_Access".to_string(),
            reader: "SSO_Restricted_Access".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_one_table() {
        let mapping = GroupMapping::default();
        assert_eq!(mapping.version, 1);
        assert_eq!(mapping.groups_for(Role::Admin), ["Administrators"]);
        assert_eq!(mapping.groups_for(Role::Reader), ["SSO_Restricted_Access"]);
        assert_eq!(mapping.group_for(Role::Contributor), "SSO_Restricted_Access");
    }
}
