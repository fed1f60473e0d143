use thiserror::Error;

use crate::{Caller, Permission, role_permissions};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Authorize a caller against the role matrix.
///
/// - No IO
/// - No panics
/// - Role-level only; time-boxed resource grants are the access evaluator's job
pub fn authorize(caller: &Caller, required: &Permission) -> Result<(), AuthzError> {
    if role_permissions(caller.role).contains(required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Role, catalog};
    use docgate_core::UserId;

    fn caller(role: Role) -> Caller {
        Caller::new(UserId::new(1), "someone@example.com", role)
    }

    #[test]
    fn admin_may_manage_rules() {
        assert!(authorize(&caller(Role::Admin), &catalog::PERMISSIONS_MANAGE).is_ok());
    }

    #[test]
    fn contributor_is_forbidden_from_rule_management() {
        let err = authorize(&caller(Role::Contributor), &catalog::PERMISSIONS_MANAGE).unwrap_err();
        assert_eq!(err, AuthzError::Forbidden("permissions.manage".to_string()));
    }

    #[test]
    fn reader_may_read_documents() {
        assert!(authorize(&caller(Role::Reader), &catalog::DOCUMENT_READ).is_ok());
        assert!(authorize(&caller(Role::Reader), &catalog::DOCUMENT_UPDATE).is_err());
    }
}
