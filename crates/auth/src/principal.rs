use serde::{Deserialize, Serialize};

use docgate_core::UserId;

use crate::{Role, SessionClaims, TokenValidationError};

/// Identity of the authenticated caller of a request.
///
/// This is what the session collaborator hands to the rest of the system:
/// `currentUser() -> { id, email, role }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: UserId, email: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            email: email.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl TryFrom<&SessionClaims> for Caller {
    type Error = TokenValidationError;

    fn try_from(claims: &SessionClaims) -> Result<Self, Self::Error> {
        let user_id = claims
            .sub
            .parse::<UserId>()
            .map_err(|_| TokenValidationError::Invalid("subject is not a user id".to_string()))?;

        Ok(Self::new(user_id, claims.email.clone(), claims.role))
    }
}
