use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Local account role.
///
/// Admins are not subject to time-boxed access rules; contributors and readers
/// only see what an active rule grants them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "administrator")]
    Admin,
    Contributor,
    Reader,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Contributor => "contributor",
            Role::Reader => "reader",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Case-insensitive; `administrator` is accepted as an alias of `admin`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" | "administrator" => Ok(Role::Admin),
            "contributor" => Ok(Role::Contributor),
            "reader" => Ok(Role::Reader),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsing_is_case_insensitive_and_accepts_administrator() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("Administrator".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" reader ".parse::<Role>().unwrap(), Role::Reader);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&Role::Contributor).unwrap(), "\"contributor\"");
        let role: Role = serde_json::from_str("\"administrator\"").unwrap();
        assert!(role.is_admin());
    }
}
