use serde::{Deserialize, Serialize};

use docgate_access::AccessibleTargetSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessScope {
    /// No lists; the consumer trusts its own admin check.
    Global,
    Restricted,
}

/// The access boundary exported to the document backend.
///
/// Only documents and folders are forwarded; tag and category grants stay
/// local.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLists {
    pub scope: AccessScope,
    pub documents: Vec<String>,
    pub folders: Vec<String>,
}

impl AccessLists {
    pub fn global() -> Self {
        Self {
            scope: AccessScope::Global,
            documents: Vec::new(),
            folders: Vec::new(),
        }
    }

    pub fn restricted(accessible: &AccessibleTargetSet) -> Self {
        Self {
            scope: AccessScope::Restricted,
            documents: accessible.documents.iter().cloned().collect(),
            folders: accessible.folders.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    pub email: String,
    pub name: String,
    pub preferred_username: String,
    pub groups: Vec<String>,
    pub group_mapping_version: u32,
    pub access_scope: AccessScope,
    pub document_access_list: Vec<String>,
    pub folder_access_list: Vec<String>,
}

pub const ACCESS_USE: &str = "access";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub scope: String,
    pub token_use: String,
}

/// Body of the userinfo endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub sub: String,
    pub email: String,
    pub name: String,
    pub preferred_username: String,
    pub groups: Vec<String>,
    pub access_scope: AccessScope,
    pub document_access_list: Vec<String>,
    pub folder_access_list: Vec<String>,
}
