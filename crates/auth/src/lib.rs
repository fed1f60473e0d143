//! `docgate-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows how to
//! validate a session token, what a role may do, and what shape a user record
//! has, but never where users live.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod user;

pub use authorize::{AuthzError, authorize};
pub use claims::{SessionClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use permissions::{Permission, catalog, role_permissions};
pub use principal::Caller;
pub use roles::{Role, UnknownRole};
pub use user::{DirectoryError, NewUser, UserDirectory, UserRecord, UserStatus};
