//! `docgate-sso`: OIDC-style token issuance for the document backend.
//!
//! A local session becomes a short-lived authorization code, which is
//! exchanged for a signed ID token whose claims carry the caller's access
//! boundaries at the moment of exchange.

pub mod claims;
pub mod code;
pub mod discovery;
pub mod groups;
pub mod pipeline;
pub mod settings;
pub mod signer;

pub use claims::{AccessLists, AccessScope, AccessTokenClaims, IdTokenClaims, UserInfo};
pub use code::CodeClaims;
pub use discovery::DiscoveryDocument;
pub use groups::GroupMapping;
pub use pipeline::{
    AuthorizeError, AuthorizeRequest, TokenExchangeError, TokenIssuer, TokenRequest, TokenResponse, UserInfoError,
};
pub use settings::SsoSettings;
pub use signer::{SignError, TokenSigner, VerifyError};
