//! `findoc-auth`: authentication and authorization core.
//!
//! Credential issuance/verification, the role hierarchy gate, document
//! visibility and the referential delete guard. Decoupled from HTTP; storage
//! is reached only through the [`AccountDirectory`] trait and caller-supplied
//! counters.

pub mod authorize;
pub mod claims;
pub mod error;
pub mod password;
pub mod principal;
pub mod referential;
pub mod roles;
pub mod token;
pub mod visibility;

pub use authorize::{require_any_of, require_exact_role, require_role, RoleRequirement};
pub use claims::{validate_claims, Claims, TokenKind, TokenValidationError};
pub use error::{AuthError, Denial, StoreError};
pub use password::{PasswordError, PasswordHasher};
pub use principal::{Account, AccountDirectory, Principal};
pub use referential::guard_delete;
pub use roles::{Role, UnknownRole};
pub use token::{CredentialPair, TokenConfig, TokenConfigError, TokenService};
pub use visibility::{can_access, check_access, Owned, VisibilityScope};
