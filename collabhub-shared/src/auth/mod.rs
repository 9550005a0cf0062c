//! Caller identity and authorization
//!
//! # Modules
//!
//! - [`identity`]: verifies identity-provider session tokens into a [`CallerIdentity`]
//! - [`guard`]: ownership rules consulted by every mutating operation
//!
//! # Example
//!
//! ```
//! use collabhub_shared::auth::{AuthorizationGuard, CallerIdentity, ProjectEditPolicy};
//!
//! let caller = CallerIdentity::new("user_2abc", Some("org_42"));
//! let guard = AuthorizationGuard::new(ProjectEditPolicy::OwnerOnly);
//! assert_eq!(caller.require_org().unwrap(), "org_42");
//! assert_eq!(guard.edit_policy(), ProjectEditPolicy::OwnerOnly);
//! ```

pub mod guard;
pub mod identity;

pub use guard::{Action, AuthorizationGuard, Decision, Denial, DenialKind, ProjectEditPolicy};
pub use identity::{CallerIdentity, IdentityClaims, IdentityError, IdentityVerifier};
