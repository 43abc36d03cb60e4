//! `smartparking-auth`: client-side access control.
//!
//! Token storage, claims decoding, the principal view of the signed-in user,
//! authorization decisions, route guards and menu filtering. Nothing here
//! speaks HTTP; the REST client lives in `smartparking-client`.
//!
//! Claims are decoded without signature verification. Every decision made
//! here is advisory: the backend enforces authorization on each request.

pub mod authorize;
pub mod catalog;
pub mod claims;
pub mod guard;
pub mod menu;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod token;

pub use authorize::{AuthorizationExplanation, AuthzError, Combinator, RouteAccess, authorize, explain};
pub use claims::{DecodeError, TokenClaims, decode_claims};
pub use guard::{
    AuthRoutes, Guard, GuardOutcome, Navigator, Redirect, Route, require_anonymous, require_authenticated,
    require_authorized,
};
pub use menu::{Badge, MenuItem, filter_menu};
pub use permissions::{Permission, PermissionGroup, group_by_module};
pub use principal::Principal;
pub use roles::{Role, RoleDisplay};
pub use token::{FileStorage, MemoryStorage, StorageError, TokenKeys, TokenStorage, TokenStore};
