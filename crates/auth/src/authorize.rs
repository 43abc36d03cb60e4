use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Permission, Principal, Role};

/// How a list of required permissions is evaluated.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    /// At least one (OR).
    #[default]
    Any,
    /// Every one (AND).
    All,
}

impl core::fmt::Display for Combinator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Combinator::Any => f.write_str("any of"),
            Combinator::All => f.write_str("all of"),
        }
    }
}

/// Authorization requirements attached to a route. Defined statically.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RouteAccess {
    #[serde(default)]
    pub required_permissions: Vec<Permission>,
    #[serde(default)]
    pub combinator: Combinator,
    #[serde(default)]
    pub required_roles: Vec<Role>,
}

impl RouteAccess {
    /// No requirements: any principal may enter.
    pub fn open() -> Self {
        Self::default()
    }

    /// Requires at least one of `permissions`.
    pub fn any_of<I, P>(permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        Self {
            required_permissions: permissions.into_iter().map(Into::into).collect(),
            combinator: Combinator::Any,
            required_roles: Vec::new(),
        }
    }

    /// Requires every one of `permissions`.
    pub fn all_of<I, P>(permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        Self {
            combinator: Combinator::All,
            ..Self::any_of(permissions)
        }
    }

    /// Additionally requires one of `roles`.
    pub fn with_roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Role>,
    {
        self.required_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_open(&self) -> bool {
        self.required_permissions.is_empty() && self.required_roles.is_empty()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: none of the required roles {0:?}")]
    MissingRole(Vec<String>),

    #[error("forbidden: missing {combinator} permissions {required:?}")]
    MissingPermissions {
        combinator: Combinator,
        required: Vec<String>,
    },
}

/// Decide whether `principal` satisfies `access`.
///
/// - No IO
/// - No panics
/// - Super-role short-circuits; roles are checked before permissions
pub fn authorize(principal: &Principal, access: &RouteAccess) -> Result<(), AuthzError> {
    if principal.is_super() {
        return Ok(());
    }

    if !access.required_roles.is_empty() && !principal.has_any_role(&access.required_roles) {
        return Err(AuthzError::MissingRole(
            access.required_roles.iter().map(|r| r.as_str().to_string()).collect(),
        ));
    }

    if !access.required_permissions.is_empty() {
        let satisfied = match access.combinator {
            Combinator::Any => principal.has_any_permission(&access.required_permissions),
            Combinator::All => principal.has_all_permissions(&access.required_permissions),
        };
        if !satisfied {
            return Err(AuthzError::MissingPermissions {
                combinator: access.combinator,
                required: access
                    .required_permissions
                    .iter()
                    .map(|p| p.as_str().to_string())
                    .collect(),
            });
        }
    }

    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (debug trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Why an authorization decision came out the way it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationExplanation {
    pub granted: bool,
    pub reason: String,
    pub active_role: Option<String>,
    pub super_role: bool,
    /// Required permissions the principal does not hold.
    pub missing_permissions: Vec<String>,
    /// Required roles, when none of them is held.
    pub missing_roles: Vec<String>,
}

/// Explain the decision [`authorize`] would make.
pub fn explain(principal: &Principal, access: &RouteAccess) -> AuthorizationExplanation {
    let active_role = principal.active_role().map(|r| r.as_str().to_string());
    let super_role = principal.is_super();

    let missing_permissions: Vec<String> = if super_role {
        Vec::new()
    } else {
        access
            .required_permissions
            .iter()
            .filter(|p| !principal.permissions().contains(p))
            .map(|p| p.as_str().to_string())
            .collect()
    };

    let decision = authorize(principal, access);
    let missing_roles: Vec<String> = match &decision {
        Err(AuthzError::MissingRole(roles)) => roles.clone(),
        _ => Vec::new(),
    };

    let reason = match &decision {
        Ok(()) if super_role => "active role ADMIN bypasses all checks".to_string(),
        Ok(()) if access.is_open() => "route has no requirements".to_string(),
        Ok(()) => format!(
            "principal holds {} the required permissions",
            access.combinator
        ),
        Err(e) => e.to_string(),
    };

    AuthorizationExplanation {
        granted: decision.is_ok(),
        reason,
        active_role,
        super_role,
        missing_permissions,
        missing_roles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::tests::principal;

    #[test]
    fn any_route_allows_holder_and_denies_other() {
        let access = RouteAccess::any_of(["users.read"]);

        let reader = principal(Some("OPERADOR"), &["OPERADOR"], &["users.read"]);
        assert_eq!(authorize(&reader, &access), Ok(()));

        let other = principal(Some("OPERADOR"), &["OPERADOR"], &["roles.read"]);
        assert!(matches!(
            authorize(&other, &access),
            Err(AuthzError::MissingPermissions { combinator: Combinator::Any, .. })
        ));
    }

    #[test]
    fn all_route_requires_every_permission() {
        let access = RouteAccess::all_of(["a", "b"]);

        let partial = principal(Some("OPERADOR"), &[], &["a"]);
        assert!(authorize(&partial, &access).is_err());

        let full = principal(Some("OPERADOR"), &[], &["a", "b"]);
        assert!(authorize(&full, &access).is_ok());
    }

    #[test]
    fn roles_are_or_and_checked_before_permissions() {
        let access = RouteAccess::any_of(["users.read"]).with_roles([Role::AUTORIDAD, Role::OPERADOR]);

        let wrong_role = principal(Some("CIUDADANO"), &["CIUDADANO"], &["users.read"]);
        assert_eq!(
            authorize(&wrong_role, &access),
            Err(AuthzError::MissingRole(vec!["AUTORIDAD".into(), "OPERADOR".into()]))
        );

        let ok = principal(Some("AUTORIDAD"), &["AUTORIDAD"], &["users.read"]);
        assert!(authorize(&ok, &access).is_ok());

        let role_but_no_perm = principal(Some("AUTORIDAD"), &["AUTORIDAD"], &[]);
        assert!(matches!(
            authorize(&role_but_no_perm, &access),
            Err(AuthzError::MissingPermissions { .. })
        ));
    }

    #[test]
    fn open_route_allows_anyone() {
        let nobody = principal(None, &[], &[]);
        assert!(authorize(&nobody, &RouteAccess::open()).is_ok());
    }

    #[test]
    fn admin_bypasses_everything() {
        let admin = principal(Some("ADMIN"), &["ADMIN"], &[]);
        let access = RouteAccess::all_of(["x", "y"]).with_roles(["NOBODY"]);
        assert!(authorize(&admin, &access).is_ok());
    }

    #[test]
    fn explanation_lists_what_is_missing() {
        let p = principal(Some("OPERADOR"), &["OPERADOR"], &["a"]);
        let explanation = explain(&p, &RouteAccess::all_of(["a", "b", "c"]));

        assert!(!explanation.granted);
        assert_eq!(explanation.missing_permissions, vec!["b", "c"]);
        assert!(explanation.missing_roles.is_empty());
        assert_eq!(explanation.active_role.as_deref(), Some("OPERADOR"));

        let admin = principal(Some("ADMIN"), &["ADMIN"], &[]);
        let explanation = explain(&admin, &RouteAccess::all_of(["a"]));
        assert!(explanation.granted);
        assert!(explanation.super_role);
        assert!(explanation.missing_permissions.is_empty());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn perm_names() -> impl Strategy<Value = Vec<String>> {
            prop::collection::vec("[a-z]{1,8}\\.(read|create|update|delete)", 0..6)
        }

        fn principal_with(active: &str, held: &[String]) -> Principal {
            let mut claims = crate::principal::tests::claims(None, &[], &[]);
            claims.active_role = Some(Role::new(active.to_string()));
            claims.roles = vec![Role::new(active.to_string())];
            claims.permissions = held.iter().cloned().map(Permission::from).collect();
            Principal::from_claims(claims)
        }

        proptest! {
            /// Property: ADMIN is allowed whatever is required.
            #[test]
            fn admin_always_allowed(required in perm_names(), roles in prop::collection::vec("[A-Z]{3,8}", 0..3), all in any::<bool>()) {
                let admin = principal_with("ADMIN", &[]);
                let mut access = if all {
                    RouteAccess::all_of(required.into_iter().map(Permission::from))
                } else {
                    RouteAccess::any_of(required.into_iter().map(Permission::from))
                };
                access.required_roles = roles.into_iter().map(Role::from).collect();
                prop_assert!(authorize(&admin, &access).is_ok());
            }

            /// Property: ALL implies ANY for non-empty requirements.
            #[test]
            fn all_implies_any(required in perm_names(), held in perm_names()) {
                prop_assume!(!required.is_empty());
                let p = principal_with("OPERADOR", &held);
                let all_ok = authorize(&p, &RouteAccess::all_of(required.iter().cloned().map(Permission::from))).is_ok();
                let any_ok = authorize(&p, &RouteAccess::any_of(required.iter().cloned().map(Permission::from))).is_ok();
                prop_assert!(!all_ok || any_ok);
            }

            /// Property: holding exactly the requirements satisfies ALL.
            #[test]
            fn holding_requirements_satisfies_all(required in perm_names()) {
                let p = principal_with("OPERADOR", &required);
                prop_assert!(authorize(&p, &RouteAccess::all_of(required.iter().cloned().map(Permission::from))).is_ok());
            }
        }
    }
}
