use chrono::{DateTime, Utc};
use serde::Serialize;

use smartparking_core::UserId;

use crate::{Permission, Role, RoleDisplay, TokenClaims};

/// The authenticated user as seen by the client, derived from token claims.
///
/// Every `has_*` predicate honours the super-role: a principal operating as
/// `ADMIN` passes all of them regardless of what is requested. Raw projections
/// (`roles`, `permissions`, `active_role`) report the claims as issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    user_id: Option<UserId>,
    subject: Option<String>,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    profile_picture: Option<String>,
    active_role: Option<Role>,
    roles: Vec<Role>,
    permissions: Vec<Permission>,
    status: Option<bool>,
    email_verified: Option<bool>,
    expires_at: Option<DateTime<Utc>>,
}

impl Principal {
    pub fn from_claims(claims: TokenClaims) -> Self {
        let expires_at = claims.expires_at();
        Self {
            user_id: claims.user_id,
            subject: claims.sub,
            email: claims.email,
            first_name: claims.first_name,
            last_name: claims.last_name,
            profile_picture: claims.profile_picture,
            active_role: claims.active_role,
            roles: claims.roles,
            permissions: claims.permissions,
            status: claims.status,
            email_verified: claims.email_verified,
            expires_at,
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// The `email` claim, falling back to the subject.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().or(self.subject.as_deref())
    }

    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }

    /// Avatar initials ("AQ" for Ana Quispe).
    pub fn initials(&self) -> String {
        [&self.first_name, &self.last_name]
            .into_iter()
            .filter_map(|name| name.as_deref().and_then(|n| n.chars().next()))
            .flat_map(char::to_uppercase)
            .collect()
    }

    pub fn profile_picture(&self) -> Option<&str> {
        self.profile_picture.as_deref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn is_active(&self) -> bool {
        self.status == Some(true)
    }

    pub fn is_email_verified(&self) -> bool {
        self.email_verified == Some(true)
    }

    // ── roles ──────────────────────────────────────────────────────────────

    pub fn active_role(&self) -> Option<&Role> {
        self.active_role.as_ref()
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn is_active_role(&self, role: &Role) -> bool {
        self.active_role.as_ref() == Some(role)
    }

    /// Whether the principal operates under the super-role.
    ///
    /// Tokens without an `activeRole` claim fall back to role membership.
    pub fn is_super(&self) -> bool {
        match &self.active_role {
            Some(active) => active.is_super_role(),
            None => self.roles.iter().any(Role::is_super_role),
        }
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.is_super() || self.roles.contains(role)
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.is_super() || roles.iter().any(|r| self.roles.contains(r))
    }

    pub fn role_display(&self) -> RoleDisplay {
        RoleDisplay::for_role(self.active_role.as_ref())
    }

    // ── permissions ────────────────────────────────────────────────────────

    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    pub fn has_permission(&self, permission: &Permission) -> bool {
        self.is_super() || self.permissions.contains(permission)
    }

    /// Existential: false for an empty request unless super.
    pub fn has_any_permission(&self, permissions: &[Permission]) -> bool {
        self.is_super() || permissions.iter().any(|p| self.permissions.contains(p))
    }

    /// Universal: true for an empty request.
    pub fn has_all_permissions(&self, permissions: &[Permission]) -> bool {
        self.is_super() || permissions.iter().all(|p| self.permissions.contains(p))
    }

    // ── affordances ────────────────────────────────────────────────────────

    /// Role-gated affordance: the ACTIVE role must be listed.
    /// No restriction means visible to everyone.
    pub fn can_access_menu_item(&self, allowed_roles: &[Role]) -> bool {
        if allowed_roles.is_empty() {
            return true;
        }
        self.active_role
            .as_ref()
            .is_some_and(|active| allowed_roles.contains(active))
    }

    /// Permission-gated affordance with ANY semantics.
    pub fn can_access_route(&self, required_permissions: &[Permission]) -> bool {
        required_permissions.is_empty() || self.has_any_permission(required_permissions)
    }
}

impl From<TokenClaims> for Principal {
    fn from(value: TokenClaims) -> Self {
        Self::from_claims(value)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn claims(active: Option<&'static str>, roles: &[&'static str], perms: &[&'static str]) -> TokenClaims {
        TokenClaims {
            sub: Some("ana@muni.gob.pe".to_string()),
            user_id: Some(UserId::new(7)),
            email: None,
            first_name: Some("ana".to_string()),
            last_name: Some("quispe".to_string()),
            phone_number: None,
            profile_picture: None,
            active_role: active.map(Role::from_static),
            roles: roles.iter().copied().map(Role::from_static).collect(),
            permissions: perms.iter().copied().map(Permission::from_static).collect(),
            status: Some(true),
            email_verified: Some(false),
            iat: None,
            exp: 4_102_444_800,
        }
    }

    pub(crate) fn principal(active: Option<&'static str>, roles: &[&'static str], perms: &[&'static str]) -> Principal {
        Principal::from_claims(claims(active, roles, perms))
    }

    fn perms(names: &[&'static str]) -> Vec<Permission> {
        names.iter().copied().map(Permission::from_static).collect()
    }

    #[test]
    fn projections_default_when_claims_are_absent() {
        let p = Principal::from_claims(TokenClaims {
            first_name: None,
            last_name: None,
            active_role: None,
            roles: vec![],
            permissions: vec![],
            ..claims(None, &[], &[])
        });
        assert!(p.active_role().is_none());
        assert!(p.roles().is_empty());
        assert!(p.permissions().is_empty());
        assert_eq!(p.full_name(), "");
        assert_eq!(p.initials(), "");
        assert_eq!(p.role_display().name, "Usuario");
    }

    #[test]
    fn identity_projections() {
        let p = principal(Some("OPERADOR"), &["OPERADOR"], &[]);
        assert_eq!(p.user_id(), Some(UserId::new(7)));
        assert_eq!(p.email(), Some("ana@muni.gob.pe"));
        assert_eq!(p.full_name(), "ana quispe");
        assert_eq!(p.initials(), "AQ");
        assert!(p.is_active());
        assert!(!p.is_email_verified());
        assert!(p.expires_at().is_some());
    }

    #[test]
    fn any_is_existential_all_is_universal() {
        let p = principal(Some("OPERADOR"), &["OPERADOR"], &["a"]);

        assert!(p.has_any_permission(&perms(&["a", "b"])));
        assert!(!p.has_all_permissions(&perms(&["a", "b"])));
        assert!(!p.has_any_permission(&[]));
        assert!(p.has_all_permissions(&[]));
    }

    #[test]
    fn super_role_passes_every_check() {
        let admin = principal(Some("ADMIN"), &["ADMIN"], &[]);

        assert!(admin.has_permission(&Permission::new("anything.at.all")));
        assert!(admin.has_all_permissions(&perms(&["x", "y"])));
        assert!(admin.has_any_permission(&[]));
        assert!(admin.has_role(&Role::OPERADOR));
        assert!(admin.has_any_role(&[Role::AUTORIDAD]));
    }

    #[test]
    fn super_role_follows_active_role_not_membership() {
        // Holds ADMIN but signed in as OPERADOR.
        let p = principal(Some("OPERADOR"), &["ADMIN", "OPERADOR"], &[]);
        assert!(!p.is_super());
        assert!(!p.has_permission(&Permission::new("users.read")));

        // No active role claim: membership decides.
        let legacy = principal(None, &["ADMIN"], &[]);
        assert!(legacy.is_super());
    }

    #[test]
    fn role_predicates() {
        let p = principal(Some("OPERADOR"), &["OPERADOR", "AUTORIDAD"], &[]);
        assert!(p.has_role(&Role::AUTORIDAD));
        assert!(!p.has_role(&Role::ADMIN));
        assert!(p.has_any_role(&[Role::ADMIN, Role::OPERADOR]));
        assert!(!p.has_any_role(&[]));
        assert!(p.is_active_role(&Role::OPERADOR));
        assert!(!p.is_active_role(&Role::AUTORIDAD));
    }

    #[test]
    fn menu_access_uses_active_role_only() {
        let p = principal(Some("OPERADOR"), &["OPERADOR", "AUTORIDAD"], &[]);
        assert!(p.can_access_menu_item(&[]));
        assert!(p.can_access_menu_item(&[Role::OPERADOR]));
        assert!(!p.can_access_menu_item(&[Role::AUTORIDAD]));

        let no_active = principal(None, &["OPERADOR"], &[]);
        assert!(!no_active.can_access_menu_item(&[Role::OPERADOR]));
    }

    #[test]
    fn route_access_is_any() {
        let p = principal(Some("OPERADOR"), &["OPERADOR"], &["rates.read"]);
        assert!(p.can_access_route(&[]));
        assert!(p.can_access_route(&perms(&["rates.read", "users.read"])));
        assert!(!p.can_access_route(&perms(&["users.read"])));
    }
}
