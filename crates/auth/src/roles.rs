use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier used for RBAC.
///
/// Roles are opaque upper-case strings issued by the auth service. The
/// mapping from roles to permissions happens there; the token already carries
/// the resolved permission list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    /// Super-role: passes every permission and role check.
    pub const ADMIN: Role = Role::from_static("ADMIN");
    pub const AUTORIDAD: Role = Role::from_static("AUTORIDAD");
    pub const OPERADOR: Role = Role::from_static("OPERADOR");

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_super_role(&self) -> bool {
        self.as_str() == Self::ADMIN.as_str()
    }

    /// How the role is presented in the header and sidebar.
    pub fn display(&self) -> RoleDisplay {
        RoleDisplay::for_role(Some(self))
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Role {
    fn from(value: &'static str) -> Self {
        Self::from_static(value)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

/// Presentation attributes of the active role.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDisplay {
    pub name: &'static str,
    pub badge_class: &'static str,
    pub icon: &'static str,
}

impl RoleDisplay {
    pub fn for_role(role: Option<&Role>) -> Self {
        match role.map(Role::as_str) {
            Some("ADMIN") => Self {
                name: "Administrador",
                badge_class: "badge-admin",
                icon: "fas fa-user-shield",
            },
            Some("AUTORIDAD") => Self {
                name: "Autoridad",
                badge_class: "badge-autoridad",
                icon: "fas fa-user-tie",
            },
            Some("OPERADOR") => Self {
                name: "Operador",
                badge_class: "badge-operador",
                icon: "fas fa-user-cog",
            },
            _ => Self {
                name: "Usuario",
                badge_class: "badge-default",
                icon: "fas fa-user",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_is_the_only_super_role() {
        assert!(Role::ADMIN.is_super_role());
        assert!(Role::new(String::from("ADMIN")).is_super_role());
        assert!(!Role::OPERADOR.is_super_role());
        assert!(!Role::new("admin").is_super_role());
    }

    #[test]
    fn display_falls_back_to_generic_user() {
        assert_eq!(Role::AUTORIDAD.display().name, "Autoridad");
        assert_eq!(Role::new("CIUDADANO").display().badge_class, "badge-default");
        assert_eq!(RoleDisplay::for_role(None).icon, "fas fa-user");
    }
}
