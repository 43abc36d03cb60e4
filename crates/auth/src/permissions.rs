use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are dot-namespaced capability strings (e.g. "users.read"),
/// granted through role assignment on the backend and carried in the token.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Module part of the name ("users" for "users.read").
    ///
    /// A name without a dot belongs to the `general` module.
    pub fn module(&self) -> &str {
        match self.0.split_once('.') {
            Some((module, _)) if !module.is_empty() => module,
            _ => "general",
        }
    }

    /// Action part of the name ("read" for "users.read").
    pub fn action(&self) -> Option<&str> {
        self.0.rsplit_once('.').map(|(_, action)| action)
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Permission {
    fn from(value: &'static str) -> Self {
        Self::from_static(value)
    }
}

impl From<String> for Permission {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

/// Permissions of one module, for the role editor's permission picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionGroup {
    pub module: String,
    pub permissions: Vec<Permission>,
}

/// Group permissions by [`Permission::module`], modules in name order and
/// permissions in input order.
pub fn group_by_module<'a, I>(permissions: I) -> Vec<PermissionGroup>
where
    I: IntoIterator<Item = &'a Permission>,
{
    let mut grouped: BTreeMap<String, Vec<Permission>> = BTreeMap::new();
    for permission in permissions {
        grouped
            .entry(permission.module().to_string())
            .or_default()
            .push(permission.clone());
    }

    grouped
        .into_iter()
        .map(|(module, permissions)| PermissionGroup {
            module,
            permissions,
        })
        .collect()
}
