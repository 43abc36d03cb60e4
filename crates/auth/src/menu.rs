use serde::{Deserialize, Serialize};

use crate::{Permission, Principal};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub color: String,
    pub text: String,
}

/// A sidebar entry. Section titles carry `title = true` and no path.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub label: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub badge: Option<Badge>,
    #[serde(default)]
    pub required_permissions: Vec<Permission>,
    #[serde(default)]
    pub title: bool,
    #[serde(default)]
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    pub fn link(label: impl Into<String>, path: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            path: Some(path.into()),
            icon: Some(icon.into()),
            ..Self::default()
        }
    }

    pub fn section(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            title: true,
            ..Self::default()
        }
    }

    pub fn group(label: impl Into<String>, icon: impl Into<String>, children: Vec<MenuItem>) -> Self {
        Self {
            label: label.into(),
            icon: Some(icon.into()),
            children,
            ..Self::default()
        }
    }

    pub fn requiring<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        self.required_permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_badge(mut self, color: impl Into<String>, text: impl Into<String>) -> Self {
        self.badge = Some(Badge {
            color: color.into(),
            text: text.into(),
        });
        self
    }

    fn visible_to(&self, principal: &Principal) -> bool {
        self.required_permissions.is_empty() || principal.has_any_permission(&self.required_permissions)
    }
}

/// Items `principal` may see, in their original order.
///
/// Always ANY semantics: holding one of an item's permissions shows it, even
/// where the matching route requires all of them. Children of a kept item are
/// filtered by the same rule.
pub fn filter_menu(items: &[MenuItem], principal: &Principal) -> Vec<MenuItem> {
    items
        .iter()
        .filter(|item| item.visible_to(principal))
        .map(|item| MenuItem {
            children: filter_menu(&item.children, principal),
            ..item.clone()
        })
        .collect()
}
