//! User directory seam. The engine only needs to resolve a caller id to a
//! principal with roles and to check investigator eligibility; where those
//! answers come from is an integration concern. The static implementation
//! below is loaded from configuration and backs the server and the tests.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Investigator,
    Staff,
}

/// An authenticated caller as the incident engine sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub name: String,
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            roles: roles.into_iter().collect(),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    pub fn is_investigator(&self) -> bool {
        self.has_role(Role::Investigator)
    }
}

pub trait Directory: Send + Sync {
    /// Resolves a caller id to a principal, or `None` for unknown ids.
    fn resolve(&self, user_id: &str) -> Option<Principal>;

    /// Whether the id names a user eligible to run investigations.
    fn investigator_exists(&self, user_id: &str) -> bool {
        self.resolve(user_id)
            .is_some_and(|p| p.is_investigator() || p.is_admin())
    }
}

/// Directory entry shape used in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub user_id: String,
    pub name: String,
    pub roles: Vec<Role>,
}

#[derive(Default)]
pub struct StaticDirectory {
    users: HashMap<String, Principal>,
}

impl StaticDirectory {
    pub fn from_users(users: &[DirectoryUser]) -> Self {
        Self {
            users: users
                .iter()
                .map(|user| {
                    (
                        user.user_id.clone(),
                        Principal::new(&user.user_id, &user.name, user.roles.iter().copied()),
                    )
                })
                .collect(),
        }
    }
}

impl Directory for StaticDirectory {
    fn resolve(&self, user_id: &str) -> Option<Principal> {
        self.users.get(user_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> StaticDirectory {
        StaticDirectory::from_users(&[
            DirectoryUser {
                user_id: "admin1".to_string(),
                name: "Admin One".to_string(),
                roles: vec![Role::Admin],
            },
            DirectoryUser {
                user_id: "inv1".to_string(),
                name: "Investigator One".to_string(),
                roles: vec![Role::Investigator],
            },
            DirectoryUser {
                user_id: "u1".to_string(),
                name: "Staff One".to_string(),
                roles: vec![Role::Staff],
            },
        ])
    }

    #[test]
    fn resolves_known_users_only() {
        let directory = directory();
        assert!(directory.resolve("inv1").is_some());
        assert!(directory.resolve("ghost").is_none());
    }

    #[test]
    fn investigator_eligibility_covers_admins() {
        let directory = directory();
        assert!(directory.investigator_exists("inv1"));
        assert!(directory.investigator_exists("admin1"));
        assert!(!directory.investigator_exists("u1"));
        assert!(!directory.investigator_exists("ghost"));
    }
}
