//! Authenticated user profile.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Backend-assigned numeric user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    /// Wrap a raw identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw identifier value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role granted to a user account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Back-office administrator.
    Admin,
    /// Regular customer account.
    User,
    /// Any role the client does not interpret.
    Other(String),
}

impl Role {
    /// Wire name of the role.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
            Self::Other(name) => name.as_str(),
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Self::Admin,
            "user" => Self::User,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        match value {
            Role::Other(name) => name,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile of the signed-in user, as returned by the current-user endpoint.
///
/// This is also the persisted form stored under the `user` storage key.
///
/// # Examples
/// ```
/// use client::domain::{Role, UserId, UserProfile};
///
/// let profile = UserProfile::new(UserId::new(1), "alice", "", vec![Role::User]);
/// assert!(profile.is_user());
/// assert!(!profile.is_admin());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    id: UserId,
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    roles: Vec<Role>,
}

impl UserProfile {
    /// Build a profile; duplicate roles are dropped.
    pub fn new(
        id: UserId,
        username: impl Into<String>,
        email: impl Into<String>,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        let mut unique = Vec::new();
        for role in roles {
            if !unique.contains(&role) {
                unique.push(role);
            }
        }
        Self {
            id,
            username: username.into(),
            email: email.into(),
            roles: unique,
        }
    }

    /// Backend identifier.
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Login name.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Contact email; empty when the backend omitted it.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Granted roles.
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Return whether the profile carries `role`.
    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    /// Return whether the user is an administrator.
    pub fn is_admin(&self) -> bool {
        self.has_role(&Role::Admin)
    }

    /// Return whether the user holds the regular user role.
    pub fn is_user(&self) -> bool {
        self.has_role(&Role::User)
    }
}
