//! Static route table and path matching.
//!
//! Routes are declared once, in order; path patterns may contain `:param`
//! segments. Redirect entries are consulted before any pattern.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Screen backing a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    /// Sign-in form.
    Login,
    /// Account creation form.
    Register,
    /// Landing page for signed-in users.
    Dashboard,
    /// Transaction list.
    Transactions,
    /// Transaction creation form.
    CreateTransaction,
    /// Single transaction review.
    TransactionDetail,
    /// Administration console.
    Admin,
    /// Current user's profile.
    Profile,
}

impl View {
    /// Stable identifier of the view.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Register => "register",
            Self::Dashboard => "dashboard",
            Self::Transactions => "transactions",
            Self::CreateTransaction => "create-transaction",
            Self::TransactionDetail => "transaction-detail",
            Self::Admin => "admin",
            Self::Profile => "profile",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-route access requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuardFlags {
    /// Only signed-in users may enter.
    pub requires_auth: bool,
    /// Only anonymous users may enter.
    pub requires_guest: bool,
    /// Only admins may enter.
    pub requires_admin: bool,
}

impl GuardFlags {
    /// Open to everyone.
    pub const PUBLIC: Self = Self {
        requires_auth: false,
        requires_guest: false,
        requires_admin: false,
    };
    /// Anonymous users only.
    pub const GUEST: Self = Self {
        requires_auth: false,
        requires_guest: true,
        requires_admin: false,
    };
    /// Signed-in users only.
    pub const AUTH: Self = Self {
        requires_auth: true,
        requires_guest: false,
        requires_admin: false,
    };
    /// Signed-in admins only.
    pub const ADMIN: Self = Self {
        requires_auth: true,
        requires_guest: false,
        requires_admin: true,
    };
}

/// One entry of the route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    pattern: &'static str,
    name: &'static str,
    view: View,
    flags: GuardFlags,
}

impl RouteDescriptor {
    /// Declare a route.
    pub const fn new(
        pattern: &'static str,
        name: &'static str,
        view: View,
        flags: GuardFlags,
    ) -> Self {
        Self {
            pattern,
            name,
            view,
            flags,
        }
    }

    /// Path pattern, e.g. `/transactions/:id`.
    pub fn pattern(&self) -> &'static str {
        self.pattern
    }

    /// Symbolic name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// View rendered for this route.
    pub fn view(&self) -> View {
        self.view
    }

    /// Access requirements.
    pub fn flags(&self) -> GuardFlags {
        self.flags
    }

    fn capture(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let mut pattern_segments = segments(self.pattern);
        let mut path_segments = segments(path);
        let mut params = BTreeMap::new();
        loop {
            match (pattern_segments.next(), path_segments.next()) {
                (None, None) => return Some(params),
                (Some(expected), Some(actual)) => {
                    if let Some(param) = expected.strip_prefix(':') {
                        params.insert(param.to_owned(), actual.to_owned());
                    } else if expected != actual {
                        return None;
                    }
                }
                _ => return None,
            }
        }
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// A route matched against a concrete path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    route: RouteDescriptor,
    path: String,
    params: BTreeMap<String, String>,
}

impl RouteMatch {
    /// Matched route.
    pub fn route(&self) -> &RouteDescriptor {
        &self.route
    }

    /// Normalised concrete path.
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Captured `:param` values keyed by parameter name.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Captured value of `name`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Outcome of resolving a path against the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The path is a redirect entry.
    Redirect(String),
    /// The path matched a route.
    Matched(RouteMatch),
}

/// Routing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// No redirect or route matches the path.
    #[error("no route matches `{path}`")]
    NotFound {
        /// Normalised path that failed to match.
        path: String,
    },
    /// Redirects did not settle within the hop limit.
    #[error("navigation to `{path}` redirected more than {hops} times")]
    RedirectLoop {
        /// Originally requested path.
        path: String,
        /// Hop limit that was exceeded.
        hops: usize,
    },
}

/// Ordered route table with redirect entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    redirects: Vec<(String, String)>,
    routes: Vec<RouteDescriptor>,
}

impl RouteTable {
    /// Table with the given routes and no redirects.
    pub fn new(routes: Vec<RouteDescriptor>) -> Self {
        Self {
            redirects: Vec::new(),
            routes,
        }
    }

    /// Add a redirect entry from `from` to `to`.
    #[must_use]
    pub fn with_redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.push((normalize(from), normalize(to)));
        self
    }

    /// The application's routes.
    ///
    /// # Examples
    /// ```
    /// use client::domain::{Resolution, RouteTable, View};
    ///
    /// let table = RouteTable::standard();
    /// let Resolution::Matched(found) = table.resolve("/transactions/42").unwrap() else {
    ///     panic!("expected a route");
    /// };
    /// assert_eq!(found.route().view(), View::TransactionDetail);
    /// assert_eq!(found.param("id"), Some("42"));
    /// ```
    pub fn standard() -> Self {
        Self::new(vec![
            RouteDescriptor::new("/login", "login", View::Login, GuardFlags::GUEST),
            RouteDescriptor::new("/register", "register", View::Register, GuardFlags::GUEST),
            RouteDescriptor::new("/dashboard", "dashboard", View::Dashboard, GuardFlags::AUTH),
            RouteDescriptor::new(
                "/transactions",
                "transactions",
                View::Transactions,
                GuardFlags::AUTH,
            ),
            RouteDescriptor::new(
                "/transactions/create",
                "create-transaction",
                View::CreateTransaction,
                GuardFlags::AUTH,
            ),
            RouteDescriptor::new(
                "/transactions/:id",
                "transaction-detail",
                View::TransactionDetail,
                GuardFlags::AUTH,
            ),
            RouteDescriptor::new("/admin", "admin", View::Admin, GuardFlags::ADMIN),
            RouteDescriptor::new("/profile", "profile", View::Profile, GuardFlags::AUTH),
        ])
        .with_redirect("/", "/dashboard")
    }

    /// Resolve `path`: redirects first, then routes in declaration order.
    pub fn resolve(&self, path: &str) -> Result<Resolution, RouteError> {
        let path = normalize(path);
        if let Some((_, target)) = self.redirects.iter().find(|(from, _)| *from == path) {
            return Ok(Resolution::Redirect(target.clone()));
        }
        self.routes
            .iter()
            .find_map(|route| {
                route.capture(&path).map(|params| RouteMatch {
                    route: route.clone(),
                    path: path.clone(),
                    params,
                })
            })
            .map(Resolution::Matched)
            .ok_or(RouteError::NotFound { path })
    }
}

/// Strip query and fragment, collapse repeated and trailing slashes.
pub fn normalize(path: &str) -> String {
    let bare = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let joined = segments(bare).collect::<Vec<_>>().join("/");
    format!("/{joined}")
}
