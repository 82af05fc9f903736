//! Route authorization guard and the navigating router.

use tracing::debug;

use crate::domain::ports::{AuthGateway, SessionStorage};
use crate::domain::routing::{GuardFlags, Resolution, RouteError, RouteMatch, RouteTable, normalize};
use crate::domain::session::{SessionState, SessionStore};

/// Where unauthenticated users are sent.
pub const LOGIN_PATH: &str = "/login";
/// Where authenticated users land when a route is not for them.
pub const LANDING_PATH: &str = "/dashboard";

/// Redirect hops followed before navigation gives up.
pub const MAX_REDIRECT_HOPS: usize = 8;

/// Guard verdict for one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Enter the route.
    Allow,
    /// Go to this path instead.
    Redirect(&'static str),
}

/// Decide whether `session` may enter a route with `flags`.
///
/// Checks run in order: authentication, guest-only, admin.
///
/// # Examples
/// ```
/// use client::domain::{GuardDecision, GuardFlags, SessionState, authorize};
///
/// let anonymous = SessionState::anonymous();
/// assert_eq!(authorize(GuardFlags::AUTH, &anonymous), GuardDecision::Redirect("/login"));
/// assert_eq!(authorize(GuardFlags::GUEST, &anonymous), GuardDecision::Allow);
/// ```
pub fn authorize(flags: GuardFlags, session: &SessionState) -> GuardDecision {
    let authenticated = session.is_authenticated();
    if flags.requires_auth && !authenticated {
        return GuardDecision::Redirect(LOGIN_PATH);
    }
    if flags.requires_guest && authenticated {
        return GuardDecision::Redirect(LANDING_PATH);
    }
    if flags.requires_admin && !session.is_admin() {
        return GuardDecision::Redirect(LANDING_PATH);
    }
    GuardDecision::Allow
}

/// Result of a completed navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// Route finally entered.
    pub location: RouteMatch,
    /// Originally requested path when the guard or a redirect entry moved
    /// the navigation elsewhere.
    pub redirected_from: Option<String>,
}

impl Navigation {
    /// The navigation ended somewhere other than requested.
    pub fn was_redirected(&self) -> bool {
        self.redirected_from.is_some()
    }
}

/// Resolves paths and applies the guard.
#[derive(Debug, Clone)]
pub struct Router {
    table: RouteTable,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(RouteTable::standard())
    }
}

impl Router {
    /// Router over `table`.
    pub fn new(table: RouteTable) -> Self {
        Self { table }
    }

    /// Navigate to `path`, hydrating the session first when it holds a token
    /// without a profile.
    pub async fn navigate<A, S>(
        &self,
        path: &str,
        session: &SessionStore<A, S>,
    ) -> Result<Navigation, RouteError>
    where
        A: AuthGateway + ?Sized,
        S: SessionStorage + ?Sized,
    {
        let requested = normalize(path);
        let mut current = requested.clone();
        for _ in 0..=MAX_REDIRECT_HOPS {
            let found = match self.table.resolve(&current)? {
                Resolution::Redirect(target) => {
                    debug!(from = %current, to = %target, "route redirect");
                    current = target;
                    continue;
                }
                Resolution::Matched(found) => found,
            };

            if session.needs_hydration() {
                session.initialize_auth().await;
            }
            match authorize(found.route().flags(), &session.snapshot()) {
                GuardDecision::Allow => {
                    let redirected_from = (found.path() != requested).then_some(requested);
                    return Ok(Navigation {
                        location: found,
                        redirected_from,
                    });
                }
                GuardDecision::Redirect(target) => {
                    debug!(from = %current, to = target, "guard redirect");
                    current = target.to_owned();
                }
            }
        }
        Err(RouteError::RedirectLoop {
            path: requested,
            hops: MAX_REDIRECT_HOPS,
        })
    }
}

#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;
