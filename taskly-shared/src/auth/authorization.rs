/// Authorization helpers and permission checks
///
/// Taskly has two roles: regular users and admins. This module holds the
/// single admin predicate used by the admin route layer, the task ownership
/// scopes used by the CRUD handlers, and the self-protection rule for admin
/// actions that target a user.
///
/// # Permission Model
///
/// 1. **Authenticated**: any resolved [`Session`]
/// 2. **Admin-only**: [`is_admin`] must hold
/// 3. **Ownership**: task queries on the user surface run with
///    `TaskScope::Owner`, so tasks owned by others are never visible there
/// 4. **Self-protection**: an admin may not delete themself or change their
///    own role ([`ensure_not_self`])
///
/// # Example
///
/// ```
/// use taskly_shared::auth::authorization::{ensure_not_self, TaskScope};
/// use uuid::Uuid;
///
/// let me = Uuid::new_v4();
/// let someone = Uuid::new_v4();
///
/// assert!(ensure_not_self(me, someone, "change the role of").is_ok());
/// assert!(ensure_not_self(me, me, "change the role of").is_err());
///
/// assert_eq!(TaskScope::Owner(me).owner(), Some(me));
/// assert_eq!(TaskScope::Any.owner(), None);
/// ```

use uuid::Uuid;

use super::middleware::Session;

/// Message returned when a non-admin reaches the admin surface
pub const ADMIN_ONLY_MESSAGE: &str = "Access denied. Admin only.";

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Caller is not an admin
    #[error("Access denied. Admin only.")]
    AdminRequired,

    /// Admin action targeting the acting admin
    #[error("You cannot {action} your own account.")]
    SelfTarget { action: &'static str },
}

/// Whether the session's user may use the admin surface
///
/// This is the only admin check in the system; the admin route layer
/// applies it to every `/admin` route.
pub fn is_admin(session: &Session) -> bool {
    session.user.is_admin
}

/// Requires the session's user to be an admin
///
/// # Errors
///
/// Returns `AuthzError::AdminRequired` otherwise.
pub fn require_admin(session: &Session) -> Result<(), AuthzError> {
    if is_admin(session) {
        Ok(())
    } else {
        Err(AuthzError::AdminRequired)
    }
}

/// Rejects admin actions aimed at the acting admin's own account
///
/// `action` completes the sentence "You cannot {action} your own account."
pub fn ensure_not_self(
    acting_user_id: Uuid,
    target_user_id: Uuid,
    action: &'static str,
) -> Result<(), AuthzError> {
    if acting_user_id == target_user_id {
        return Err(AuthzError::SelfTarget { action });
    }

    Ok(())
}

/// Which tasks a query may see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskScope {
    /// Only tasks owned by this user
    Owner(Uuid),

    /// Every task (admin surface)
    Any,
}

impl TaskScope {
    /// The scope of the user surface for this session
    ///
    /// Always the session's own tasks, admins included.
    pub fn own(session: &Session) -> Self {
        TaskScope::Owner(session.user_id())
    }

    /// The owner filter, if any
    pub fn owner(&self) -> Option<Uuid> {
        match self {
            TaskScope::Owner(user_id) => Some(*user_id),
            TaskScope::Any => None,
        }
    }
}
