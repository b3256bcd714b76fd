//! Credentials and the per-request auth guard.

pub mod cookie;
pub mod guard;
pub mod password;
pub mod token;

pub use guard::{protect, restrict_to, CurrentUser, Identity};
pub use password::{PasswordError, PasswordHasher, ResetToken};
pub use token::{Claims, TokenError, TokenService};

pub const NOT_LOGGED_IN: &str = "You are not logged in! Please log in to get access.";
pub const USER_GONE: &str = "The user belonging to this token no longer exists.";
pub const PASSWORD_CHANGED: &str = "User recently changed password! Please log in again.";
pub const NO_PERMISSION: &str = "You do not have permission to perform this action";
