pub mod auth;

pub use auth::{CurrentUser, get_current_user, get_or_create_user, require_admin, require_auth};
