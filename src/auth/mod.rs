//! User registration, bearer token authentication and the user profile endpoints.

mod log_in;
mod middleware;
mod password;
mod profile;
mod register;
mod token;
mod user;

pub use log_in::post_log_in;
pub use middleware::auth_guard;
pub use password::{PasswordHash, ValidatedPassword};
pub use profile::{get_profile, update_profile};
pub use register::register_user;
pub use user::{
    User, UserChanges, UserID, create_user, create_user_table, get_user_by_email,
    get_user_by_id, update_user,
};

#[cfg(test)]
pub use middleware::AuthState;

#[cfg(test)]
pub use register::UserState;
