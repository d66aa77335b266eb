//! The API endpoints URIs.
//!
//! Endpoints that take a parameter, e.g. '/accounts/{account_id}', use axum's path syntax.

/// The root route which responds with a welcome message.
pub const ROOT: &str = "/";
/// The route for registering a new user.
pub const REGISTER: &str = "/users/register";
/// The route for exchanging an email and password for a bearer token.
pub const LOG_IN: &str = "/users/login";
/// The route for reading and updating the logged-in user's profile.
pub const PROFILE: &str = "/users/me";
/// The route for listing and opening accounts.
pub const ACCOUNTS: &str = "/accounts";
/// The route for reading, updating and deleting a single account.
pub const ACCOUNT: &str = "/accounts/{account_id}";
/// The route for listing and applying transactions.
pub const TRANSACTIONS: &str = "/transactions";
/// The route for reading a single transaction.
pub const TRANSACTION: &str = "/transactions/{transaction_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_endpoint(ACCOUNT, 42), "/accounts/42");
/// ```
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    match (endpoint_path.find('{'), endpoint_path.find('}')) {
        (Some(start), Some(end)) if start < end => {
            format!("{}{id}{}", &endpoint_path[..start], &endpoint_path[end + 1..])
        }
        _ => endpoint_path.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::{ACCOUNT, ACCOUNTS, TRANSACTION, format_endpoint};

    #[test]
    fn replaces_parameter() {
        assert_eq!(format_endpoint(ACCOUNT, 42), "/accounts/42");
        assert_eq!(format_endpoint(TRANSACTION, 7), "/transactions/7");
    }

    #[test]
    fn leaves_plain_paths_alone() {
        assert_eq!(format_endpoint(ACCOUNTS, 42), ACCOUNTS);
    }
}
