use rusqlite::Connection;

use crate::{
    AppConfig, AppState, PasswordHash, UserID,
    account::{Account, create_account, set_balance},
    auth::{User, UserState, create_user},
    db::initialize,
    money::Balance,
    timestamp::Timestamp,
};

pub(crate) const TEST_JWT_SECRET: &str = "averysecretsecretfortests";

/// Settings that keep tests fast: the cheapest bcrypt cost and a short lock timeout.
pub(crate) fn get_test_config() -> AppConfig {
    AppConfig {
        password_cost: 4,
        lock_timeout: std::time::Duration::from_millis(500),
        ..Default::default()
    }
}

#[track_caller]
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("could not create in-memory SQLite database");
    initialize(&connection).expect("could not initialize test DB");

    connection
}

#[track_caller]
pub(crate) fn get_test_app_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("could not create in-memory SQLite database");

    AppState::new(connection, TEST_JWT_SECRET, get_test_config())
        .expect("could not create app state")
}

pub(crate) fn get_test_user_state() -> UserState {
    let app_state = get_test_app_state();

    UserState {
        db_connection: app_state.db_connection,
        jwt_keys: app_state.jwt_keys,
        config: app_state.config,
    }
}

/// Create a user named `username` with the email `<username>@example.com`.
#[track_caller]
pub(crate) fn create_test_user(username: &str, connection: &Connection) -> User {
    create_user(
        username,
        &format!("{username}@example.com"),
        PasswordHash::new_unchecked("hunter2"),
        connection,
    )
    .expect("could not create test user")
}

/// Create an account for `user_id` holding `balance_cents`.
#[track_caller]
pub(crate) fn create_test_account(
    user_id: UserID,
    account_number: &str,
    balance_cents: i64,
    connection: &Connection,
) -> Account {
    let mut account = create_account(user_id, "checking", account_number, connection)
        .expect("could not create test account");
    let balance = Balance::from_cents(balance_cents).expect("balance must not be negative");
    let now = Timestamp::now();
    set_balance(account.id, balance, now, connection).expect("could not set test balance");

    account.balance = balance;
    account.updated_at = now;
    account
}
