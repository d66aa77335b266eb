//! Code for creating the user table and fetching users from the database.

use std::{fmt::Display, str::FromStr};

use email_address::EmailAddress;
use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};

use crate::{Error, PasswordHash, Timestamp};

/// The longest username or email address that will be stored.
const MAX_FIELD_LENGTH: usize = 255;

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The unique name the user registered with.
    pub username: String,
    /// The unique email address the user logs in with.
    pub email: String,
    /// The user's password hash.
    #[serde(skip_serializing)]
    pub password_hash: PasswordHash,
    /// When the user registered.
    pub created_at: Timestamp,
    /// When the user's details last changed.
    pub updated_at: Timestamp,
}

/// Changes to apply to a user's details. Fields set to `None` are left as they are.
#[derive(Debug, Default)]
pub struct UserChanges {
    /// The new username.
    pub username: Option<String>,
    /// The new email address.
    pub email: Option<String>,
    /// The hash of the new password.
    pub password_hash: Option<PasswordHash>,
}

/// Check that `username` is non-empty and not too long, returning it trimmed.
///
/// # Errors
///
/// Returns an [Error::Validation] describing the problem.
pub fn validate_username(username: &str) -> Result<String, Error> {
    let username = username.trim();

    if username.is_empty() {
        return Err(Error::Validation("Username cannot be empty".to_owned()));
    }

    if username.chars().count() > MAX_FIELD_LENGTH {
        return Err(Error::Validation(format!(
            "Username cannot be longer than {MAX_FIELD_LENGTH} characters"
        )));
    }

    Ok(username.to_owned())
}

/// Check that `email` is a valid email address, returning it trimmed.
///
/// # Errors
///
/// Returns an [Error::Validation] if `email` is not a valid email address.
pub fn validate_email(email: &str) -> Result<String, Error> {
    let email = email.trim();

    if email.chars().count() > MAX_FIELD_LENGTH {
        return Err(Error::Validation(format!(
            "Email cannot be longer than {MAX_FIELD_LENGTH} characters"
        )));
    }

    EmailAddress::from_str(email)
        .map(|address| address.as_str().to_owned())
        .map_err(|error| Error::Validation(format!("Invalid email address: {error}")))
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

fn map_row_to_user(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Create and insert a new user into the database.
///
/// `username` and `email` are expected to have been checked with
/// [validate_username] and [validate_email].
///
/// # Errors
///
/// Returns an:
/// - [Error::DuplicateUsername] if the username is taken,
/// - [Error::DuplicateEmail] if the email address is already registered,
/// - [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(
    username: &str,
    email: &str,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    let now = Timestamp::now();

    connection.execute(
        "INSERT INTO user (username, email, password, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?4)",
        params![username, email, password_hash.as_ref(), now],
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        username: username.to_owned(),
        email: email.to_owned(),
        password_hash,
        created_at: now,
        updated_at: now,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, username, email, password, created_at, updated_at
            FROM user WHERE id = :id",
        )?
        .query_row(&[(":id", &user_id.as_i64())], map_row_to_user)
        .map_err(|error| error.into())
}

/// Get the user registered with `email`.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has registered with `email`.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, username, email, password, created_at, updated_at
            FROM user WHERE email = :email",
        )?
        .query_row(&[(":email", &email.trim())], map_row_to_user)
        .map_err(|error| error.into())
}

/// Apply `changes` to the user with `user_id` and return the updated user.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist, or one of the
/// duplicate errors from [create_user] if the new username or email is taken.
pub fn update_user(
    user_id: UserID,
    changes: UserChanges,
    connection: &Connection,
) -> Result<User, Error> {
    let mut user = get_user_by_id(user_id, connection)?;

    if let Some(username) = changes.username {
        user.username = username;
    }

    if let Some(email) = changes.email {
        user.email = email;
    }

    if let Some(password_hash) = changes.password_hash {
        user.password_hash = password_hash;
    }

    user.updated_at = Timestamp::now();

    connection.execute(
        "UPDATE user SET username = ?1, email = ?2, password = ?3, updated_at = ?4 WHERE id = ?5",
        params![
            user.username,
            user.email,
            user.password_hash.as_ref(),
            user.updated_at,
            user.id.as_i64()
        ],
    )?;

    Ok(user)
}
