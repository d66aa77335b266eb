//! Bearer tokens that identify the user making a request.
//!
//! Tokens are HS256 JSON Web Tokens that carry the user ID and an expiry time.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, auth::UserID};

/// The contents of a bearer token.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The user the token was issued to.
    pub user_id: UserID,
    /// When the token was issued, in seconds since the Unix epoch.
    pub iat: u64,
    /// When the token expires, in seconds since the Unix epoch.
    pub exp: u64,
}

fn unix_seconds(date_time: OffsetDateTime) -> Result<u64, Error> {
    u64::try_from(date_time.unix_timestamp())
        .map_err(|_| Error::TokenCreation(format!("{date_time} is before the Unix epoch")))
}

/// Create a signed token for `user_id` that is valid for `duration`.
///
/// # Errors
///
/// Returns an [Error::TokenCreation] if the token could not be signed.
pub fn encode_token(
    user_id: UserID,
    duration: Duration,
    encoding_key: &EncodingKey,
) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        user_id,
        iat: unix_seconds(now)?,
        exp: unix_seconds(now + duration)?,
    };

    encode(&Header::default(), &claims, encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify the signature and expiry of `token` and return its claims.
///
/// # Errors
///
/// Returns [Error::InvalidToken] if the token is malformed, was not signed
/// with the matching key, or has expired.
pub fn decode_token(token: &str, decoding_key: &DecodingKey) -> Result<Claims, Error> {
    decode::<Claims>(token, decoding_key, &Validation::default())
        .map(|token_data| token_data.claims)
        .map_err(|error| {
            tracing::warn!("Rejected bearer token: {error}");
            Error::InvalidToken
        })
}
