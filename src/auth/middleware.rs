//! Authentication middleware that resolves bearer tokens to users.

use axum::{
    RequestPartsExt,
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::DecodingKey;

use crate::{AppState, Error, auth::token::decode_token};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key for verifying bearer tokens.
    pub decoding_key: DecodingKey,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            decoding_key: state.jwt_keys.decoding_key.clone(),
        }
    }
}

/// Middleware function that checks for a valid bearer token.
///
/// The user ID is placed into the request extensions and then the request is
/// executed normally if the token is valid, otherwise a 401 response is returned
/// without running the handler.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let header = parts.extract::<TypedHeader<Authorization<Bearer>>>().await;
    let bearer = match header {
        Ok(TypedHeader(Authorization(bearer))) => bearer,
        Err(error) => {
            tracing::warn!("Rejected request to {} without a bearer token: {error}", parts.uri);
            return Error::InvalidToken.into_response();
        }
    };

    let claims = match decode_token(bearer.token(), &state.decoding_key) {
        Ok(claims) => claims,
        Err(error) => return error.into_response(),
    };

    parts.extensions.insert(claims.user_id);
    let request = Request::from_parts(parts, body);

    next.run(request).await
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{
        Extension, Router, http::StatusCode, middleware, routing::get,
    };
    use axum_test::TestServer;
    use time::Duration;

    use crate::{
        app_state::JwtKeys,
        auth::{AuthState, UserID, auth_guard, token::encode_token},
    };

    async fn test_handler(Extension(user_id): Extension<UserID>) -> String {
        user_id.to_string()
    }

    const TEST_PROTECTED_ROUTE: &str = "/protected";

    fn get_test_server(keys: &JwtKeys) -> TestServer {
        let state = AuthState {
            decoding_key: keys.decoding_key.clone(),
        };

        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(test_handler))
            .route_layer(middleware::from_fn_with_state(state, auth_guard));

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn passes_user_id_to_handler() {
        let keys = JwtKeys::new("nafstenoas");
        let server = get_test_server(&keys);
        let token =
            encode_token(UserID::new(3), Duration::minutes(5), &keys.encoding_key).unwrap();

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();
        response.assert_text("3");
    }

    #[tokio::test]
    async fn rejects_missing_token() {
        let keys = JwtKeys::new("nafstenoas");
        let server = get_test_server(&keys);

        let response = server.get(TEST_PROTECTED_ROUTE).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejects_forged_token() {
        let keys = JwtKeys::new("nafstenoas");
        let server = get_test_server(&keys);
        let forged = encode_token(
            UserID::new(3),
            Duration::minutes(5),
            &JwtKeys::new("guessed").encoding_key,
        )
        .unwrap();

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .authorization_bearer(forged)
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
