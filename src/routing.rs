//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::{
    AppState,
    account::{
        create_account_endpoint, delete_account_endpoint, edit_account_endpoint,
        get_account_endpoint, list_accounts_endpoint,
    },
    auth::{auth_guard, get_profile, post_log_in, register_user, update_profile},
    endpoints,
    transaction::{
        create_transaction_endpoint, get_transaction_endpoint, list_transactions_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_welcome))
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in));

    let protected_routes = Router::new()
        .route(endpoints::PROFILE, get(get_profile).put(update_profile))
        .route(
            endpoints::ACCOUNTS,
            get(list_accounts_endpoint).post(create_account_endpoint),
        )
        .route(
            endpoints::ACCOUNT,
            get(get_account_endpoint)
                .put(edit_account_endpoint)
                .delete(delete_account_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(endpoints::TRANSACTION, get(get_transaction_endpoint))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .with_state(state)
}

/// The root path '/' greets the client.
async fn get_welcome() -> &'static str {
    "Welcome to the ledger API"
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;

    use crate::{build_router, endpoints, test_utils::get_test_app_state};

    #[tokio::test]
    async fn root_is_public() {
        let server = TestServer::try_new(build_router(get_test_app_state())).unwrap();

        let response = server.get(endpoints::ROOT).await;

        response.assert_status_ok();
        response.assert_text("Welcome to the ledger API");
    }

    #[tokio::test]
    async fn ledger_routes_require_token() {
        let server = TestServer::try_new(build_router(get_test_app_state())).unwrap();

        for path in [
            endpoints::PROFILE,
            endpoints::ACCOUNTS,
            endpoints::TRANSACTIONS,
            "/accounts/1",
            "/transactions/1",
        ] {
            server
                .get(path)
                .await
                .assert_status(StatusCode::UNAUTHORIZED);
        }
    }
}
