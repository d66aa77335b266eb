#![allow(missing_docs)]

pub(crate) mod fixtures;
pub(crate) mod http;

pub(crate) use fixtures::{
    create_test_account, create_test_user, get_test_app_state, get_test_connection,
    get_test_user_state,
};
pub(crate) use http::get_json_body;
