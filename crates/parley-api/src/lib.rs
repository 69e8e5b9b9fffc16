pub mod auth;
pub mod error;
pub mod messages;
pub mod parties;
pub mod search;
pub mod session;
pub mod users;
pub mod views;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::AppState;

/// The full route table. Every route sits behind the session middleware,
/// which resolves the cookie into a `RequestContext` and computes the
/// navigation menu for the request.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(parties::home))
        .route("/party", get(parties::create_party_form).post(parties::create_party))
        .route(
            "/party/{party_id}/new",
            get(parties::sub_party_form).post(parties::create_sub_party),
        )
        .route(
            "/party/{party_id}",
            get(parties::party_detail).post(parties::post_message),
        )
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/search", get(search::search))
        .route("/subscribe/{party_id}", post(parties::subscribe))
        .route("/account", get(auth::account_form).post(auth::register))
        .route("/user/{user_id}", get(users::profile))
        .route("/api/party/{party_id}/{message_id}", get(messages::messages_since))
        .layer(middleware::from_fn_with_state(state.clone(), session::context))
        .with_state(state)
}
