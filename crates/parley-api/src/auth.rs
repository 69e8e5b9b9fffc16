use std::sync::Arc;

use anyhow::anyhow;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{self, SaltString, rand_core::OsRng},
};
use axum::{
    Extension, Form,
    extract::{RawQuery, State},
    response::{Html, IntoResponse, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use uuid::Uuid;

use parley_db::Database;
use parley_types::api::{LoginForm, RegisterForm};

use crate::error::{AppError, run_blocking};
use crate::session::{RequestContext, SESSION_COOKIE};
use crate::views;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
}

pub async fn login_form(
    Extension(ctx): Extension<RequestContext>,
    RawQuery(query): RawQuery,
) -> Html<String> {
    let invalid = query.as_deref().is_some_and(|q| q.contains("invalid"));
    Html(views::login(&ctx, invalid))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.clone();
    let username = form.username.clone();
    let user = run_blocking(move || db.db.get_user_by_username(&username))
        .await?
        .ok_or(AppError::Auth)?;

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| AppError::Internal(anyhow!("stored hash unreadable: {}", e)))?;

    match Argon2::default().verify_password(form.password.as_bytes(), &parsed_hash) {
        Ok(()) => {}
        Err(password_hash::Error::Password) => return Err(AppError::Auth),
        Err(e) => return Err(AppError::Internal(anyhow!("password verification failed: {}", e))),
    }

    let token = Uuid::new_v4().to_string();
    let db = state.clone();
    let session_token = token.clone();
    let user_id = user.id;
    let username = user.username.clone();
    run_blocking(move || db.db.create_session(&session_token, user_id, &username)).await?;

    let cookie = Cookie::build((SESSION_COOKIE, token)).path("/").http_only(true);
    Ok((
        jar.add(cookie),
        Redirect::to(&format!("/user/{}", user.id)),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let token = cookie.value().to_string();
        let db = state.clone();
        run_blocking(move || db.db.delete_session(&token)).await?;
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, Redirect::to("/")))
}

pub async fn account_form(Extension(ctx): Extension<RequestContext>) -> Html<String> {
    Html(views::account(&ctx))
}

pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Redirect, AppError> {
    for (field, value) in [
        ("first name", &form.first_name),
        ("last name", &form.last_name),
        ("email", &form.email),
        ("username", &form.username),
        ("password", &form.password),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{} is required", field)));
        }
    }

    // Check uniqueness up front so the caller gets a conflict rather than
    // a bare constraint failure.
    let db = state.clone();
    let username = form.username.clone();
    if run_blocking(move || db.db.get_user_by_username(&username))
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("username"));
    }

    let db = state.clone();
    let email = form.email.clone();
    if run_blocking(move || db.db.get_user_by_email(&email))
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("email"));
    }

    // Hash the password with a per-call random salt
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(form.password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow!("password hashing failed: {}", e)))?
        .to_string();

    let db = state.clone();
    run_blocking(move || {
        db.db.create_user(
            &form.first_name,
            &form.last_name,
            &form.email,
            &form.username,
            &password_hash,
        )
    })
    .await?;

    Ok(Redirect::to("/"))
}
