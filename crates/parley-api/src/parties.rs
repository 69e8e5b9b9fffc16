use axum::{
    Extension, Form,
    extract::{Path, State},
    http::{HeaderMap, header},
    response::{Html, Redirect},
};

use parley_types::api::{MessageForm, PartyForm};

use crate::auth::AppState;
use crate::error::{AppError, run_blocking};
use crate::session::RequestContext;
use crate::views;

pub async fn home(Extension(ctx): Extension<RequestContext>) -> Html<String> {
    Html(views::home(&ctx))
}

pub async fn create_party_form(Extension(ctx): Extension<RequestContext>) -> Html<String> {
    Html(views::create_party(&ctx, None))
}

pub async fn create_party(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<PartyForm>,
) -> Result<Redirect, AppError> {
    let owner = ctx.visitor.require()?;
    if form.name.trim().is_empty() {
        return Err(AppError::Validation("party name is required".into()));
    }

    let db = state.clone();
    let id = run_blocking(move || db.db.create_party(owner, None, &form.name, &form.description))
        .await?;

    Ok(Redirect::to(&format!("/party/{}", id)))
}

pub async fn sub_party_form(
    Path(party_id): Path<i64>,
    Extension(ctx): Extension<RequestContext>,
) -> Html<String> {
    Html(views::create_party(&ctx, Some(party_id)))
}

pub async fn create_sub_party(
    State(state): State<AppState>,
    Path(parent_id): Path<i64>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<PartyForm>,
) -> Result<Redirect, AppError> {
    let owner = ctx.visitor.require()?;
    if form.name.trim().is_empty() {
        return Err(AppError::Validation("party name is required".into()));
    }

    let db = state.clone();
    run_blocking(move || {
        let child = db
            .db
            .create_party(owner, Some(parent_id), &form.name, &form.description)?;
        // The creator follows the party they just made
        db.db.subscribe(owner, child)?;
        Ok(())
    })
    .await?;

    Ok(Redirect::to(&format!("/party/{}", parent_id)))
}

pub async fn party_detail(
    State(state): State<AppState>,
    Path(party_id): Path<i64>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Html<String>, AppError> {
    let db = state.clone();
    let found = run_blocking(move || {
        let Some(party) = db.db.get_party(party_id)? else {
            return Ok(None);
        };
        let messages = db.db.list_messages(party_id)?;
        let children = db.db.list_children(party_id)?;
        Ok(Some((party, messages, children)))
    })
    .await?;

    let Some((party, messages, children)) = found else {
        return Err(AppError::NotFound);
    };

    Ok(Html(views::party(&ctx, &party, &messages, &children)))
}

pub async fn post_message(
    State(state): State<AppState>,
    Path(party_id): Path<i64>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<MessageForm>,
) -> Result<Redirect, AppError> {
    let author = ctx.visitor.require()?;

    let db = state.clone();
    run_blocking(move || db.db.insert_message(party_id, author, &form.body).map(|_| ())).await?;

    Ok(Redirect::to(&format!("/party/{}", party_id)))
}

pub async fn subscribe(
    State(state): State<AppState>,
    Path(party_id): Path<i64>,
    Extension(ctx): Extension<RequestContext>,
    headers: HeaderMap,
) -> Result<Redirect, AppError> {
    let user_id = ctx.visitor.require()?;

    let db = state.clone();
    run_blocking(move || db.db.subscribe(user_id, party_id)).await?;

    // Back to wherever the subscribe button lived
    let back = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("/")
        .to_string();
    Ok(Redirect::to(&back))
}
