use axum::{
    Extension,
    extract::{Query, State},
    response::Html,
};

use parley_types::api::SearchParams;

use crate::auth::AppState;
use crate::error::{AppError, run_blocking};
use crate::session::RequestContext;
use crate::views;

/// Query-time substring search over parties and messages. No persistent
/// index; both matches run per request.
pub async fn search(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(params): Query<SearchParams>,
) -> Result<Html<String>, AppError> {
    let term = params.query;

    let db = state.clone();
    let query = term.clone();
    let (parties, messages) = run_blocking(move || {
        let parties = db.db.search_parties(&query)?;
        let messages = db.db.search_messages(&query)?;
        Ok((parties, messages))
    })
    .await?;

    Ok(Html(views::search(&ctx, &term, &parties, &messages)))
}
