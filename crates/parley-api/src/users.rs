use axum::{
    Extension,
    extract::{Path, State},
    response::Html,
};

use parley_types::models::Profile;

use crate::auth::AppState;
use crate::error::{AppError, run_blocking};
use crate::session::RequestContext;
use crate::views;

pub async fn profile(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Html<String>, AppError> {
    let db = state.clone();
    let found = run_blocking(move || {
        let Some(user) = db.db.get_user_by_id(user_id)? else {
            return Ok(None);
        };
        let subscriptions = db.db.list_subscriptions(user_id)?;
        Ok(Some((user, subscriptions)))
    })
    .await?;

    let Some((user, subscriptions)) = found else {
        return Err(AppError::NotFound);
    };

    // The stored password hash stays in the row; only profile fields are
    // handed to the view.
    let profile = Profile {
        id: user.id,
        first_name: user.first_name,
        last_name: user.last_name,
        email: user.email,
        username: user.username,
    };

    Ok(Html(views::profile(&ctx, &profile, &subscriptions)))
}
