use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use parley_db::models::MessageRow;
use parley_types::api::MessageJson;

use crate::auth::AppState;
use crate::error::{AppError, run_blocking};

/// JSON polling endpoint: messages in a party with id greater than the
/// given message id, oldest first.
pub async fn messages_since(
    State(state): State<AppState>,
    Path((party_id, after_id)): Path<(i64, i64)>,
) -> Result<Json<Vec<MessageJson>>, AppError> {
    let db = state.clone();
    let rows = run_blocking(move || db.db.list_messages_since(party_id, after_id)).await?;

    Ok(Json(rows.into_iter().map(to_json).collect()))
}

fn to_json(row: MessageRow) -> MessageJson {
    let sent_on = parse_sent_on(&row.sent_on, row.id);
    MessageJson {
        id: row.id,
        party_id: row.party_id,
        user_id: row.user_id,
        username: row.username,
        body: row.body,
        sent_on,
    }
}

fn parse_sent_on(raw: &str, message_id: i64) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without
            // timezone. Parse as naive UTC and convert.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt sent_on '{}' on message {}: {}", raw, message_id, e);
            DateTime::default()
        })
}
