use std::collections::HashMap;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use parley_types::models::PartyRef;

use crate::auth::AppState;
use crate::error::{AppError, run_blocking};

pub const SESSION_COOKIE: &str = "parley_session";

/// Menu size for anonymous visitors.
const TOP_PARTY_LIMIT: u32 = 10;

/// The per-request identity derived from the session cookie. Absence of a
/// session is the anonymous state, not an error.
#[derive(Debug, Clone, Default)]
pub struct Visitor {
    pub user_id: Option<i64>,
    pub username: Option<String>,
}

impl Visitor {
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Gate for operations that require a logged-in user.
    pub fn require(&self) -> Result<i64, AppError> {
        self.user_id.ok_or(AppError::Auth)
    }
}

/// The navigation menu computed for this request: the visitor's
/// subscriptions when authenticated, the top parties otherwise.
#[derive(Debug, Clone, Default)]
pub struct Menu {
    pub entries: Vec<PartyRef>,
    /// party id -> name for the visitor's subscriptions; empty for guests.
    pub mine: HashMap<i64, String>,
}

impl Menu {
    pub fn is_subscribed(&self, party_id: i64) -> bool {
        self.mine.contains_key(&party_id)
    }
}

/// Everything a handler needs to know about the requester, passed as a
/// typed extension rather than ambient state.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub visitor: Visitor,
    pub menu: Menu,
}

/// Resolve the session cookie into a `RequestContext` and attach it to the
/// request. Every route passes through here.
pub async fn context(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());

    let db = state.clone();
    let ctx = run_blocking(move || {
        let session = match token.as_deref() {
            Some(token) => db.db.get_session(token)?,
            None => None,
        };

        match session {
            Some(session) => {
                let entries = db.db.list_subscriptions(session.user_id)?;
                let mine = entries
                    .iter()
                    .map(|p| (p.id, p.name.clone()))
                    .collect::<HashMap<_, _>>();
                Ok(RequestContext {
                    visitor: Visitor {
                        user_id: Some(session.user_id),
                        username: Some(session.username),
                    },
                    menu: Menu { entries, mine },
                })
            }
            None => Ok(RequestContext {
                visitor: Visitor::default(),
                menu: Menu {
                    entries: db.db.list_top_parties(TOP_PARTY_LIMIT)?,
                    mine: HashMap::new(),
                },
            }),
        }
    })
    .await?;

    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}
