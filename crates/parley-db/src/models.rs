/// Database row types — these map directly to SQLite rows.
/// Distinct from parley-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct SessionRow {
    pub token: String,
    pub user_id: i64,
    pub username: String,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: i64,
    pub party_id: i64,
    pub user_id: i64,
    pub username: String,
    pub body: String,
    pub sent_on: String,
}

/// A message as returned by search. No author join there, matching the
/// party view where usernames are needed and search where they are not.
pub struct MessageHit {
    pub id: i64,
    pub party_id: i64,
    pub user_id: i64,
    pub body: String,
    pub sent_on: String,
}
