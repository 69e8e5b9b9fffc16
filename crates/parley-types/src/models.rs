use serde::{Deserialize, Serialize};

/// A party reference as it appears in menus and child listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyRef {
    pub id: i64,
    pub name: String,
}

/// Full detail for a single party, including its parent when it is a
/// sub-party.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyDetail {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub parent: Option<PartyRef>,
}

/// A party as returned by search, with its subscriber count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyHit {
    pub id: i64,
    pub name: String,
    pub subscribers: i64,
}

/// A user profile. The stored password hash never leaves parley-db.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
}
