use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// -- Forms --

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PartyForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageForm {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
}

// -- Polling API --

/// One message in the `/api/party/{party_id}/{message_id}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageJson {
    pub id: i64,
    pub party_id: i64,
    pub user_id: i64,
    pub username: String,
    pub body: String,
    pub sent_on: DateTime<Utc>,
}
