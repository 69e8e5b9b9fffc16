use crate::Database;
use crate::models::{MessageHit, MessageRow, SessionRow, UserRow};
use anyhow::Result;
use parley_types::models::{PartyDetail, PartyHit, PartyRef};
use rusqlite::{Connection, OptionalExtension};

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (first_name, last_name, email, username, password)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (first_name, last_name, email, username, password_hash),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username = ?1", username))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email = ?1", email))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", id))
    }

    // -- Sessions --

    pub fn create_session(&self, token: &str, user_id: i64, username: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (token, user_id, username) VALUES (?1, ?2, ?3)",
                (token, user_id, username),
            )?;
            Ok(())
        })
    }

    pub fn get_session(&self, token: &str) -> Result<Option<SessionRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT token, user_id, username, created_at FROM sessions WHERE token = ?1",
                    [token],
                    |row| {
                        Ok(SessionRow {
                            token: row.get(0)?,
                            user_id: row.get(1)?,
                            username: row.get(2)?,
                            created_at: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn delete_session(&self, token: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM sessions WHERE token = ?1", [token])?;
            Ok(())
        })
    }

    // -- Parties --

    pub fn create_party(
        &self,
        owner_id: i64,
        parent_id: Option<i64>,
        name: &str,
        description: &str,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO parties (parent_id, user_id, name, description)
                 VALUES (?1, ?2, ?3, ?4)",
                (parent_id, owner_id, name, description),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Party detail with the parent resolved via a self-join on parent_id.
    pub fn get_party(&self, id: i64) -> Result<Option<PartyDetail>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT p.id, p.name, p.description, parent.id, parent.name
                     FROM parties AS p
                     LEFT JOIN parties AS parent ON p.parent_id = parent.id
                     WHERE p.id = ?1",
                    [id],
                    |row| {
                        let parent_id: Option<i64> = row.get(3)?;
                        let parent_name: Option<String> = row.get(4)?;
                        Ok(PartyDetail {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            description: row.get(2)?,
                            parent: parent_id.zip(parent_name).map(|(id, name)| PartyRef { id, name }),
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn list_children(&self, party_id: i64) -> Result<Vec<PartyRef>> {
        self.with_conn(|conn| {
            query_party_refs(
                conn,
                "SELECT id, name FROM parties WHERE parent_id = ?1 ORDER BY id",
                rusqlite::params![party_id],
            )
        })
    }

    pub fn list_top_parties(&self, limit: u32) -> Result<Vec<PartyRef>> {
        self.with_conn(|conn| {
            query_party_refs(
                conn,
                "SELECT id, name FROM parties ORDER BY name LIMIT ?1",
                rusqlite::params![limit],
            )
        })
    }

    // -- Subscriptions --

    pub fn list_subscriptions(&self, user_id: i64) -> Result<Vec<PartyRef>> {
        self.with_conn(|conn| {
            query_party_refs(
                conn,
                "SELECT p.id, p.name FROM parties AS p
                 JOIN user_parties AS up ON p.id = up.party_id
                 WHERE up.user_id = ?1 ORDER BY p.name",
                rusqlite::params![user_id],
            )
        })
    }

    /// Idempotent: the UNIQUE(user_id, party_id) constraint turns a repeat
    /// subscribe into a no-op.
    pub fn subscribe(&self, user_id: i64, party_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO user_parties (user_id, party_id) VALUES (?1, ?2)",
                (user_id, party_id),
            )?;
            Ok(())
        })
    }

    // -- Messages --

    pub fn insert_message(&self, party_id: i64, user_id: i64, body: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (party_id, user_id, body) VALUES (?1, ?2, ?3)",
                (party_id, user_id, body),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn list_messages(&self, party_id: i64) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_messages(conn, party_id, None))
    }

    /// Messages with id > after_id, for the polling endpoint. Empty when
    /// nothing newer exists.
    pub fn list_messages_since(&self, party_id: i64, after_id: i64) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_messages(conn, party_id, Some(after_id)))
    }

    // -- Search --

    /// Case-insensitive substring match over party names and descriptions,
    /// grouped with a distinct-subscriber count.
    pub fn search_parties(&self, term: &str) -> Result<Vec<PartyHit>> {
        let pattern = format!("%{}%", term);
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.name, COUNT(DISTINCT up.user_id)
                 FROM parties AS p
                 LEFT JOIN user_parties AS up ON p.id = up.party_id
                 WHERE p.name LIKE ?1 OR p.description LIKE ?1
                 GROUP BY p.id",
            )?;

            let rows = stmt
                .query_map([&pattern], |row| {
                    Ok(PartyHit {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        subscribers: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn search_messages(&self, term: &str) -> Result<Vec<MessageHit>> {
        let pattern = format!("%{}%", term);
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, party_id, user_id, body, sent_on
                 FROM messages WHERE body LIKE ?1",
            )?;

            let rows = stmt
                .query_map([&pattern], |row| {
                    Ok(MessageHit {
                        id: row.get(0)?,
                        party_id: row.get(1)?,
                        user_id: row.get(2)?,
                        body: row.get(3)?,
                        sent_on: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_user(
    conn: &Connection,
    filter: &str,
    param: impl rusqlite::ToSql,
) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, first_name, last_name, email, username, password, created_at
         FROM users WHERE {}",
        filter
    );

    let row = conn
        .query_row(&sql, [&param], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                email: row.get(3)?,
                username: row.get(4)?,
                password: row.get(5)?,
                created_at: row.get(6)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_party_refs(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<PartyRef>> {
    let mut stmt = conn.prepare(sql)?;

    let rows = stmt
        .query_map(params, |row| {
            Ok(PartyRef {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_messages(conn: &Connection, party_id: i64, after_id: Option<i64>) -> Result<Vec<MessageRow>> {
    // JOIN users to fetch the author username in a single query
    let mut stmt = conn.prepare(
        "SELECT m.id, m.party_id, m.user_id, u.username, m.body, m.sent_on
         FROM messages AS m
         LEFT JOIN users AS u ON m.user_id = u.id
         WHERE m.party_id = ?1 AND m.id > ?2
         ORDER BY m.id",
    )?;

    let rows = stmt
        .query_map(rusqlite::params![party_id, after_id.unwrap_or(0)], |row| {
            Ok(MessageRow {
                id: row.get(0)?,
                party_id: row.get(1)?,
                user_id: row.get(2)?,
                username: row
                    .get::<_, Option<String>>(3)?
                    .unwrap_or_else(|| "unknown".to_string()),
                body: row.get(4)?,
                sent_on: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}
