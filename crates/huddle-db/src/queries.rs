use crate::models::{MemberRow, MessageRow, TokenRow, TokenWithMember};
use crate::{Database, UniqueViolation};
use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, ErrorCode, Row};

const MEMBER_COLUMNS: &str = "id, username, password, created_at, updated_at";

impl Database {
    // -- Members --

    /// Insert a member. A taken username fails with [`UniqueViolation`],
    /// which is the authoritative guard against concurrent registrations.
    pub fn create_member(&self, id: &str, username: &str, password_hash: &str) -> Result<MemberRow> {
        let now = timestamp_now();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO members (id, username, password, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                (id, username, password_hash, &now),
            )
            .map_err(|e| unique_or(e, "members.username"))?;

            Ok(MemberRow {
                id: id.to_string(),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                created_at: now.clone(),
                updated_at: now.clone(),
            })
        })
    }

    pub fn get_member_by_username(&self, username: &str) -> Result<Option<MemberRow>> {
        self.with_conn(|conn| query_member(conn, "username", username))
    }

    #[cfg(test)]
    pub(crate) fn get_member_by_id(&self, id: &str) -> Result<Option<MemberRow>> {
        self.with_conn(|conn| query_member(conn, "id", id))
    }

    /// Rename a member and bump `updated_at`. `updated_at` never moves
    /// backwards, even if the wall clock does. Returns `None` if the member
    /// does not exist.
    pub fn update_member_username(&self, id: &str, username: &str) -> Result<Option<MemberRow>> {
        let now = timestamp_now();
        self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE members SET username = ?2, updated_at = MAX(?3, updated_at) WHERE id = ?1",
                    (id, username, &now),
                )
                .map_err(|e| unique_or(e, "members.username"))?;

            if changed == 0 {
                return Ok(None);
            }
            query_member(conn, "id", id)
        })
    }

    // -- Tokens --

    pub fn create_token(&self, key: &str, member_id: &str) -> Result<TokenRow> {
        self.with_conn(|conn| insert_token(conn, key, member_id))
    }

    /// Resolve a token key and its owning member in a single query.
    pub fn get_token_by_key_with_member(&self, key: &str) -> Result<Option<TokenWithMember>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT t.key, t.member_id, t.created_at,
                        m.id, m.username, m.password, m.created_at, m.updated_at
                 FROM auth_tokens t
                 JOIN members m ON m.id = t.member_id
                 WHERE t.key = ?1",
                [key],
                |row| {
                    Ok(TokenWithMember {
                        token: TokenRow {
                            key: row.get(0)?,
                            member_id: row.get(1)?,
                            created_at: row.get(2)?,
                        },
                        member: MemberRow {
                            id: row.get(3)?,
                            username: row.get(4)?,
                            password_hash: row.get(5)?,
                            created_at: row.get(6)?,
                            updated_at: row.get(7)?,
                        },
                    })
                },
            )
            .optional()
        })
    }

    pub fn delete_tokens_for_member(&self, member_id: &str) -> Result<usize> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM auth_tokens WHERE member_id = ?1", [member_id])?))
    }

    /// Returns whether a token was removed. Deleting a missing key is not an error.
    pub fn delete_token(&self, key: &str) -> Result<bool> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM auth_tokens WHERE key = ?1", [key])? > 0))
    }

    /// Drop every token of the member and issue `key` in its place, inside one
    /// transaction, so a member never ends up with more than one live token.
    pub fn rotate_token(&self, member_id: &str, key: &str) -> Result<TokenRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM auth_tokens WHERE member_id = ?1", [member_id])?;
            let token = insert_token(&tx, key, member_id)?;
            tx.commit()?;
            Ok(token)
        })
    }

    #[cfg(test)]
    pub(crate) fn count_tokens_for_member(&self, member_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM auth_tokens WHERE member_id = ?1",
                [member_id],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
    }

    // -- Messages --

    pub fn append_message(&self, id: &str, member_id: &str, text: &str) -> Result<MessageRow> {
        let now = timestamp_now();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, member_id, text, created_at) VALUES (?1, ?2, ?3, ?4)",
                (id, member_id, text, &now),
            )?;

            let member_username: String =
                conn.query_row("SELECT username FROM members WHERE id = ?1", [member_id], |row| {
                    row.get(0)
                })?;

            Ok(MessageRow {
                id: id.to_string(),
                member_id: member_id.to_string(),
                member_username,
                text: text.to_string(),
                created_at: now.clone(),
            })
        })
    }

    /// Full history, oldest first. Same-instant messages keep insertion order.
    pub fn list_messages_ordered_by_time(&self) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            // JOIN members so the username is always the author's current one
            let mut stmt = conn.prepare(
                "SELECT m.id, m.member_id, u.username, m.text, m.created_at
                 FROM messages m
                 JOIN members u ON u.id = m.member_id
                 ORDER BY m.created_at ASC, m.rowid ASC",
            )?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(MessageRow {
                        id: row.get(0)?,
                        member_id: row.get(1)?,
                        member_username: row.get(2)?,
                        text: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

/// Current time as a fixed-width RFC 3339 UTC string with microseconds.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn insert_token(conn: &Connection, key: &str, member_id: &str) -> Result<TokenRow> {
    let now = timestamp_now();
    conn.execute(
        "INSERT INTO auth_tokens (key, member_id, created_at) VALUES (?1, ?2, ?3)",
        (key, member_id, &now),
    )
    .map_err(|e| unique_or(e, "auth_tokens.key"))?;

    Ok(TokenRow {
        key: key.to_string(),
        member_id: member_id.to_string(),
        created_at: now,
    })
}

fn query_member(conn: &Connection, column: &str, value: &str) -> Result<Option<MemberRow>> {
    // `column` is always one of our own literals, never user input
    let sql = format!("SELECT {MEMBER_COLUMNS} FROM members WHERE {column} = ?1");
    conn.query_row(&sql, [value], member_from_row).optional()
}

fn member_from_row(row: &Row<'_>) -> rusqlite::Result<MemberRow> {
    Ok(MemberRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

/// Map UNIQUE / PRIMARY KEY violations to [`UniqueViolation`]; pass anything
/// else through.
fn unique_or(err: rusqlite::Error, constraint: &'static str) -> anyhow::Error {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && (e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY) =>
        {
            UniqueViolation(constraint).into()
        }
        _ => err.into(),
    }
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
