//! Row-to-view conversions. Stored ids and timestamps are written by us, so a
//! value that fails to parse is logged and replaced rather than failing the
//! whole request.

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use huddle_db::models::{MemberRow, MessageRow};
use huddle_types::models::{ChatMessage, Member};

pub fn member_view(row: &MemberRow) -> Member {
    Member {
        id: parse_id(&row.id, "member"),
        username: row.username.clone(),
        created_at: parse_timestamp(&row.created_at, "created_at", &row.id),
        updated_at: parse_timestamp(&row.updated_at, "updated_at", &row.id),
    }
}

pub fn message_view(row: MessageRow) -> ChatMessage {
    ChatMessage {
        id: parse_id(&row.id, "message"),
        created_at: parse_timestamp(&row.created_at, "created_at", &row.id),
        member_username: row.member_username,
        text: row.text,
    }
}

fn parse_id(raw: &str, kind: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", kind, raw, e);
        Uuid::default()
    })
}

fn parse_timestamp(raw: &str, column: &str, owner: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            warn!("Corrupt {} '{}' on '{}': {}", column, raw, owner, e);
            DateTime::default()
        })
}
