use chrono::{Local, LocalResult, TimeZone, Utc};
use serde_json::Value;

use crate::error::{LensError, Result};
use crate::model::{AiMessage, Message, ProfileMap, UserRecord};

const UNKNOWN_NAME: &str = "Unknown";

/// Human-readable name for a user record. Never empty: the precedence runs
/// nickname, username, "first last", the first 8 characters of the id, and a
/// fixed literal for a wholly absent record. Username deliberately outranks
/// the real name.
pub fn display_name(user: Option<&UserRecord>) -> String {
    let Some(user) = user else {
        return UNKNOWN_NAME.to_string();
    };
    if let Some(nickname) = trimmed(user.nickname.as_deref()) {
        return nickname;
    }
    if let Some(username) = trimmed(user.username.as_deref()) {
        return username;
    }
    let first = user.first_name.as_deref().unwrap_or("").trim();
    let last = user.last_name.as_deref().unwrap_or("").trim();
    let full = format!("{first} {last}").trim().to_string();
    if !full.is_empty() {
        return full;
    }
    if !user.id.is_empty() {
        return user.id.chars().take(8).collect();
    }
    UNKNOWN_NAME.to_string()
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Local-time stamp for the transcript view.
pub fn fmt_local(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis) {
        LocalResult::Single(at) | LocalResult::Ambiguous(at, _) => {
            at.format("%Y-%m-%d %H:%M:%S").to_string()
        }
        LocalResult::None => millis.to_string(),
    }
}

/// Fixed UTC stamp for the structured projection.
pub fn fmt_utc(millis: i64) -> String {
    match Utc.timestamp_millis_opt(millis) {
        LocalResult::Single(at) => at.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string(),
        _ => millis.to_string(),
    }
}

/// Markdown transcript: one title+body block per message.
pub fn transcript(messages: &[Message], profiles: &ProfileMap) -> String {
    if messages.is_empty() {
        return "_No messages._\n".to_string();
    }
    let blocks: Vec<String> = messages
        .iter()
        .map(|message| {
            let name = display_name(profiles.get(&message.user_id));
            format!(
                "### {name} — {}\n{}\n",
                fmt_local(message.create_at),
                message.message
            )
        })
        .collect();
    blocks.join("\n")
}

/// The raw payload, pretty-printed verbatim; `{}` when nothing is loaded.
pub fn raw_json(raw: Option<&Value>) -> String {
    raw.map_or_else(
        || "{}".to_string(),
        |value| serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string()),
    )
}

/// The structured projection rows, in display order.
pub fn ai_messages(messages: &[Message], profiles: &ProfileMap) -> Vec<AiMessage> {
    messages
        .iter()
        .map(|message| AiMessage {
            username: display_name(profiles.get(&message.user_id)),
            ts: fmt_utc(message.create_at),
            message: message.message.clone(),
            post_id: message.id.clone(),
        })
        .collect()
}

pub fn structured_json(messages: &[Message], profiles: &ProfileMap) -> Result<String> {
    serde_json::to_string_pretty(&ai_messages(messages, profiles))
        .map_err(LensError::Serialization)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{ai_messages, display_name, fmt_utc, raw_json, structured_json, transcript};
    use crate::model::{AiMessage, Message, ProfileMap, UserRecord};

    fn user(
        nickname: Option<&str>,
        username: Option<&str>,
        first: Option<&str>,
        last: Option<&str>,
    ) -> UserRecord {
        UserRecord {
            id: "abcdefghij1234567890klmnop".to_string(),
            nickname: nickname.map(str::to_string),
            username: username.map(str::to_string),
            first_name: first.map(str::to_string),
            last_name: last.map(str::to_string),
        }
    }

    fn message(id: &str, user_id: &str, text: &str, at: i64) -> Message {
        Message {
            id: id.to_string(),
            user_id: user_id.to_string(),
            message: text.to_string(),
            create_at: at,
            root_id: id.to_string(),
            kind: String::new(),
        }
    }

    #[test]
    fn name_precedence_nickname_first() {
        let record = user(Some("N"), Some("U"), Some("F"), Some("L"));
        assert_eq!(display_name(Some(&record)), "N");
    }

    #[test]
    fn name_precedence_username_over_full_name() {
        let record = user(None, Some("U"), Some("F"), Some("L"));
        assert_eq!(display_name(Some(&record)), "U");
    }

    #[test]
    fn name_precedence_full_name() {
        let record = user(None, None, Some("F"), Some("L"));
        assert_eq!(display_name(Some(&record)), "F L");

        let only_first = user(None, None, Some(" F "), None);
        assert_eq!(display_name(Some(&only_first)), "F");
    }

    #[test]
    fn name_falls_back_to_short_id() {
        let record = user(None, None, None, None);
        assert_eq!(display_name(Some(&record)), "abcdefgh");
    }

    #[test]
    fn blank_fields_do_not_win() {
        let record = user(Some("   "), Some("handle"), None, None);
        assert_eq!(display_name(Some(&record)), "handle");
    }

    #[test]
    fn absent_record_yields_fixed_literal() {
        assert_eq!(display_name(None), "Unknown");
    }

    #[test]
    fn utc_stamp_has_fixed_shape() {
        assert_eq!(fmt_utc(1000), "1970-01-01 00:00:01.000 UTC");
        assert_eq!(fmt_utc(1_683_000_000_123), "2023-05-02 04:00:00.123 UTC");
    }

    #[test]
    fn out_of_range_stamp_degrades_to_number() {
        assert_eq!(fmt_utc(i64::MAX), i64::MAX.to_string());
    }

    #[test]
    fn transcript_block_per_message() {
        let messages = vec![
            message("p1", "u1", "First", 1000),
            message("p2", "u2", "Second", 2000),
        ];
        let mut profiles = ProfileMap::new();
        profiles.insert(
            "u1".to_string(),
            user(None, Some("alice"), None, None),
        );

        let text = transcript(&messages, &profiles);
        assert!(text.starts_with("### alice — "));
        assert!(text.contains("First\n"));
        assert!(text.contains("### Unknown — "));
        assert!(text.contains("Second\n"));
    }

    #[test]
    fn transcript_of_nothing_is_a_notice() {
        assert_eq!(transcript(&[], &ProfileMap::new()), "_No messages._\n");
    }

    #[test]
    fn raw_json_defaults_to_empty_object() {
        assert_eq!(raw_json(None), "{}");
        let value = json!({"posts": {}});
        assert!(raw_json(Some(&value)).contains("\"posts\""));
    }

    #[test]
    fn structured_rows_round_trip() {
        let messages = vec![message("p1", "u1", "hello", 1000)];
        let mut profiles = ProfileMap::new();
        profiles.insert("u1".to_string(), user(None, Some("alice"), None, None));

        let rendered = structured_json(&messages, &profiles).expect("serialize");
        let parsed: Vec<AiMessage> = serde_json::from_str(&rendered).expect("parse back");
        assert_eq!(
            parsed,
            vec![AiMessage {
                username: "alice".to_string(),
                ts: "1970-01-01 00:00:01.000 UTC".to_string(),
                message: "hello".to_string(),
                post_id: "p1".to_string(),
            }]
        );
    }

    #[test]
    fn structured_rows_follow_display_order() {
        let messages = vec![
            message("p1", "u1", "one", 1000),
            message("p2", "u1", "two", 2000),
        ];
        let rows = ai_messages(&messages, &ProfileMap::new());
        assert_eq!(rows[0].post_id, "p1");
        assert_eq!(rows[1].post_id, "p2");
    }
}
