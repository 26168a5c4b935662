use serde_json::Value;

use crate::model::{Message, Post};

/// Converts a raw thread payload into the ordered message sequence plus the
/// distinct author ids it references.
///
/// Display order is the payload's explicit `order` array when present,
/// otherwise the enumeration of the `posts` map; keys without a matching
/// record are dropped. The returned sequence is sorted ascending by
/// `create_at` with a stable tie-break on the incoming order.
pub fn normalize_thread(raw: &Value) -> (Vec<Message>, Vec<String>) {
    let Some(posts) = raw.get("posts").and_then(Value::as_object) else {
        return (Vec::new(), Vec::new());
    };

    let order: Vec<&str> = match raw.get("order").and_then(Value::as_array) {
        Some(order) => order.iter().filter_map(Value::as_str).collect(),
        None => posts.keys().map(String::as_str).collect(),
    };

    let mut messages: Vec<Message> = order
        .iter()
        .filter_map(|id| posts.get(*id))
        .filter_map(|value| serde_json::from_value::<Post>(value.clone()).ok())
        .map(|post| {
            let root_id = post
                .root_id
                .filter(|root| !root.is_empty())
                .unwrap_or_else(|| post.id.clone());
            Message {
                root_id,
                id: post.id,
                user_id: post.user_id,
                message: post.message.unwrap_or_default(),
                create_at: post.create_at.unwrap_or(0),
                kind: post.kind.unwrap_or_default(),
            }
        })
        .collect();
    messages.sort_by_key(|message| message.create_at);

    let mut user_ids: Vec<String> = Vec::new();
    for message in &messages {
        if !message.user_id.is_empty() && !user_ids.iter().any(|id| id == &message.user_id) {
            user_ids.push(message.user_id.clone());
        }
    }

    (messages, user_ids)
}
