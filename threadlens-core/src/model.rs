use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LensError;

/// One post record as the thread endpoint returns it. Everything except the id
/// is optional; normalization supplies the defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub create_at: Option<i64>,
    #[serde(default)]
    pub root_id: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Normalized message. The sequence handed out by `normalize_thread` is always
/// sorted ascending by `create_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub user_id: String,
    pub message: String,
    pub create_at: i64,
    pub root_id: String,
    pub kind: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct UserRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl UserRecord {
    /// Degraded stand-in for a profile that could not be fetched, derived from
    /// the identifier alone.
    pub fn placeholder(id: &str) -> Self {
        Self {
            id: id.to_string(),
            username: Some(id.chars().take(8).collect()),
            ..Self::default()
        }
    }
}

pub type ProfileMap = HashMap<String, UserRecord>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    Transcript,
    Raw,
    Structured,
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transcript => write!(f, "transcript"),
            Self::Raw => write!(f, "raw"),
            Self::Structured => write!(f, "structured"),
        }
    }
}

impl FromStr for Projection {
    type Err = LensError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "transcript" | "thread" => Ok(Self::Transcript),
            "raw" => Ok(Self::Raw),
            "structured" | "ai" => Ok(Self::Structured),
            other => Err(LensError::InvalidProjection(other.to_string())),
        }
    }
}

/// One entry of the structured projection, shaped for machine consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiMessage {
    pub username: String,
    pub ts: String,
    pub message: String,
    pub post_id: String,
}

/// A generated export: self-describing, nothing persisted by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
    pub filename: String,
    pub mime_type: String,
    pub content: String,
}
