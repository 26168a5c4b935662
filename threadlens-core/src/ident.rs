use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{LensError, Result};

static POST_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z0-9]{26}$").expect("valid regex"));
static EMBEDDED_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[a-z0-9]{26}").expect("valid regex"));

/// Identifier of a root post. Valid iff it is exactly 26 alphanumerics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct PostId(String);

impl PostId {
    pub fn parse(input: &str) -> Result<Self> {
        if POST_ID_RE.is_match(input) {
            Ok(Self(input.to_string()))
        } else {
            Err(LensError::InvalidPostId(input.to_string()))
        }
    }

    /// First 26-char alphanumeric run embedded in arbitrary text, such as a
    /// pasted permalink or a DOM element id.
    pub fn extract(input: &str) -> Option<Self> {
        EMBEDDED_ID_RE
            .find(input)
            .map(|m| Self(m.as_str().to_string()))
    }

    /// Manual-entry path: free text must contain an embedded id somewhere,
    /// otherwise the input is rejected before any network call.
    pub fn from_user_input(input: &str) -> Result<Self> {
        Self::extract(input).ok_or_else(|| LensError::NoPostId(input.trim().to_string()))
    }

    pub fn is_match(input: &str) -> bool {
        POST_ID_RE.is_match(input)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 characters, used for degraded display and placeholder profiles.
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PostId {
    type Err = LensError;

    fn from_str(input: &str) -> Result<Self> {
        Self::parse(input)
    }
}

impl TryFrom<String> for PostId {
    type Error = LensError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}
