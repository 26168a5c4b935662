use futures::StreamExt;
use futures::stream;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{LensError, Result};
use crate::ident::PostId;
use crate::model::{Post, ProfileMap, UserRecord};

/// Client for the thread and profile endpoints of the hosting server.
#[derive(Clone, Debug)]
pub struct ThreadClient {
    base_url: String,
    http: reqwest::Client,
    token: Option<String>,
}

impl ThreadClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        if base_url.is_empty() {
            return Err(LensError::InvalidBaseUrl(base_url));
        }
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            base_url,
            http,
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &self.token
            && let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}"))
        {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let url = format!("{}{path}", self.base_url);
        let response = self.http.get(&url).headers(self.headers()).send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(LensError::Api {
                status: status.as_u16(),
                message: api_message(status.as_u16(), &body),
            });
        }
        serde_json::from_str(&body).map_err(LensError::Decode)
    }

    /// Fetches the full thread of a root post as the raw payload.
    pub async fn get_thread(&self, root: &PostId, per_page: u32) -> Result<Value> {
        debug!(root = %root, per_page, "fetching thread");
        self.get_json(&format!("/api/v4/posts/{root}/thread?per_page={per_page}"))
            .await
    }

    pub async fn get_post(&self, id: &PostId) -> Result<Post> {
        let value = self.get_json(&format!("/api/v4/posts/{id}")).await?;
        serde_json::from_value(value).map_err(LensError::Decode)
    }

    /// Promotes any post id to the id of its thread root: a reply carries a
    /// `root_id`, a root is its own root. Lookup failures fall back to the
    /// given id instead of failing the refresh.
    pub async fn ensure_root_id(&self, id: PostId) -> PostId {
        match self.get_post(&id).await {
            Ok(post) => {
                let promoted = post
                    .root_id
                    .filter(|root| !root.is_empty())
                    .unwrap_or(post.id);
                PostId::parse(&promoted).unwrap_or(id)
            }
            Err(err) => {
                warn!(id = %id, "root id lookup failed, using id as-is: {err}");
                id
            }
        }
    }

    pub async fn get_user(&self, id: &str) -> Result<UserRecord> {
        let value = self.get_json(&format!("/api/v4/users/{id}")).await?;
        serde_json::from_value(value).map_err(LensError::Decode)
    }

    /// Fetches the given user profiles with at most `concurrency` requests in
    /// flight; pending ids are dispatched as slots free up. A failed fetch
    /// resolves to a placeholder record, so the returned map always carries
    /// exactly one entry per distinct input id.
    pub async fn fetch_profiles(&self, ids: &[String], concurrency: usize) -> ProfileMap {
        let mut uniq: Vec<&str> = Vec::new();
        for id in ids {
            if !id.is_empty() && !uniq.contains(&id.as_str()) {
                uniq.push(id);
            }
        }

        drain_bounded(
            uniq.into_iter().map(|id| self.profile_or_placeholder(id)),
            concurrency,
        )
        .await
        .into_iter()
        .collect()
    }

    async fn profile_or_placeholder(&self, id: &str) -> (String, UserRecord) {
        match self.get_user(id).await {
            Ok(user) => (id.to_string(), user),
            Err(err) => {
                warn!(user_id = %id, "profile fetch failed, substituting placeholder: {err}");
                (id.to_string(), UserRecord::placeholder(id))
            }
        }
    }
}

/// Runs the given futures with at most `bound` of them in flight at once and
/// collects every result; nothing resolves until all of them have settled.
async fn drain_bounded<T, Fut>(futures: impl IntoIterator<Item = Fut>, bound: usize) -> Vec<T>
where
    Fut: Future<Output = T>,
{
    stream::iter(futures)
        .buffer_unordered(bound.max(1))
        .collect()
        .await
}

fn api_message(status: u16, body: &str) -> String {
    let from_body = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        ["message", "error"].iter().find_map(|key| {
            value
                .get(key)
                .and_then(Value::as_str)
                .filter(|text| !text.is_empty())
                .map(str::to_string)
        })
    });
    from_body.unwrap_or_else(|| {
        if body.trim().is_empty() {
            format!("HTTP {status}")
        } else {
            body.trim().to_string()
        }
    })
}
