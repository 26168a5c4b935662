use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::client::ThreadClient;
use crate::error::Result;
use crate::ident::PostId;
use crate::model::{ExportPayload, Message, ProfileMap, Projection};
use crate::normalize::normalize_thread;
use crate::page::{PageNode, root_id_from_click};
use crate::render;

/// Sub-state of the panel: nothing loaded yet, last refresh good, or last
/// refresh failed (with the previous good data retained underneath).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Empty,
    Ready,
    Error(String),
}

/// Events the click-to-pick overlay forwards into the session.
#[derive(Debug, Clone)]
pub enum PickEvent {
    /// The intercepted click, as the clicked element's ancestor chain,
    /// nearest element first.
    Click(Vec<PageNode>),
    Escape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    Found(PostId),
    Miss,
    Cancelled,
    Inactive,
}

/// The product of one refresh, applied to the session atomically.
#[derive(Debug, Clone)]
pub struct RefreshData {
    pub root: PostId,
    pub raw: Value,
    pub messages: Vec<Message>,
    pub profiles: ProfileMap,
}

/// Single source of truth for one panel: the raw payload, its normalized
/// messages, the resolved profiles, and the active projection. Owned by the
/// panel instance; all three projections derive from it on demand.
#[derive(Debug, Default)]
pub struct Session {
    raw: Option<Value>,
    messages: Vec<Message>,
    profiles: ProfileMap,
    active: Projection,
    phase: Phase,
    busy: bool,
    generation: u64,
    root_id: Option<PostId>,
    pick_armed: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Projection {
        self.active
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn root_id(&self) -> Option<&PostId> {
        self.root_id.as_ref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn profiles(&self) -> &ProfileMap {
        &self.profiles
    }

    pub fn raw(&self) -> Option<&Value> {
        self.raw.as_ref()
    }

    /// Pure projection switch; no I/O, nothing re-fetched.
    pub fn switch_projection(&mut self, projection: Projection) {
        self.active = projection;
    }

    /// Stamps a new refresh generation and raises the busy indicator. The
    /// returned generation must be handed back to `complete_refresh`; a later
    /// `begin_refresh` supersedes it.
    pub fn begin_refresh(&mut self) -> u64 {
        self.generation += 1;
        self.busy = true;
        self.generation
    }

    /// Applies the outcome of the refresh stamped `generation`. Outcomes of
    /// superseded generations are discarded wholesale, success and failure
    /// alike, and leave the busy indicator to the newer refresh. Success
    /// replaces the payload, messages and profiles atomically; failure only
    /// records the error and keeps prior good data.
    pub fn complete_refresh(
        &mut self,
        generation: u64,
        outcome: std::result::Result<RefreshData, String>,
    ) -> bool {
        if generation != self.generation {
            debug!(generation, current = self.generation, "discarding stale refresh result");
            return false;
        }
        self.busy = false;
        match outcome {
            Ok(data) => {
                self.root_id = Some(data.root);
                self.raw = Some(data.raw);
                self.messages = data.messages;
                self.profiles = data.profiles;
                self.phase = Phase::Ready;
            }
            Err(message) => {
                self.phase = Phase::Error(message);
            }
        }
        true
    }

    /// Full refresh cycle: fetch the thread, normalize it, enrich with
    /// profiles, apply. The session always ends up in a presentable state;
    /// the returned error is the same one recorded in the error phase, for
    /// hosts that want to surface it out-of-band.
    pub async fn refresh(
        &mut self,
        client: &ThreadClient,
        root: PostId,
        per_page: u32,
        concurrency: usize,
    ) -> Result<()> {
        let generation = self.begin_refresh();
        match load(client, root, per_page, concurrency).await {
            Ok(data) => {
                self.complete_refresh(generation, Ok(data));
                Ok(())
            }
            Err(err) => {
                self.complete_refresh(generation, Err(err.to_string()));
                Err(err)
            }
        }
    }

    /// Text of the active projection, or the empty/error notice.
    pub fn view_current(&self) -> String {
        match &self.phase {
            Phase::Empty => "No data yet. Run a refresh.".to_string(),
            Phase::Error(message) => format!("Failed to load thread: {message}"),
            Phase::Ready => match self.active {
                Projection::Transcript => render::transcript(&self.messages, &self.profiles),
                Projection::Raw => render::raw_json(self.raw.as_ref()),
                Projection::Structured => {
                    render::structured_json(&self.messages, &self.profiles)
                        .unwrap_or_else(|_| "[]".to_string())
                }
            },
        }
    }

    /// The export for the active projection, derived from the current state.
    /// Works off the last good data even while the error phase is showing.
    pub fn export_current(&self) -> Result<ExportPayload> {
        self.export_at(Utc::now())
    }

    pub fn copy_current(&self) -> Result<String> {
        Ok(self.export_current()?.content)
    }

    fn export_at(&self, now: DateTime<Utc>) -> Result<ExportPayload> {
        let root = self.root_id.as_ref().map_or("thread", PostId::as_str);
        let stamp = export_stamp(now);
        let payload = match self.active {
            Projection::Transcript => ExportPayload {
                filename: format!("mm-thread_{root}_{stamp}.md"),
                mime_type: "text/markdown".to_string(),
                content: render::transcript(&self.messages, &self.profiles),
            },
            Projection::Raw => ExportPayload {
                filename: format!("mm-thread_{root}_{stamp}_raw.json"),
                mime_type: "application/json".to_string(),
                content: render::raw_json(self.raw.as_ref()),
            },
            Projection::Structured => ExportPayload {
                filename: format!("mm-thread_{root}_{stamp}_ai.json"),
                mime_type: "application/json".to_string(),
                content: render::structured_json(&self.messages, &self.profiles)?,
            },
        };
        Ok(payload)
    }

    /// Arms click-to-pick. The next pick event, click or escape, disarms it
    /// again; a miss requires explicit re-arming.
    pub fn enter_pick_mode(&mut self) {
        self.pick_armed = true;
    }

    pub fn pick_armed(&self) -> bool {
        self.pick_armed
    }

    pub fn pick_event(&mut self, event: PickEvent) -> PickOutcome {
        if !self.pick_armed {
            return PickOutcome::Inactive;
        }
        self.pick_armed = false;
        match event {
            PickEvent::Escape => PickOutcome::Cancelled,
            PickEvent::Click(ancestors) => match root_id_from_click(&ancestors) {
                Some(id) => PickOutcome::Found(id),
                None => PickOutcome::Miss,
            },
        }
    }
}

async fn load(
    client: &ThreadClient,
    root: PostId,
    per_page: u32,
    concurrency: usize,
) -> Result<RefreshData> {
    let raw = client.get_thread(&root, per_page).await?;
    let (messages, user_ids) = normalize_thread(&raw);
    let profiles = client.fetch_profiles(&user_ids, concurrency).await;
    Ok(RefreshData {
        root,
        raw,
        messages,
        profiles,
    })
}

fn export_stamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H-%M-%S-%3fZ").to_string()
}
