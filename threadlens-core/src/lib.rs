pub mod client;
pub mod config;
pub mod error;
pub mod ident;
pub mod model;
pub mod normalize;
pub mod page;
pub mod render;
pub mod session;

pub use client::ThreadClient;
pub use config::{DEFAULT_CONCURRENCY, DEFAULT_PER_PAGE, HostConfig};
pub use error::{LensError, Result};
pub use ident::PostId;
pub use model::{AiMessage, ExportPayload, Message, Post, ProfileMap, Projection, UserRecord};
pub use normalize::normalize_thread;
pub use page::{
    PageNode, PageSnapshot, resolve_root_id, root_id_from_click, root_id_from_url,
};
pub use render::{ai_messages, display_name, fmt_local, fmt_utc, raw_json, structured_json, transcript};
pub use session::{Phase, PickEvent, PickOutcome, RefreshData, Session};
