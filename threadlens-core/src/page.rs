use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ident::PostId;

/// Maximum number of ancestor levels the click-to-pick walk inspects.
pub const PICK_MAX_DEPTH: usize = 10;

/// Dom-id prefixes that mark the secondary reading pane as open.
const PANE_ID_PREFIXES: &[&str] = &["rhsPostMessageText_", "rhsRootPost_"];
const PANE_CLASS: &str = "SidebarRight";

const PICK_ATTRS: &[&str] = &["data-testid", "aria-labelledby"];

static PERMALINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/pl/([a-z0-9]{26})").expect("valid regex"));

/// A pure snapshot of the hosting page: its URL plus the element facts the
/// resolver inspects. Hosts build one from the live DOM; tests build literals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageSnapshot {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub nodes: Vec<PageNode>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageNode {
    #[serde(default)]
    pub dom_id: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub attrs: Vec<(String, String)>,
}

impl PageNode {
    pub fn new(dom_id: impl Into<String>) -> Self {
        Self {
            dom_id: dom_id.into(),
            ..Self::default()
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// Determines the root post id from the page, URL signals first, DOM second.
/// Returns `None` when neither yields a valid id; callers route that to the
/// interactive fallback instead of guessing.
pub fn resolve_root_id(page: &PageSnapshot) -> Option<PostId> {
    root_id_from_url(&page.url).or_else(|| {
        if reading_pane_open(page) {
            root_id_from_nodes(&page.nodes)
        } else {
            None
        }
    })
}

/// URL route shapes: the segment after a `pl`, `thread`, or `posts` marker
/// (also when nested under `_redirect`), else a `postId` query parameter.
pub fn root_id_from_url(url: &str) -> Option<PostId> {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let rest = rest.split_once('#').map_or(rest, |(before, _)| before);
    let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
    let path = if url.contains("://") {
        path.split_once('/').map_or("", |(_, path)| path)
    } else {
        path
    };

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let next_after = |marker: &str| {
        segments
            .iter()
            .position(|segment| *segment == marker)
            .and_then(|at| segments.get(at + 1))
            .copied()
    };

    let candidate = next_after("pl")
        .or_else(|| next_after("thread"))
        .or_else(|| next_after("posts"))
        .or_else(|| query_param(query, "postId"))?;

    PostId::parse(candidate).ok()
}

fn query_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// The reading-pane gate: a DOM scan is only trusted while the secondary
/// panel is open, otherwise an arbitrary feed post could hijack the fetch.
pub fn reading_pane_open(page: &PageSnapshot) -> bool {
    page.nodes.iter().any(|node| {
        PANE_ID_PREFIXES
            .iter()
            .any(|prefix| node.dom_id.starts_with(prefix))
            || node.has_class(PANE_CLASS)
    })
}

/// Prioritized dom-id scan, reading-pane patterns before the center column,
/// then a `/pl/` permalink anchor as the last resort.
pub fn root_id_from_nodes(nodes: &[PageNode]) -> Option<PostId> {
    let scans: &[(&str, bool)] = &[
        ("rhsPostMessageText_", false),
        ("rhsRootPost_", false),
        ("post_", true),
        ("postMessageText_", false),
        ("postContent_", false),
        ("post_", false),
    ];

    for (prefix, pane_only) in scans {
        let found = nodes
            .iter()
            .filter(|node| !pane_only || node.has_class(PANE_CLASS))
            .filter(|node| node.dom_id.starts_with(prefix))
            .find_map(|node| {
                PostId::extract(&node.dom_id)
                    .or_else(|| node.attr("data-testid").and_then(PostId::extract))
            });
        if found.is_some() {
            return found;
        }
    }

    nodes
        .iter()
        .filter_map(|node| node.attr("href"))
        .find_map(|href| {
            PERMALINK_RE
                .captures(href)
                .and_then(|caps| caps.get(1))
                .and_then(|m| PostId::parse(m.as_str()).ok())
        })
}

/// Click-to-pick: walk the clicked element's ancestor chain, nearest first,
/// probing element ids and the known identifier-bearing attributes.
pub fn root_id_from_click(ancestors: &[PageNode]) -> Option<PostId> {
    for node in ancestors.iter().take(PICK_MAX_DEPTH) {
        if let Some(id) = PostId::extract(&node.dom_id) {
            return Some(id);
        }
        for attr in PICK_ATTRS {
            if let Some(id) = node.attr(attr).and_then(PostId::extract) {
                return Some(id);
            }
        }
    }
    None
}
