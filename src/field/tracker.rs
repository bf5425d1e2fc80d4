use std::time::{Duration, Instant};

use tracing::debug;

use crate::dom::document::{Document, NodeId};
use crate::dom::events::{DomEvent, EventKind};
use crate::field::classifier::is_editable;
use crate::field::tagger::ElementFilter;

pub const DEFAULT_GRACE_DELAY: Duration = Duration::from_millis(200);

/// How many ancestors above an event target are inspected. Clicks often land
/// on decorative children of the real field.
pub const ANCESTOR_SEARCH_DEPTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    Tracking(NodeId),
}

/// Remembers the text field the user is working in.
///
/// A blur does not clear the field right away: the clear is scheduled
/// `grace` later so that a click on the rewrite control, which itself blurs
/// the field, still finds it. Any focus or click on a field before the
/// deadline cancels the pending clear.
///
/// The tracker holds a bare [`NodeId`]; callers must check
/// [`Document::is_connected`] before acting on it (see [`Self::current_live`]).
#[derive(Debug, Clone)]
pub struct ActiveFieldTracker {
    state: TrackerState,
    clear_at: Option<Instant>,
    grace: Duration,
    filter: ElementFilter,
}

impl ActiveFieldTracker {
    pub fn new(grace: Duration, filter: ElementFilter) -> Self {
        Self {
            state: TrackerState::Idle,
            clear_at: None,
            grace,
            filter,
        }
    }

    /// State as of the last event, without applying an expired clear.
    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn has_pending_clear(&self) -> bool {
        self.clear_at.is_some()
    }

    pub fn handle_event(&mut self, doc: &Document, event: &DomEvent, now: Instant) {
        self.tick(now);

        match &event.kind {
            EventKind::Focus | EventKind::Click | EventKind::ContextMenu => {
                if let Some(field) = self.find_field(doc, event.target) {
                    if self.state != TrackerState::Tracking(field) {
                        debug!(node = field.index(), "tracking field");
                    }
                    self.state = TrackerState::Tracking(field);
                    self.clear_at = None;
                }
            }
            EventKind::Blur => {
                if self.state == TrackerState::Tracking(event.target) {
                    self.clear_at = Some(now + self.grace);
                }
            }
            EventKind::KeyDown(_) => {}
        }
    }

    /// Applies a pending clear whose deadline has passed.
    pub fn tick(&mut self, now: Instant) {
        if let Some(deadline) = self.clear_at {
            if now >= deadline {
                debug!("grace delay elapsed, clearing tracked field");
                self.state = TrackerState::Idle;
                self.clear_at = None;
            }
        }
    }

    pub fn current(&mut self, now: Instant) -> Option<NodeId> {
        self.tick(now);
        match self.state {
            TrackerState::Tracking(node) => Some(node),
            TrackerState::Idle => None,
        }
    }

    /// Tracked field, only if it is still attached to the document.
    pub fn current_live(&mut self, doc: &Document, now: Instant) -> Option<NodeId> {
        self.current(now).filter(|n| doc.is_connected(*n))
    }

    pub fn clear(&mut self) {
        self.state = TrackerState::Idle;
        self.clear_at = None;
    }

    fn find_field(&self, doc: &Document, target: NodeId) -> Option<NodeId> {
        let mut node = target;
        for depth in 0..=ANCESTOR_SEARCH_DEPTH {
            if is_editable(doc, node) && self.filter.should_process(doc, node) {
                return Some(node);
            }
            if depth == ANCESTOR_SEARCH_DEPTH {
                break;
            }
            node = doc.parent_element(node)?;
        }
        None
    }
}

impl Default for ActiveFieldTracker {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_DELAY, ElementFilter::default())
    }
}
