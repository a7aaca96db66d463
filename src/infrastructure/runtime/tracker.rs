//! Conversation list state owned by the sync worker
//!
//! The last server snapshot is kept as-is. Optimistic changes (mark read,
//! sent message) live in a pending overlay keyed by request id and are
//! applied on top of the snapshot until the server confirms or rejects
//! them. The unread aggregate is always computed from the merged view.

use std::collections::BTreeMap;

use crate::domain::{unread_total, ConversationSummary, LastMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Loading,
    Ready,
    Error,
}

impl SyncState {
    pub fn label(&self) -> &'static str {
        match self {
            SyncState::Idle => "idle",
            SyncState::Loading => "syncing",
            SyncState::Ready => "synced",
            SyncState::Error => "offline",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingOp {
    MarkRead { conversation_id: String },
    Send {
        conversation_id: String,
        message: LastMessage,
    },
}

impl PendingOp {
    fn apply(&self, conversations: &mut [ConversationSummary]) {
        match self {
            PendingOp::MarkRead { conversation_id } => {
                if let Some(c) = find_mut(conversations, conversation_id) {
                    c.unread_count = 0;
                }
            }
            PendingOp::Send {
                conversation_id,
                message,
            } => {
                if let Some(c) = find_mut(conversations, conversation_id) {
                    c.last_message = Some(message.clone());
                }
            }
        }
    }
}

/// Aggregate before and after a change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnreadChange {
    pub previous: u32,
    pub current: u32,
}

impl UnreadChange {
    /// True when new unread messages appeared
    pub fn increased(&self) -> bool {
        self.current > self.previous && self.current > 0
    }
}

#[derive(Debug)]
pub struct UnreadTracker {
    state: SyncState,
    snapshot: Vec<ConversationSummary>,
    pending: BTreeMap<RequestId, PendingOp>,
    next_request: u64,
    view: Vec<ConversationSummary>,
    unread: u32,
    last_error: Option<String>,
}

impl Default for UnreadTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl UnreadTracker {
    pub fn new() -> Self {
        Self {
            state: SyncState::Idle,
            snapshot: Vec::new(),
            pending: BTreeMap::new(),
            next_request: 0,
            view: Vec::new(),
            unread: 0,
            last_error: None,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn unread(&self) -> u32 {
        self.unread
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Snapshot with pending overlays applied
    pub fn conversations(&self) -> &[ConversationSummary] {
        &self.view
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn begin_fetch(&mut self) {
        self.state = SyncState::Loading;
    }

    /// Replace the snapshot wholesale with a server response
    pub fn apply_snapshot(&mut self, conversations: Vec<ConversationSummary>) -> UnreadChange {
        self.snapshot = conversations;
        self.state = SyncState::Ready;
        self.last_error = None;
        self.rebuild()
    }

    /// Record a failed fetch; the previous view and aggregate stay
    pub fn apply_failure(&mut self, message: impl Into<String>) {
        self.state = SyncState::Error;
        self.last_error = Some(message.into());
    }

    /// Zero a conversation locally until the server confirms
    pub fn begin_mark_read(&mut self, conversation_id: &str) -> (RequestId, UnreadChange) {
        self.push(PendingOp::MarkRead {
            conversation_id: conversation_id.to_string(),
        })
    }

    /// Show a sent message as the conversation preview until confirmed
    pub fn begin_send(
        &mut self,
        conversation_id: &str,
        message: LastMessage,
    ) -> (RequestId, UnreadChange) {
        self.push(PendingOp::Send {
            conversation_id: conversation_id.to_string(),
            message,
        })
    }

    /// Fold a confirmed operation into the snapshot. For sends, the server's
    /// copy of the message replaces the optimistic one.
    pub fn confirm(&mut self, request: RequestId, confirmed: Option<LastMessage>) -> UnreadChange {
        if let Some(mut op) = self.pending.remove(&request) {
            if let (PendingOp::Send { message, .. }, Some(server)) = (&mut op, confirmed) {
                *message = server;
            }
            op.apply(&mut self.snapshot);
        }
        self.rebuild()
    }

    /// Drop an operation the server rejected
    pub fn rollback(&mut self, request: RequestId) -> UnreadChange {
        self.pending.remove(&request);
        self.rebuild()
    }

    fn push(&mut self, op: PendingOp) -> (RequestId, UnreadChange) {
        self.next_request += 1;
        let id = RequestId(self.next_request);
        self.pending.insert(id, op);
        (id, self.rebuild())
    }

    fn rebuild(&mut self) -> UnreadChange {
        let mut view = self.snapshot.clone();
        for op in self.pending.values() {
            op.apply(&mut view);
        }
        let previous = self.unread;
        self.unread = unread_total(&view);
        self.view = view;
        UnreadChange {
            previous,
            current: self.unread,
        }
    }
}

fn find_mut<'a>(
    conversations: &'a mut [ConversationSummary],
    id: &str,
) -> Option<&'a mut ConversationSummary> {
    conversations.iter_mut().find(|c| c.id == id)
}
