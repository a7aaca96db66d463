//! Runtime bridge - connects the sync TUI thread with the async sync worker
//!
//! Commands go to the worker over an unbounded Tokio channel (usable from
//! synchronous code); events come back over a std channel that the UI
//! drains once per frame.

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;

use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tracing::error;

use crate::core::{EventBus, SignalKind, Subscription};
use crate::domain::{ConversationSummary, Message, NewOffer, Offer};
use crate::infrastructure::api::MarketplaceApi;
use crate::infrastructure::runtime::scheduler::Trigger;
use crate::infrastructure::runtime::tracker::SyncState;
use crate::infrastructure::runtime::worker::{run_async_worker, SyncSettings};

/// Commands sent from the TUI to the async worker
#[derive(Debug, Clone)]
pub enum RuntimeCommand {
    /// Ask for a debounced conversation refresh
    Trigger(Trigger),
    /// Mark a conversation read (optimistic)
    MarkRead { conversation_id: String },
    /// Send a chat message (optimistic)
    SendMessage {
        conversation_id: String,
        content: String,
    },
    /// Follow a conversation's messages on every poll, or stop with `None`
    WatchConversation { conversation_id: Option<String> },
    /// Fetch a conversation's messages now
    LoadMessages { conversation_id: String },
    /// Load offers, from cache unless `force`
    LoadOffers { force: bool },
    /// Publish a new offer
    CreateOffer { offer: NewOffer },
    /// Shutdown the worker
    Shutdown,
}

/// Events sent from the async worker to the TUI
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Sync state machine moved
    SyncState { state: SyncState },
    /// Merged conversation view and its unread aggregate
    ConversationsReady {
        conversations: Vec<ConversationSummary>,
        unread: u32,
    },
    /// Aggregate rose above its previous value
    UnreadIncreased { previous: u32, current: u32 },
    /// Conversation refresh failed; previous data is still valid
    SyncFailed { message: String },
    /// Messages of a conversation
    MessagesReady {
        conversation_id: String,
        messages: Vec<Message>,
    },
    /// Server accepted a message
    MessageSent {
        conversation_id: String,
        message: Message,
    },
    /// Server rejected a message
    MessageFailed {
        conversation_id: String,
        content: String,
        error: String,
    },
    /// Server confirmed a mark-read
    ConversationRead { conversation_id: String },
    /// Offers list
    OffersReady { offers: Vec<Offer>, cached: bool },
    /// Offer published
    OfferCreated { offer: Offer },
    /// Error occurred
    Error { message: String },
}

/// Bridge between sync TUI thread and async Tokio runtime
pub struct RuntimeBridge {
    cmd_tx: UnboundedSender<RuntimeCommand>,
    evt_rx: Receiver<RuntimeEvent>,
}

impl RuntimeBridge {
    /// Spawn the worker thread with its own Tokio runtime
    pub fn new(api: Arc<dyn MarketplaceApi>, settings: SyncSettings) -> anyhow::Result<Self> {
        let (cmd_tx, cmd_rx) = unbounded_channel::<RuntimeCommand>();
        let (evt_tx, evt_rx) = mpsc::channel::<RuntimeEvent>();

        thread::Builder::new()
            .name("chauffeur-sync".to_string())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_multi_thread()
                    .worker_threads(2)
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(err) => {
                        error!(error = %err, "failed to start tokio runtime");
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!("Runtime failed to start: {err}"),
                        });
                        return;
                    }
                };
                rt.block_on(async {
                    if let Err(err) = run_async_worker(api, settings, cmd_rx, evt_tx.clone()).await
                    {
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!("Worker exited: {:#}", err),
                        });
                    }
                });
            })?;

        Ok(Self { cmd_tx, evt_rx })
    }

    /// Send a command to the async worker
    pub fn send(&self, cmd: RuntimeCommand) -> anyhow::Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| anyhow::anyhow!("Worker channel closed"))
    }

    /// A sender for code that outlives a borrow of the bridge
    pub fn sender(&self) -> UnboundedSender<RuntimeCommand> {
        self.cmd_tx.clone()
    }

    /// Poll for events (non-blocking)
    pub fn poll_events(&self) -> Vec<RuntimeEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.evt_rx.try_recv() {
            events.push(evt);
        }
        events
    }
}

impl Drop for RuntimeBridge {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(RuntimeCommand::Shutdown);
    }
}

/// Forward refresh-relevant bus signals to the worker as triggers
pub fn forward_triggers(bus: &EventBus, cmd_tx: UnboundedSender<RuntimeCommand>) -> Subscription {
    bus.on_any(&SignalKind::REFRESH, move |signal| {
        if let Some(trigger) = Trigger::from_signal(signal) {
            let _ = cmd_tx.send(RuntimeCommand::Trigger(trigger));
        }
    })
}
