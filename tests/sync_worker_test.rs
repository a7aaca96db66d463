//! Sync worker behaviour against an in-memory API, on paused Tokio time

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use reqwest::StatusCode;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::sleep;

use chauffeur::domain::{ConversationSummary, Message, NewOffer, Offer, Participant, Role};
use chauffeur::infrastructure::api::{ApiError, ApiResult, MarketplaceApi};
use chauffeur::infrastructure::runtime::{
    run_async_worker, RuntimeCommand, RuntimeEvent, SyncSettings, SyncState, Trigger,
};

#[derive(Default)]
struct Calls {
    list: AtomicUsize,
    mark: AtomicUsize,
    messages: AtomicUsize,
    send: AtomicUsize,
    offers: AtomicUsize,
    create: AtomicUsize,
}

#[derive(Default)]
struct FakeApi {
    conversations: Mutex<Vec<ConversationSummary>>,
    offers: Mutex<Vec<Offer>>,
    calls: Calls,
    fail_list: AtomicBool,
    fail_mark: AtomicBool,
    fail_send: AtomicBool,
}

impl FakeApi {
    fn with_unread(counts: &[(&str, u32)]) -> Arc<Self> {
        let api = FakeApi::default();
        *api.conversations.lock().unwrap() = counts
            .iter()
            .map(|(id, unread)| convo(id, *unread))
            .collect();
        Arc::new(api)
    }

    fn list_calls(&self) -> usize {
        self.calls.list.load(Ordering::SeqCst)
    }
}

fn unavailable(path: &str) -> ApiError {
    ApiError::Status {
        path: path.to_string(),
        status: StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[async_trait::async_trait]
impl MarketplaceApi for FakeApi {
    async fn list_conversations(&self) -> ApiResult<Vec<ConversationSummary>> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(unavailable("/conversations"));
        }
        Ok(self.conversations.lock().unwrap().clone())
    }

    async fn mark_read(&self, conversation_id: &str) -> ApiResult<()> {
        self.calls.mark.fetch_add(1, Ordering::SeqCst);
        if self.fail_mark.load(Ordering::SeqCst) {
            return Err(unavailable("/conversations/read"));
        }
        for c in self.conversations.lock().unwrap().iter_mut() {
            if c.id == conversation_id {
                c.unread_count = 0;
            }
        }
        Ok(())
    }

    async fn list_messages(&self, conversation_id: &str) -> ApiResult<Vec<Message>> {
        self.calls.messages.fetch_add(1, Ordering::SeqCst);
        Ok(vec![message(&format!("{conversation_id}-m1"), "them", "bonjour")])
    }

    async fn send_message(&self, conversation_id: &str, content: &str) -> ApiResult<Message> {
        self.calls.send.fetch_add(1, Ordering::SeqCst);
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(unavailable("/conversations/messages"));
        }
        Ok(message(&format!("{conversation_id}-sent"), "me", content))
    }

    async fn list_offers(&self) -> ApiResult<Vec<Offer>> {
        self.calls.offers.fetch_add(1, Ordering::SeqCst);
        Ok(self.offers.lock().unwrap().clone())
    }

    async fn create_offer(&self, offer: &NewOffer) -> ApiResult<Offer> {
        let n = self.calls.create.fetch_add(1, Ordering::SeqCst);
        let created = Offer {
            id: format!("o{n}"),
            title: offer.title.clone(),
            location: offer.location.clone(),
            salary: offer.salary,
            contract_type: offer.contract_type.clone(),
            description: offer.description.clone(),
            status: Some("active".to_string()),
        };
        self.offers.lock().unwrap().insert(0, created.clone());
        Ok(created)
    }
}

fn convo(id: &str, unread: u32) -> ConversationSummary {
    ConversationSummary {
        id: id.to_string(),
        other_participant: Participant {
            name: format!("contact {id}"),
            role: Role::Driver,
        },
        last_message: None,
        unread_count: unread,
    }
}

fn message(id: &str, sender: &str, content: &str) -> Message {
    Message {
        id: id.to_string(),
        sender_id: sender.to_string(),
        content: content.to_string(),
        timestamp: Utc::now(),
        read: false,
    }
}

struct Harness {
    cmd_tx: UnboundedSender<RuntimeCommand>,
    evt_rx: Receiver<RuntimeEvent>,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl Harness {
    fn start(api: Arc<FakeApi>, poll_interval: Duration) -> Self {
        let (cmd_tx, cmd_rx) = unbounded_channel();
        let (evt_tx, evt_rx) = mpsc::channel();
        let settings = SyncSettings {
            user_id: "me".to_string(),
            poll_interval,
            debounce: Duration::from_millis(200),
            ..SyncSettings::default()
        };
        let api: Arc<dyn MarketplaceApi> = api;
        let handle = tokio::spawn(run_async_worker(api, settings, cmd_rx, evt_tx));
        Self {
            cmd_tx,
            evt_rx,
            handle,
        }
    }

    fn send(&self, cmd: RuntimeCommand) {
        self.cmd_tx.send(cmd).unwrap();
    }

    fn trigger(&self, trigger: Trigger) {
        self.send(RuntimeCommand::Trigger(trigger));
    }

    fn drain(&self) -> Vec<RuntimeEvent> {
        self.evt_rx.try_iter().collect()
    }

    fn unread_views(&self) -> Vec<u32> {
        self.drain()
            .into_iter()
            .filter_map(|event| match event {
                RuntimeEvent::ConversationsReady { unread, .. } => Some(unread),
                _ => None,
            })
            .collect()
    }
}

const LONG_POLL: Duration = Duration::from_secs(60);

async fn settle() {
    sleep(Duration::from_millis(1)).await;
}

#[tokio::test(start_paused = true)]
async fn fetches_on_start_then_every_interval() {
    let api = FakeApi::with_unread(&[("c1", 3), ("c2", 0), ("c3", 5)]);
    let harness = Harness::start(api.clone(), Duration::from_secs(5));

    settle().await;
    assert_eq!(api.list_calls(), 1);
    assert_eq!(harness.unread_views(), vec![8]);

    sleep(Duration::from_millis(4_990)).await;
    assert_eq!(api.list_calls(), 1);

    sleep(Duration::from_millis(20)).await;
    assert_eq!(api.list_calls(), 2);

    sleep(Duration::from_secs(5)).await;
    assert_eq!(api.list_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn burst_of_triggers_costs_one_fetch() {
    let api = FakeApi::with_unread(&[("c1", 1)]);
    let harness = Harness::start(api.clone(), LONG_POLL);
    settle().await;
    assert_eq!(api.list_calls(), 1);

    harness.trigger(Trigger::ForceRefresh);
    harness.trigger(Trigger::ForceRefresh);
    harness.trigger(Trigger::ConversationRead);
    harness.trigger(Trigger::ForceRefresh);

    sleep(Duration::from_millis(100)).await;
    assert_eq!(api.list_calls(), 1);

    // Pushes the deadline to ~300ms after the first trigger
    harness.trigger(Trigger::WindowFocused);
    sleep(Duration::from_millis(150)).await;
    assert_eq!(api.list_calls(), 1);

    sleep(Duration::from_millis(100)).await;
    assert_eq!(api.list_calls(), 2);

    sleep(Duration::from_secs(2)).await;
    assert_eq!(api.list_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn message_received_waits_its_own_delay() {
    let api = FakeApi::with_unread(&[("c1", 0)]);
    let harness = Harness::start(api.clone(), LONG_POLL);
    settle().await;

    harness.trigger(Trigger::MessageReceived);
    sleep(Duration::from_millis(100)).await;

    // A shorter trigger does not pull the deadline earlier
    harness.trigger(Trigger::ForceRefresh);
    sleep(Duration::from_millis(300)).await;
    assert_eq!(api.list_calls(), 1);

    sleep(Duration::from_millis(650)).await;
    assert_eq!(api.list_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_keeps_last_aggregate() {
    let api = FakeApi::with_unread(&[("c1", 3), ("c2", 0), ("c3", 5)]);
    let harness = Harness::start(api.clone(), LONG_POLL);
    settle().await;
    assert_eq!(harness.unread_views(), vec![8]);

    api.fail_list.store(true, Ordering::SeqCst);
    harness.trigger(Trigger::ForceRefresh);
    sleep(Duration::from_millis(250)).await;

    let events = harness.drain();
    assert!(events.iter().any(|e| matches!(
        e,
        RuntimeEvent::SyncState {
            state: SyncState::Error
        }
    )));
    assert!(events
        .iter()
        .any(|e| matches!(e, RuntimeEvent::SyncFailed { .. })));
    assert!(!events
        .iter()
        .any(|e| matches!(e, RuntimeEvent::ConversationsReady { .. })));

    // Recovery after the backend comes back
    api.fail_list.store(false, Ordering::SeqCst);
    harness.trigger(Trigger::ForceRefresh);
    sleep(Duration::from_millis(250)).await;
    assert_eq!(harness.unread_views(), vec![8]);
}

#[tokio::test(start_paused = true)]
async fn unread_increase_is_reported() {
    let api = FakeApi::with_unread(&[("c1", 1)]);
    let harness = Harness::start(api.clone(), LONG_POLL);
    settle().await;
    harness.drain();

    api.conversations.lock().unwrap()[0].unread_count = 4;
    harness.trigger(Trigger::ForceRefresh);
    sleep(Duration::from_millis(250)).await;

    let increases: Vec<(u32, u32)> = harness
        .drain()
        .into_iter()
        .filter_map(|event| match event {
            RuntimeEvent::UnreadIncreased { previous, current } => Some((previous, current)),
            _ => None,
        })
        .collect();
    assert_eq!(increases, vec![(1, 4)]);
}

#[tokio::test(start_paused = true)]
async fn no_fetch_after_teardown() {
    let api = FakeApi::with_unread(&[("c1", 2)]);
    let harness = Harness::start(api.clone(), Duration::from_secs(5));
    settle().await;
    assert_eq!(api.list_calls(), 1);

    // A pending debounced refresh must not fire after the sender is gone
    harness.trigger(Trigger::ForceRefresh);
    let Harness {
        cmd_tx,
        evt_rx: _evt_rx,
        handle,
    } = harness;
    drop(cmd_tx);

    handle.await.unwrap().unwrap();
    sleep(Duration::from_secs(30)).await;
    assert_eq!(api.list_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn stops_when_event_receiver_is_gone() {
    let api = FakeApi::with_unread(&[("c1", 0)]);
    let Harness {
        cmd_tx,
        evt_rx,
        handle,
    } = Harness::start(api.clone(), Duration::from_secs(5));
    settle().await;

    drop(evt_rx);
    let result = tokio::time::timeout(Duration::from_secs(30), handle).await;
    assert!(matches!(result, Ok(Ok(Ok(())))));
    assert_eq!(api.list_calls(), 2);
    drop(cmd_tx);
}

#[tokio::test(start_paused = true)]
async fn zero_poll_interval_is_rejected() {
    let api = FakeApi::with_unread(&[]);
    let harness = Harness::start(api.clone(), Duration::ZERO);
    let result = harness.handle.await.unwrap();
    assert!(result.is_err());
    assert_eq!(api.list_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn mark_read_is_optimistic_then_confirmed() {
    let api = FakeApi::with_unread(&[("c1", 3), ("c2", 2)]);
    let harness = Harness::start(api.clone(), LONG_POLL);
    settle().await;
    harness.drain();

    harness.send(RuntimeCommand::MarkRead {
        conversation_id: "c1".to_string(),
    });
    settle().await;

    let events = harness.drain();
    let views: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            RuntimeEvent::ConversationsReady { unread, .. } => Some(*unread),
            _ => None,
        })
        .collect();
    assert_eq!(views, vec![2, 2]);
    assert!(events.iter().any(|e| matches!(
        e,
        RuntimeEvent::ConversationRead { conversation_id } if conversation_id == "c1"
    )));
    assert_eq!(api.calls.mark.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn rejected_mark_read_rolls_back() {
    let api = FakeApi::with_unread(&[("c1", 3), ("c2", 2)]);
    api.fail_mark.store(true, Ordering::SeqCst);
    let harness = Harness::start(api.clone(), LONG_POLL);
    settle().await;
    harness.drain();

    harness.send(RuntimeCommand::MarkRead {
        conversation_id: "c1".to_string(),
    });
    settle().await;

    let events = harness.drain();
    let views: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            RuntimeEvent::ConversationsReady { unread, .. } => Some(*unread),
            _ => None,
        })
        .collect();
    assert_eq!(views, vec![2, 5]);
    assert!(events
        .iter()
        .any(|e| matches!(e, RuntimeEvent::Error { .. })));
    assert!(!events
        .iter()
        .any(|e| matches!(e, RuntimeEvent::ConversationRead { .. })));
}

#[tokio::test(start_paused = true)]
async fn sent_message_becomes_preview() {
    let api = FakeApi::with_unread(&[("c1", 0)]);
    let harness = Harness::start(api.clone(), LONG_POLL);
    settle().await;
    harness.drain();

    harness.send(RuntimeCommand::SendMessage {
        conversation_id: "c1".to_string(),
        content: "J'arrive à 8h".to_string(),
    });
    settle().await;

    let events = harness.drain();
    let last_preview = events
        .iter()
        .rev()
        .find_map(|event| match event {
            RuntimeEvent::ConversationsReady { conversations, .. } => conversations[0]
                .last_message
                .as_ref()
                .map(|m| m.content.clone()),
            _ => None,
        });
    assert_eq!(last_preview.as_deref(), Some("J'arrive à 8h"));
    assert!(events.iter().any(|e| matches!(
        e,
        RuntimeEvent::MessageSent { message, .. } if message.id == "c1-sent"
    )));
}

#[tokio::test(start_paused = true)]
async fn rejected_message_is_handed_back() {
    let api = FakeApi::with_unread(&[("c1", 0)]);
    api.fail_send.store(true, Ordering::SeqCst);
    let harness = Harness::start(api.clone(), LONG_POLL);
    settle().await;
    harness.drain();

    harness.send(RuntimeCommand::SendMessage {
        conversation_id: "c1".to_string(),
        content: "allô".to_string(),
    });
    settle().await;

    let events = harness.drain();
    assert!(events.iter().any(|e| matches!(
        e,
        RuntimeEvent::MessageFailed { content, .. } if content == "allô"
    )));
    let last_view = events.iter().rev().find_map(|event| match event {
        RuntimeEvent::ConversationsReady { conversations, .. } => Some(conversations.clone()),
        _ => None,
    });
    assert_eq!(
        last_view.map(|c| c[0].last_message.is_none()),
        Some(true)
    );
}

#[tokio::test(start_paused = true)]
async fn offers_are_served_from_cache_until_invalidated() {
    let api = FakeApi::with_unread(&[]);
    let harness = Harness::start(api.clone(), LONG_POLL);
    settle().await;
    harness.drain();

    let cached_flags = |events: Vec<RuntimeEvent>| -> Vec<bool> {
        events
            .into_iter()
            .filter_map(|event| match event {
                RuntimeEvent::OffersReady { cached, .. } => Some(cached),
                _ => None,
            })
            .collect()
    };

    harness.send(RuntimeCommand::LoadOffers { force: false });
    harness.send(RuntimeCommand::LoadOffers { force: false });
    settle().await;
    assert_eq!(cached_flags(harness.drain()), vec![false, true]);
    assert_eq!(api.calls.offers.load(Ordering::SeqCst), 1);

    harness.send(RuntimeCommand::LoadOffers { force: true });
    settle().await;
    assert_eq!(cached_flags(harness.drain()), vec![false]);
    assert_eq!(api.calls.offers.load(Ordering::SeqCst), 2);

    let offer = NewOffer::from_fields("Chauffeur poids lourd", "Yopougon", "250000", "CDI", "")
        .unwrap();
    harness.send(RuntimeCommand::CreateOffer { offer });
    harness.send(RuntimeCommand::LoadOffers { force: false });
    settle().await;

    let events = harness.drain();
    assert!(events
        .iter()
        .any(|e| matches!(e, RuntimeEvent::OfferCreated { offer } if offer.salary == Some(250_000))));
    let fresh: Vec<usize> = events
        .iter()
        .filter_map(|event| match event {
            RuntimeEvent::OffersReady {
                offers,
                cached: false,
            } => Some(offers.len()),
            _ => None,
        })
        .collect();
    assert_eq!(fresh, vec![1]);
    assert_eq!(api.calls.offers.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn watched_conversation_is_polled() {
    let api = FakeApi::with_unread(&[("c1", 0)]);
    let harness = Harness::start(api.clone(), Duration::from_secs(5));
    settle().await;

    harness.send(RuntimeCommand::WatchConversation {
        conversation_id: Some("c1".to_string()),
    });
    settle().await;
    assert_eq!(api.calls.messages.load(Ordering::SeqCst), 1);

    sleep(Duration::from_secs(5)).await;
    assert_eq!(api.calls.messages.load(Ordering::SeqCst), 2);
    assert!(harness.drain().iter().any(|e| matches!(
        e,
        RuntimeEvent::MessagesReady { conversation_id, messages }
            if conversation_id == "c1" && messages.len() == 1
    )));

    harness.send(RuntimeCommand::WatchConversation {
        conversation_id: None,
    });
    sleep(Duration::from_secs(5)).await;
    assert_eq!(api.calls.messages.load(Ordering::SeqCst), 2);
}
