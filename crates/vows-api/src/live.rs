//! Live feed: store mutations fan out to dashboards and guestbook views.
//!
//! Every subscriber gets a [`Subscription`] that owns its receiver and a
//! cancellation token. Dropping or cancelling it tears the feed down; the
//! WebSocket task ends with it.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use vows_types::events::{Collection, LiveEvent};

use crate::error::ApiError;
use crate::middleware::decode_token;
use crate::state::AppState;
use crate::{dashboard, guestbook};

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);
const MAX_MISSED_HEARTBEATS: u8 = 2;

const CHANNEL_CAPACITY: usize = 1024;

const ADMIN_COLLECTIONS: &[Collection] = &[Collection::Rsvps, Collection::Guestbook];
const GUESTBOOK_COLLECTIONS: &[Collection] = &[Collection::Guestbook];

/// Broadcasts live events to every subscriber.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    broadcast_tx: broadcast::Sender<LiveEvent>,
    subscribers: AtomicUsize,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(DispatcherInner {
                broadcast_tx,
                subscribers: AtomicUsize::new(0),
            }),
        }
    }

    /// Subscribe to events of the given collections.
    pub fn subscribe(&self, collections: &[Collection]) -> Subscription {
        let count = self.inner.subscribers.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("Live subscriber added ({} active)", count);
        Subscription {
            rx: self.inner.broadcast_tx.subscribe(),
            collections: collections.iter().copied().collect(),
            cancel: CancellationToken::new(),
            dispatcher: self.inner.clone(),
        }
    }

    /// Broadcast an event. Having no subscribers is not an error.
    pub fn broadcast(&self, event: LiveEvent) {
        let _ = self.inner.broadcast_tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Event(LiveEvent),
    /// The subscriber fell behind and missed this many events; resync from a snapshot.
    Lagged(u64),
}

pub struct Subscription {
    rx: broadcast::Receiver<LiveEvent>,
    collections: HashSet<Collection>,
    cancel: CancellationToken,
    dispatcher: Arc<DispatcherInner>,
}

impl Subscription {
    /// A token that ends this subscription from elsewhere.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Next event for this subscriber's collections. `None` once cancelled.
    pub async fn next(&mut self) -> Option<Delivery> {
        loop {
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return None,
                result = self.rx.recv() => result,
            };
            match result {
                Ok(event) if self.collections.contains(&event.collection()) => {
                    return Some(Delivery::Event(event));
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(n)) => {
                    warn!("Live subscriber lagged by {} events", n);
                    return Some(Delivery::Lagged(n));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
        let remaining = self.dispatcher.subscribers.fetch_sub(1, Ordering::Relaxed) - 1;
        debug!("Live subscriber removed ({} active)", remaining);
    }
}

#[derive(Debug, Deserialize)]
pub struct LiveQuery {
    pub token: String,
}

/// GET /admin/live?token=...: guest list and guestbook feed for the dashboard.
pub async fn admin_feed(
    State(state): State<AppState>,
    Query(query): Query<LiveQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ApiError> {
    decode_token(&state.settings.jwt_secret, &query.token).ok_or(ApiError::Unauthorized)?;
    Ok(ws.on_upgrade(move |socket| run_feed(socket, state, ADMIN_COLLECTIONS)))
}

/// GET /guestbook/live: public guestbook feed.
pub async fn guestbook_feed(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run_feed(socket, state, GUESTBOOK_COLLECTIONS))
}

type WsSender = SplitSink<WebSocket, Message>;

async fn send_event(sender: &mut WsSender, event: &LiveEvent) -> anyhow::Result<()> {
    let text = serde_json::to_string(event)?;
    sender.send(Message::Text(text.into())).await?;
    Ok(())
}

async fn send_snapshots(
    sender: &mut WsSender,
    state: &AppState,
    collections: &[Collection],
) -> anyhow::Result<()> {
    for collection in collections {
        let event = match collection {
            Collection::Rsvps => LiveEvent::Snapshot {
                rsvps: dashboard::load_entries(state).await?,
            },
            Collection::Guestbook => LiveEvent::MemorySnapshot {
                memories: guestbook::load_memories(state).await?,
            },
        };
        send_event(sender, &event).await?;
    }
    Ok(())
}

async fn run_feed(socket: WebSocket, state: AppState, collections: &'static [Collection]) {
    // Subscribe before reading the snapshot so nothing written in between is lost.
    let mut subscription = state.dispatcher.subscribe(collections);
    let (mut sender, mut receiver) = socket.split();

    if let Err(e) = send_snapshots(&mut sender, &state, collections).await {
        warn!("Live feed snapshot failed: {:#}", e);
        return;
    }
    info!("Live feed opened for {:?}", collections);

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await;
    let mut missed_heartbeats: u8 = 0;

    loop {
        tokio::select! {
            delivery = subscription.next() => {
                let result = match delivery {
                    Some(Delivery::Event(event)) => send_event(&mut sender, &event).await,
                    Some(Delivery::Lagged(_)) => send_snapshots(&mut sender, &state, collections).await,
                    None => break,
                };
                if result.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Pong(_))) => missed_heartbeats = 0,
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // The feed is one-way; anything else from the client is ignored.
                    Some(Ok(_)) => {}
                }
            }
            _ = heartbeat.tick() => {
                missed_heartbeats += 1;
                if missed_heartbeats > MAX_MISSED_HEARTBEATS {
                    warn!("Heartbeat timeout, dropping live feed");
                    break;
                }
                if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }
        }
    }

    info!("Live feed closed for {:?}", collections);
}
