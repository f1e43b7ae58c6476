use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use vows_types::events::LiveEvent;

use crate::error::ClientError;

/// Events buffered between the socket task and the consumer.
const FEED_BUFFER: usize = 64;

/// Owns one live feed connection. Cancelling (or dropping) it closes the
/// socket and ends the event stream.
#[derive(Debug)]
pub struct FeedHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl FeedHandle {
    /// A token that tears the feed down from elsewhere.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancels and waits for the socket to close.
    pub async fn unsubscribe(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Connects to a feed URL (see `ApiClient::admin_feed_url`). The first event
/// is the snapshot, then changes as they happen.
pub async fn subscribe(url: &str) -> Result<(FeedHandle, mpsc::Receiver<LiveEvent>), ClientError> {
    let (ws, _) = tokio_tungstenite::connect_async(url).await?;
    let (mut sink, mut stream) = ws.split();
    let (tx, rx) = mpsc::channel(FEED_BUFFER);

    let cancel = CancellationToken::new();
    let token = cancel.clone();

    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }

                msg = stream.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<LiveEvent>(text.as_str()) {
                            Ok(event) => {
                                if tx.send(event).await.is_err() {
                                    debug!("Feed receiver dropped");
                                    break;
                                }
                            }
                            Err(e) => warn!("Skipping malformed feed message: {}", e),
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        if sink.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Live feed closed by server");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Live feed error: {}", e);
                        break;
                    }
                },
            }
        }
    });

    Ok((
        FeedHandle {
            cancel,
            task: Some(task),
        },
        rx,
    ))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::net::TcpListener;
    use uuid::Uuid;

    use super::*;

    /// Accepts one socket, sends two events, then waits for the close.
    async fn one_shot_server() -> (String, JoinHandle<bool>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(socket).await.unwrap();
            for likes in [1, 2] {
                let event = LiveEvent::MemoryLiked {
                    id: Uuid::nil(),
                    likes,
                };
                let text = serde_json::to_string(&event).unwrap();
                ws.send(Message::Text(text.into())).await.unwrap();
            }
            while let Some(msg) = ws.next().await {
                match msg {
                    Ok(Message::Close(_)) | Err(_) => return true,
                    _ => {}
                }
            }
            true
        });
        (format!("ws://{}", addr), server)
    }

    #[tokio::test]
    async fn events_arrive_in_order_until_unsubscribed() {
        let (url, server) = one_shot_server().await;
        let (handle, mut events) = subscribe(&url).await.unwrap();

        for expected in [1, 2] {
            match events.recv().await {
                Some(LiveEvent::MemoryLiked { likes, .. }) => assert_eq!(likes, expected),
                other => panic!("unexpected {:?}", other),
            }
        }

        handle.unsubscribe().await;
        assert!(events.recv().await.is_none());
        let closed = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
        assert!(closed);
    }

    #[tokio::test]
    async fn dropping_the_handle_cancels() {
        let (url, _server) = one_shot_server().await;
        let (handle, mut events) = subscribe(&url).await.unwrap();
        let token = handle.cancel_token();
        drop(handle);
        assert!(token.is_cancelled());

        // Whatever was already buffered drains, then the stream ends.
        let drained = tokio::time::timeout(Duration::from_secs(5), async {
            while events.recv().await.is_some() {}
        })
        .await;
        assert!(drained.is_ok());
    }
}
