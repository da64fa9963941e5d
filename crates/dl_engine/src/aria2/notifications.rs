//! aria2 WebSocket notifications.
//!
//! aria2 pushes JSON-RPC notifications such as `aria2.onDownloadComplete` on
//! its WebSocket endpoint. Completion and error notifications are turned into
//! [`CompletionEvent`]s and handed to a [`CompletionNotifier`].

use dl_logging::{dl_info, dl_trace, dl_warn};
use futures_util::StreamExt;
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use crate::client::EngineError;
use crate::notifier::CompletionNotifier;
use crate::CompletionEvent;

pub type NotificationStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Deserialize)]
struct Frame {
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Vec<EventParam>,
}

#[derive(Debug, Deserialize)]
struct EventParam {
    gid: String,
}

/// Parses one text frame. Returns `None` for frames that are not completion or
/// error notifications (call responses, start/pause/stop notifications).
pub fn parse_notification(text: &str) -> Option<Vec<CompletionEvent>> {
    let frame: Frame = serde_json::from_str(text).ok()?;
    let make: fn(String) -> CompletionEvent = match frame.method.as_deref()? {
        "aria2.onDownloadComplete" => CompletionEvent::complete,
        "aria2.onDownloadError" => CompletionEvent::error,
        _ => return None,
    };
    Some(frame.params.into_iter().map(|p| make(p.gid)).collect())
}

/// Connects to the WebSocket endpoint, e.g. `ws://127.0.0.1:6800/jsonrpc`.
pub async fn connect(ws_url: &str) -> Result<NotificationStream, EngineError> {
    let (stream, _response) = connect_async(ws_url).await.map_err(|err| {
        EngineError::Unavailable(format!("failed to connect to {ws_url}: {err}"))
    })?;
    dl_info!("Listening for engine notifications at {}", ws_url);
    Ok(stream)
}

/// Forwards notifications to `notifier` until the stream ends or `cancel` fires.
pub fn spawn_listener(
    mut stream: NotificationStream,
    notifier: CompletionNotifier,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                _ = cancel.cancelled() => break,
                frame = stream.next() => frame,
            };
            match frame {
                Some(Ok(Message::Text(text))) => handle_text(&text, &notifier),
                Some(Ok(Message::Close(frame))) => {
                    dl_info!("Engine notification socket closed: {:?}", frame);
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    dl_warn!("Engine notification socket error: {}", err);
                    break;
                }
                None => break,
            }
        }
    })
}

fn handle_text(text: &str, notifier: &CompletionNotifier) {
    match parse_notification(text) {
        Some(events) => {
            let delivered = notifier.notify(&events);
            dl_trace!("{} of {} notification(s) delivered", delivered, events.len());
        }
        None => dl_trace!("Ignoring frame: {}", text),
    }
}
