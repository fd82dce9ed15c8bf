//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType, WsRequest};
use super::subscription::{SubscriptionManager, parse_targets};
use crate::api::dto::ListingSnapshotDto;
use crate::domain::{ListingEvent, SessionId};
use crate::service::SessionService;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards events of subscribed sessions from the
///   [`broadcast::Receiver`] to the client.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<ListingEvent>,
    sessions: Arc<SessionService>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &mut subs, &sessions).await;
                        if ws_tx.send(Message::text(response)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(listing_event) => {
                        if subs.matches(listing_event.session_id()) {
                            let json = encode_event(&listing_event);
                            if ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

fn encode(msg: &WsMessage) -> String {
    serde_json::to_string(msg).unwrap_or_default()
}

fn encode_event(event: &ListingEvent) -> String {
    encode(&WsMessage::new(
        uuid::Uuid::new_v4().to_string(),
        WsMessageType::Event,
        serde_json::to_value(event).unwrap_or_default(),
    ))
}

fn id_strings(ids: &[SessionId]) -> Vec<String> {
    ids.iter().map(ToString::to_string).collect()
}

/// Handles a text message from the client and returns the JSON reply.
async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    sessions: &SessionService,
) -> String {
    let request = match serde_json::from_str::<WsRequest>(text) {
        Ok(request) => request,
        Err(err) => {
            let message = if serde_json::from_str::<serde_json::Value>(text).is_ok() {
                format!("unknown command: {err}")
            } else {
                "malformed JSON".to_string()
            };
            return encode(&WsMessage::error("", 400, &message));
        }
    };

    match request.command {
        WsCommand::Subscribe { session_ids } => {
            let (ids, wildcard, invalid) = parse_targets(&session_ids);
            subs.subscribe(&ids, wildcard);
            encode(&WsMessage::new(
                request.id,
                WsMessageType::Response,
                serde_json::json!({
                    "subscribed": id_strings(&ids),
                    "ignored": invalid,
                    "count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            ))
        }
        WsCommand::Unsubscribe { session_ids } => {
            let (ids, wildcard, invalid) = parse_targets(&session_ids);
            subs.unsubscribe(&ids, wildcard);
            encode(&WsMessage::new(
                request.id,
                WsMessageType::Response,
                serde_json::json!({
                    "unsubscribed": id_strings(&ids),
                    "ignored": invalid,
                    "remaining_count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            ))
        }
        WsCommand::GetSnapshot { session_id } => {
            let Ok(uuid) = session_id.trim().parse::<uuid::Uuid>() else {
                return encode(&WsMessage::error(request.id, 1001, "invalid session ID"));
            };
            match sessions.session(SessionId::from_uuid(uuid)).await {
                Ok(session) => {
                    let snapshot = session.listing().snapshot().await;
                    let dto = ListingSnapshotDto::new(session.id(), session.feed(), &snapshot);
                    encode(&WsMessage::new(
                        request.id,
                        WsMessageType::Response,
                        serde_json::to_value(&dto).unwrap_or_default(),
                    ))
                }
                Err(err) => encode(&WsMessage::error(
                    request.id,
                    err.error_code(),
                    &err.to_string(),
                )),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::domain::project::tests::project;
    use crate::domain::{EventBus, Feed, LaunchStatus};
    use crate::service::{RefreshDriver, SessionSettings};
    use crate::source::MemorySource;

    fn sessions() -> SessionService {
        let memory = Arc::new(MemorySource::new(vec![
            project("0xaa", LaunchStatus::Success),
            project("0xbb", LaunchStatus::Success),
        ]));
        SessionService::new(
            Arc::clone(&memory) as _,
            memory,
            RefreshDriver::default(),
            EventBus::new(16),
            SessionSettings::default(),
        )
    }

    fn parse(reply: &str) -> Value {
        let Ok(value) = serde_json::from_str::<Value>(reply) else {
            panic!("reply is JSON");
        };
        value
    }

    #[tokio::test]
    async fn subscribe_then_unsubscribe() {
        let sessions = sessions();
        let mut subs = SubscriptionManager::new();
        let id = SessionId::new();

        let reply = parse(
            &handle_text_message(
                &format!(r#"{{"id":"1","command":"subscribe","session_ids":["{id}","bad"]}}"#),
                &mut subs,
                &sessions,
            )
            .await,
        );
        assert_eq!(reply["id"], "1");
        assert_eq!(reply["type"], "response");
        assert_eq!(reply["payload"]["count"], 1);
        assert_eq!(reply["payload"]["ignored"][0], "bad");
        assert!(subs.matches(id));

        let reply = parse(
            &handle_text_message(
                &format!(r#"{{"command":"unsubscribe","session_ids":["{id}"]}}"#),
                &mut subs,
                &sessions,
            )
            .await,
        );
        assert_eq!(reply["payload"]["remaining_count"], 0);
        assert!(!subs.matches(id));
    }

    #[tokio::test]
    async fn wildcard_subscription_matches_any_session() {
        let sessions = sessions();
        let mut subs = SubscriptionManager::new();
        let reply = parse(
            &handle_text_message(
                r#"{"command":"subscribe","session_ids":["*"]}"#,
                &mut subs,
                &sessions,
            )
            .await,
        );
        assert_eq!(reply["payload"]["wildcard"], true);
        assert!(subs.matches(SessionId::new()));
    }

    #[tokio::test]
    async fn malformed_and_unknown_messages_are_errors() {
        let sessions = sessions();
        let mut subs = SubscriptionManager::new();

        let reply = parse(&handle_text_message("{not json", &mut subs, &sessions).await);
        assert_eq!(reply["type"], "error");
        assert_eq!(reply["payload"]["message"], "malformed JSON");

        let reply = parse(&handle_text_message(r#"{"command":"swap"}"#, &mut subs, &sessions).await);
        assert_eq!(reply["type"], "error");
        assert_eq!(reply["payload"]["code"], 400);
    }

    #[tokio::test]
    async fn snapshot_of_live_and_missing_sessions() {
        let sessions = sessions();
        let mut subs = SubscriptionManager::new();
        let Ok(session) = sessions.create_session(Feed::Pumping, None).await else {
            panic!("session created");
        };
        let _ = session.listing().reload_page().await;

        let reply = parse(
            &handle_text_message(
                &format!(r#"{{"id":"s","command":"get_snapshot","session_id":"{}"}}"#, session.id()),
                &mut subs,
                &sessions,
            )
            .await,
        );
        assert_eq!(reply["type"], "response");
        assert_eq!(reply["payload"]["items"].as_array().map(Vec::len), Some(2));

        let reply = parse(
            &handle_text_message(
                &format!(r#"{{"command":"get_snapshot","session_id":"{}"}}"#, SessionId::new()),
                &mut subs,
                &sessions,
            )
            .await,
        );
        assert_eq!(reply["type"], "error");
        assert_eq!(reply["payload"]["code"], 2001);
        sessions.shutdown().await;
    }

    #[test]
    fn events_are_wrapped_in_envelope() {
        let event = ListingEvent::SessionDisposed {
            session_id: SessionId::new(),
            timestamp: chrono::Utc::now(),
        };
        let value = parse(&encode_event(&event));
        assert_eq!(value["type"], "event");
        assert!(value["payload"].is_object());
    }
}
