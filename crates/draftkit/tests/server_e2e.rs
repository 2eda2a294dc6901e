//! End-to-end: real WebSocket connections against a running server.

use std::sync::Arc;
use std::time::Duration;

use draftkit::prelude::*;
use draftkit::ServerHub;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Request = ClientMessage<SessionConfig, DraftCommand>;
type Reply = ServerMessage<DraftSession>;

async fn start_with<St: SessionStore<DraftSession>>(store: St) -> (String, Arc<ServerHub<St>>) {
    let server = DraftkitServer::builder()
        .bind("127.0.0.1:0")
        .build(store)
        .await
        .unwrap();
    let url = format!("ws://{}", server.local_addr().unwrap());
    let hub = server.hub();
    tokio::spawn(server.run());
    (url, hub)
}

async fn start() -> (String, Arc<ServerHub<MemoryStore<DraftSession>>>) {
    start_with(MemoryStore::new()).await
}

async fn connect(url: &str) -> Ws {
    let (ws, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    ws
}

async fn send(ws: &mut Ws, msg: &Request) {
    let text = serde_json::to_string(msg).unwrap();
    ws.send(Message::Text(text.into())).await.unwrap();
}

async fn recv(ws: &mut Ws) -> Envelope<Reply> {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection closed")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn create(ws: &mut Ws) -> (SessionKey, String) {
    send(
        ws,
        &ClientMessage::Create {
            config: SessionConfig::new(DraftFormat::Standard, TeamSize::Two),
        },
    )
    .await;
    match recv(ws).await.payload {
        ServerMessage::Created { key, owner_token } => (key, owner_token),
        other => panic!("expected created, got {other:?}"),
    }
}

fn pick(key: &SessionKey, token: &str, slot: usize, unit: &str) -> Request {
    ClientMessage::Command {
        key: key.clone(),
        token: token.to_string(),
        command: DraftCommand::Pick {
            slot,
            pick: Pick::unit(unit),
        },
    }
}

#[tokio::test]
async fn test_spectator_sees_snapshot_then_updates() {
    let (url, _hub) = start().await;
    let mut owner = connect(&url).await;
    let (key, token) = create(&mut owner).await;

    let mut spectator = connect(&url).await;
    send(&mut spectator, &ClientMessage::Watch { key: key.clone() }).await;
    match recv(&mut spectator).await.payload {
        ServerMessage::Event {
            event: SyncEvent::Snapshot { revision, session },
        } => {
            assert_eq!(revision, 0);
            assert_eq!(session.current_turn(), 0);
        }
        other => panic!("expected snapshot, got {other:?}"),
    }

    send(&mut owner, &pick(&key, &token, 0, "seele")).await;
    assert_eq!(
        recv(&mut owner).await.payload,
        ServerMessage::Accepted {
            key: key.clone(),
            revision: 1
        }
    );

    match recv(&mut spectator).await.payload {
        ServerMessage::Event {
            event: SyncEvent::Update { revision, session },
        } => {
            assert_eq!(revision, 1);
            assert_eq!(session.current_turn(), 1);
        }
        other => panic!("expected update, got {other:?}"),
    }
}

#[tokio::test]
async fn test_owner_rejections_carry_status_codes() {
    let (url, _hub) = start().await;
    let mut owner = connect(&url).await;
    let (key, token) = create(&mut owner).await;

    send(&mut owner, &pick(&key, "wrong-token", 0, "seele")).await;
    assert!(matches!(
        recv(&mut owner).await.payload,
        ServerMessage::Rejected { code: 403, .. }
    ));

    send(&mut owner, &pick(&SessionKey::new("000000000000"), &token, 0, "seele")).await;
    assert!(matches!(
        recv(&mut owner).await.payload,
        ServerMessage::Rejected { code: 404, .. }
    ));

    send(&mut owner, &pick(&key, &token, 5, "seele")).await;
    match recv(&mut owner).await.payload {
        ServerMessage::Rejected { code, reason } => {
            assert_eq!(code, 409);
            assert!(reason.contains("wrong_turn"), "reason: {reason}");
        }
        other => panic!("expected rejection, got {other:?}"),
    }

    owner.send(Message::Text(String::from("{not json").into())).await.unwrap();
    assert!(matches!(
        recv(&mut owner).await.payload,
        ServerMessage::Rejected { code: 400, .. }
    ));
}

#[tokio::test]
async fn test_envelopes_count_per_connection() {
    let (url, _hub) = start().await;
    let mut ws = connect(&url).await;

    send(&mut ws, &ClientMessage::Heartbeat { client_time: 42 }).await;
    let first = recv(&mut ws).await;
    assert_eq!(first.seq, 0);
    match first.payload {
        ServerMessage::HeartbeatAck { client_time, .. } => assert_eq!(client_time, 42),
        other => panic!("expected heartbeat ack, got {other:?}"),
    }

    send(&mut ws, &ClientMessage::Heartbeat { client_time: 43 }).await;
    assert_eq!(recv(&mut ws).await.seq, 1);
}

#[tokio::test]
async fn test_watch_unknown_session_is_not_found() {
    let (url, _hub) = start().await;
    let mut ws = connect(&url).await;
    send(
        &mut ws,
        &ClientMessage::Watch {
            key: SessionKey::new("feedfacecafe"),
        },
    )
    .await;
    assert_eq!(
        recv(&mut ws).await.payload,
        ServerMessage::Event {
            event: SyncEvent::NotFound
        }
    );
}

#[tokio::test]
async fn test_watcher_closes_when_session_destroyed() {
    let (url, hub) = start().await;
    let mut owner = connect(&url).await;
    let (key, _token) = create(&mut owner).await;

    let mut updates = Watcher::new(url.as_str(), key.clone()).spawn::<DraftSession>();
    assert_eq!(
        updates.recv().await,
        Some(WatchUpdate::Status(WatchStatus::Connected))
    );
    match updates.recv().await {
        Some(WatchUpdate::Event(SyncEvent::Snapshot { revision, .. })) => assert_eq!(revision, 0),
        other => panic!("expected snapshot, got {other:?}"),
    }

    assert!(hub.destroy(&key).await.unwrap());
    assert_eq!(
        updates.recv().await,
        Some(WatchUpdate::Event(SyncEvent::NotFound))
    );
    assert_eq!(
        updates.recv().await,
        Some(WatchUpdate::Status(WatchStatus::Closed))
    );
    assert_eq!(updates.recv().await, None);
}

#[tokio::test]
async fn test_watcher_reports_reconnecting_when_server_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backoff = BackoffConfig {
        initial: Duration::from_millis(10),
        max: Duration::from_millis(40),
        jitter: 0.0,
        ..BackoffConfig::default()
    };
    let mut updates = Watcher::new(format!("ws://{addr}"), SessionKey::new("feedfacecafe"))
        .backoff(backoff)
        .spawn::<DraftSession>();

    for attempt in 1..=3 {
        match updates.recv().await {
            Some(WatchUpdate::Status(WatchStatus::Reconnecting { attempt: got, .. })) => {
                assert_eq!(got, attempt)
            }
            other => panic!("expected reconnecting, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_file_store_sessions_survive_server_restart() {
    let dir = tempfile::tempdir().unwrap();

    let (key, token) = {
        let (url, _hub) = start_with(FileStore::<DraftSession>::open(dir.path()).await.unwrap()).await;
        let mut owner = connect(&url).await;
        let (key, token) = create(&mut owner).await;
        send(&mut owner, &pick(&key, &token, 0, "seele")).await;
        assert!(matches!(
            recv(&mut owner).await.payload,
            ServerMessage::Accepted { revision: 1, .. }
        ));
        (key, token)
    };

    let (url, _hub) = start_with(FileStore::<DraftSession>::open(dir.path()).await.unwrap()).await;
    let mut spectator = connect(&url).await;
    send(&mut spectator, &ClientMessage::Watch { key: key.clone() }).await;
    match recv(&mut spectator).await.payload {
        ServerMessage::Event {
            event: SyncEvent::Snapshot { revision, session },
        } => {
            assert_eq!(revision, 1);
            assert_eq!(session.current_turn(), 1);
        }
        other => panic!("expected snapshot, got {other:?}"),
    }

    let mut owner = connect(&url).await;
    send(&mut owner, &pick(&key, &token, 1, "kafka")).await;
    assert!(matches!(
        recv(&mut owner).await.payload,
        ServerMessage::Accepted { revision: 2, .. }
    ));
}
