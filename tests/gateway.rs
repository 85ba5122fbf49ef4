//! End-to-end tests driving a client against a synthesized local gateway.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

use accord::gateway::{Encoding, EventHandler, ShardOptions};
use accord::model::Snowflake;
use accord::Client;

struct Noop;

impl EventHandler for Noop {}

fn dispatch(s: u64, t: &str, d: Value) -> Message {
    Message::Text(json!({ "op": 0, "s": s, "t": t, "d": d }).to_string())
}

fn hello(interval_ms: u64) -> Message {
    Message::Text(json!({ "op": 10, "d": { "heartbeat_interval": interval_ms } }).to_string())
}

async fn wait_until(mut cond: impl FnMut() -> bool) {
    timeout(Duration::from_secs(5), async {
        loop {
            if cond() {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition was not reached in time");
}

async fn next_payload(ws: &mut WebSocketStream<TcpStream>) -> Value {
    let frame = timeout(Duration::from_secs(20), ws.next())
        .await
        .expect("timed out waiting for a client frame")
        .expect("socket closed unexpectedly")
        .expect("socket errored");
    serde_json::from_str(frame.to_text().expect("expected a text frame")).unwrap()
}

fn spawn_client(addr: std::net::SocketAddr) -> Arc<Client> {
    let _ = env_logger::builder().is_test(true).try_init();
    let client = Arc::new(Client::with_options(
        "Bot token",
        ShardOptions {
            encoding: Encoding::Json,
            gateway_url: Some(format!("ws://{}", addr)),
            ..Default::default()
        },
    ));
    let runner = Arc::clone(&client);
    tokio::spawn(async move {
        let _ = runner.start(Noop).await;
    });
    client
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_gateway_session_populates_the_cache() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let client = spawn_client(listener.local_addr().unwrap());

    let (stream, _) = listener.accept().await.unwrap();
    let mut ws = accept_async(stream).await.unwrap();

    ws.send(hello(45000)).await.unwrap();

    // hello must be answered with an identify
    let identify = next_payload(&mut ws).await;
    assert_eq!(identify["op"], 2);
    assert_eq!(identify["d"]["token"], "Bot token");
    assert_eq!(identify["d"]["shard"], json!([0, 1]));

    ws.send(dispatch(
        1,
        "READY",
        json!({
            "v": 6,
            "user": {"id": "42", "username": "accord", "discriminator": "0001"},
            "session_id": "deadbeef",
            "guilds": [],
            "private_channels": [],
        }),
    ))
    .await
    .unwrap();
    wait_until(|| client.cache.ready.lock().is_some()).await;
    assert_eq!(client.shard.session_id().as_deref(), Some("deadbeef"));

    ws.send(dispatch(
        2,
        "MESSAGE_CREATE",
        json!({
            "id": "1",
            "channel_id": "10",
            "content": "hello",
            "author": {"id": "42", "username": "accord", "discriminator": "0001"},
        }),
    ))
    .await
    .unwrap();
    wait_until(|| client.cache.messages.has(&Snowflake(1))).await;
    assert_eq!(client.cache.messages.get(&Snowflake(1)).unwrap().content, "hello");

    ws.send(dispatch(
        3,
        "MESSAGE_REACTION_ADD",
        json!({
            "user_id": "42",
            "channel_id": "10",
            "message_id": "1",
            "emoji": {"id": null, "name": "👍"},
        }),
    ))
    .await
    .unwrap();
    wait_until(|| {
        client
            .cache
            .messages
            .get(&Snowflake(1))
            .map_or(false, |m| m.reactions.len() == 1 && m.reactions[0].count == 1)
    })
    .await;

    ws.send(dispatch(4, "MESSAGE_DELETE", json!({"id": "1", "channel_id": "10"})))
        .await
        .unwrap();
    wait_until(|| !client.cache.messages.has(&Snowflake(1))).await;

    assert_eq!(client.shard.sequence(), Some(4));
    client.shard.disconnect();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn an_invalid_session_forces_a_fresh_identify() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let client = spawn_client(listener.local_addr().unwrap());

    let (stream, _) = listener.accept().await.unwrap();
    let mut ws = accept_async(stream).await.unwrap();
    ws.send(hello(45000)).await.unwrap();
    assert_eq!(next_payload(&mut ws).await["op"], 2);

    ws.send(dispatch(
        1,
        "READY",
        json!({
            "v": 6,
            "user": {"id": "42", "username": "accord", "discriminator": "0001"},
            "session_id": "cafebabe",
            "guilds": [],
            "private_channels": [],
        }),
    ))
    .await
    .unwrap();
    wait_until(|| client.shard.session_id().is_some()).await;

    ws.send(Message::Text(json!({ "op": 9, "d": false }).to_string())).await.unwrap();
    wait_until(|| client.shard.session_id().is_none()).await;

    // the reconnect (after cooldown and jitter) must identify, not resume
    let (stream, _) = timeout(Duration::from_secs(20), listener.accept())
        .await
        .expect("client never reconnected")
        .unwrap();
    let mut ws = accept_async(stream).await.unwrap();
    ws.send(hello(45000)).await.unwrap();
    let auth = next_payload(&mut ws).await;
    assert_eq!(auth["op"], 2);

    client.shard.disconnect();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_missed_heartbeat_ack_closes_the_socket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let client = spawn_client(listener.local_addr().unwrap());

    let (stream, _) = listener.accept().await.unwrap();
    let mut ws = accept_async(stream).await.unwrap();
    ws.send(hello(100)).await.unwrap();
    assert_eq!(next_payload(&mut ws).await["op"], 2);

    // the first heartbeat goes unacknowledged
    let heartbeat = next_payload(&mut ws).await;
    assert_eq!(heartbeat["op"], 1);

    // the next tick must notice the missing ack and close the socket
    let closed = timeout(Duration::from_secs(5), async {
        while let Some(frame) = ws.next().await {
            match frame {
                Ok(Message::Close(_)) => return true,
                Ok(_) => continue,
                Err(_) => return true,
            }
        }
        true
    })
    .await
    .expect("the socket was never closed");
    assert!(closed);

    client.shard.disconnect();
}
