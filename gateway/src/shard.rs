use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client as ReqwestClient;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::time::sleep;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message as WebsocketMessage;

use accord_model::gateway::{
    GatewayEvent,
    GatewayInfo,
    HeartbeatPacket,
    HelloPacket,
    IdentifyPacket,
    IdentifyProperties,
    Opcodes,
    ReadyPacket,
    ReceivePacket,
    RequestGuildMembers,
    ResumePacket,
    SendablePacket,
    UpdateVoiceState,
};
use accord_model::presence::ClientPresence;

use crate::{
    constants::{API_BASE, CONNECT_RETRY_SECS, GATEWAY_VERSION, MAX_PAYLOAD_BYTES},
    errors::{Error, Result},
    limiter::{self, Cooldown, SlidingWindow},
    session::Session,
    Encoding,
    EventHandler,
    ShardOptions,
};

/// What the receive loop should do after handling a packet.
enum ShardAction {
    None,
    Reconnect { resume: bool },
}

/// Why a connection ended, and what the run loop should do about it.
enum LoopOutcome {
    /// The caller asked for a permanent disconnect.
    Finished,
    /// The connection ended; reconnect, resuming if allowed.
    Reconnect { resume: bool },
}

/// What the close-code policy dictates for a given close frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosePolicy {
    /// The close is permanent; surface it and stop.
    Fatal(&'static str),
    /// The session is gone; reconnect with a fresh identify.
    Rejoin,
    /// Reconnect and resume the session.
    Resume,
}

/// Maps a gateway close code to its reconnect policy.
pub fn close_policy(code: u16) -> ClosePolicy {
    match code {
        4001 => ClosePolicy::Fatal("an unknown opcode was sent"),
        4002 => ClosePolicy::Fatal("an invalid payload was sent"),
        4003 => ClosePolicy::Fatal("a payload was sent before identifying"),
        4004 => ClosePolicy::Fatal("the token was not accepted"),
        4005 => ClosePolicy::Fatal("more than one identify was sent"),
        4008 => ClosePolicy::Fatal("payloads were sent too quickly"),
        4010 => ClosePolicy::Fatal("an invalid shard was sent while identifying"),
        4011 => ClosePolicy::Fatal("sharding is required for this bot"),
        4007 | 4009 => ClosePolicy::Rejoin,
        _ => ClosePolicy::Resume,
    }
}

struct Limiters {
    connect: Cooldown,
    identify: SlidingWindow,
    send: SlidingWindow,
    status: SlidingWindow,
}

/// A Discord gateway shard.
///
/// A shard owns one websocket at a time and runs two cooperating tasks over
/// it: the receive loop and the heartbeat worker. Both communicate through
/// the session state under the shard's lock; reconnects bump a generation
/// counter that fences workers belonging to previous sockets.
pub struct Shard {
    /// The bot token that this shard will use.
    pub token: String,
    /// The shard's ID and the total amount of shards.
    pub info: [u64; 2],
    /// The currently active presence for this shard.
    pub presence: Mutex<ClientPresence>,
    encoding: Encoding,
    session: Mutex<Session>,
    sender: Mutex<Option<UnboundedSender<WebsocketMessage>>>,
    gateway_url: Mutex<Option<String>>,
    configured_url: Option<String>,
    http: ReqwestClient,
    limiters: Limiters,
}

impl Shard {
    /// Creates a new shard with the provided token.
    pub fn new(token: String, options: ShardOptions) -> Shard {
        let token = if token.starts_with("Bot ") {
            token
        } else {
            format!("Bot {}", token)
        };
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&token) {
            headers.insert("Authorization", value);
        }
        let http = ReqwestClient::builder()
            .default_headers(headers)
            .build()
            .expect("Failed to build HTTP client");

        Shard {
            token,
            info: options.shard,
            presence: Mutex::new(options.presence.unwrap_or_default()),
            encoding: options.encoding,
            session: Mutex::new(Session::default()),
            sender: Mutex::new(None),
            gateway_url: Mutex::new(None),
            configured_url: options.gateway_url,
            http,
            limiters: Limiters {
                connect: limiter::connect_cooldown(),
                identify: limiter::identify_limiter(),
                send: limiter::send_limiter(),
                status: limiter::status_limiter(),
            },
        }
    }

    /// Runs the shard until it is disconnected or fails permanently.
    ///
    /// Connects, performs the hello/identify handshake, dispatches incoming
    /// events to the handler, and reconnects (resuming when possible) until
    /// [`disconnect`](Self::disconnect) is called or a fatal close arrives.
    pub async fn run(self: Arc<Self>, handler: Arc<dyn EventHandler>) -> Result<()> {
        loop {
            if self.session.lock().should_disconnect {
                return Ok(());
            }
            self.limiters.connect.wait_for().await;
            match Shard::connect_once(&self, &handler).await? {
                LoopOutcome::Finished => return Ok(()),
                LoopOutcome::Reconnect { resume } => {
                    let resumable = {
                        let mut session = self.session.lock();
                        if !resume {
                            session.reset();
                        }
                        session.resumable()
                    };
                    if !resumable {
                        // spread fresh identifies out a little
                        let jitter = rand::thread_rng().gen_range(1.0..5.0);
                        debug!("[Shard {}] Rejoining in {:.2}s.", self.info[0], jitter);
                        sleep(Duration::from_secs_f64(jitter)).await;
                    }
                }
            }
        }
    }

    /// Requests a permanent disconnect and closes the socket.
    pub fn disconnect(&self) {
        self.session.lock().should_disconnect = true;
        self.close_socket();
    }

    /// The session ID of this shard, if a session is established.
    pub fn session_id(&self) -> Option<String> {
        self.session.lock().id.clone()
    }

    /// The last dispatch sequence this shard has seen.
    pub fn sequence(&self) -> Option<u64> {
        self.session.lock().seq
    }

    async fn connect_once(
        shard: &Arc<Shard>,
        handler: &Arc<dyn EventHandler>,
    ) -> Result<LoopOutcome> {
        let url = match shard.resolve_url().await {
            Ok(url) => url,
            Err(err) => {
                warn!("[Shard {}] Failed to fetch the gateway URL: {}.", shard.info[0], err);
                sleep(Duration::from_secs(CONNECT_RETRY_SECS)).await;
                return Ok(LoopOutcome::Reconnect { resume: true });
            }
        };
        let address = format!(
            "{}/?v={}&encoding={}",
            url.trim_end_matches('/'),
            GATEWAY_VERSION,
            shard.encoding
        );

        debug!("[Shard {}] Connecting to {}.", shard.info[0], address);
        let (socket, _) = match connect_async(address.as_str()).await {
            Ok(pair) => pair,
            Err(err) => {
                warn!("[Shard {}] Failed to connect to the gateway: {}.", shard.info[0], err);
                *shard.gateway_url.lock() = None;
                sleep(Duration::from_secs(CONNECT_RETRY_SECS)).await;
                return Ok(LoopOutcome::Reconnect { resume: true });
            }
        };
        let (mut sink, mut stream) = socket.split();

        let (sender, mut outgoing) = mpsc::unbounded_channel::<WebsocketMessage>();
        *shard.sender.lock() = Some(sender);
        let generation = {
            let mut session = shard.session.lock();
            session.generation += 1;
            session.generation
        };

        // writer task: forwards queued frames onto the socket
        tokio::spawn(async move {
            while let Some(message) = outgoing.recv().await {
                if sink.send(message).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        // the very first frame must be HELLO
        let first = match stream.next().await {
            Some(Ok(frame)) => frame,
            _ => {
                warn!("[Shard {}] Socket closed before HELLO.", shard.info[0]);
                return Ok(LoopOutcome::Reconnect { resume: true });
            }
        };
        let packet = shard.resolve_packet(&first)?;
        if packet.op != Opcodes::Hello {
            return Err(Error::Protocol(format!(
                "expected HELLO as the first frame, got opcode {:?}",
                packet.op
            )));
        }
        let hello: HelloPacket = packet.payload()?;
        trace!(
            "[Shard {}] Received HELLO, heartbeating every {}ms.",
            shard.info[0],
            hello.heartbeat_interval
        );

        // the handshake counts as acked until the first heartbeat goes out
        shard.session.lock().received_ack = true;
        tokio::spawn(Shard::heartbeat_loop(
            Arc::clone(shard),
            generation,
            Duration::from_millis(hello.heartbeat_interval),
        ));

        let resume_with = {
            let session = shard.session.lock();
            session.id.clone().map(|id| (id, session.seq))
        };
        match resume_with {
            Some((session_id, seq)) => {
                debug!("[Shard {}] Resuming session {}.", shard.info[0], session_id);
                shard.limiters.identify.wait_for().await;
                shard
                    .send_payload(&ResumePacket { token: shard.token.clone(), session_id, seq })
                    .await?;
            }
            None => {
                shard.limiters.identify.wait_for().await;
                shard.identify().await?;
            }
        }

        loop {
            let frame = match stream.next().await {
                Some(Ok(frame)) => frame,
                Some(Err(err)) => {
                    warn!("[Shard {}] Socket error: {}.", shard.info[0], err);
                    return Ok(LoopOutcome::Reconnect { resume: true });
                }
                None => {
                    return Ok(if shard.session.lock().should_disconnect {
                        LoopOutcome::Finished
                    } else {
                        LoopOutcome::Reconnect { resume: true }
                    });
                }
            };

            match frame {
                WebsocketMessage::Close(close) => return shard.handle_close(close),
                WebsocketMessage::Text(_) | WebsocketMessage::Binary(_) => {
                    let packet = match shard.resolve_packet(&frame) {
                        Ok(packet) => packet,
                        Err(err) => {
                            warn!("[Shard {}] Undecodable frame: {}.", shard.info[0], err);
                            continue;
                        }
                    };
                    match Shard::fulfill(shard, packet, handler) {
                        ShardAction::None => {}
                        ShardAction::Reconnect { resume } => {
                            shard.close_socket();
                            return Ok(LoopOutcome::Reconnect { resume });
                        }
                    }
                }
                _ => {}
            }

            if shard.session.lock().should_disconnect {
                shard.close_socket();
                return Ok(LoopOutcome::Finished);
            }
        }
    }

    // Decides what to do with a received packet; dispatches spawn handler
    // tasks after the sequence is advanced, so ordering is preserved.
    fn fulfill(
        shard: &Arc<Shard>,
        packet: ReceivePacket,
        handler: &Arc<dyn EventHandler>,
    ) -> ShardAction {
        match packet.op {
            Opcodes::Dispatch => {
                {
                    let mut session = shard.session.lock();
                    if let Some(seq) = packet.s {
                        session.seq = Some(seq);
                    }
                }
                if let Some(GatewayEvent::READY) = packet.t {
                    match packet.payload::<ReadyPacket>() {
                        Ok(ready) => {
                            trace!(
                                "[Shard {}] Received READY, session {}.",
                                shard.info[0],
                                ready.session_id
                            );
                            shard.session.lock().id = Some(ready.session_id);
                        }
                        Err(err) => warn!("[Shard {}] Malformed READY: {}.", shard.info[0], err),
                    }
                }
                let task_shard = Arc::clone(shard);
                let task_handler = Arc::clone(handler);
                tokio::spawn(async move {
                    task_handler.on_packet(&task_shard, packet);
                });
                ShardAction::None
            }
            Opcodes::Heartbeat | Opcodes::HeartbeatAck => {
                shard.session.lock().received_ack = true;
                ShardAction::None
            }
            Opcodes::Reconnect => {
                debug!("[Shard {}] Gateway requested a reconnect.", shard.info[0]);
                ShardAction::Reconnect { resume: true }
            }
            Opcodes::InvalidSession => {
                debug!("[Shard {}] Session invalidated by the gateway.", shard.info[0]);
                shard.session.lock().reset();
                ShardAction::Reconnect { resume: false }
            }
            _ => ShardAction::None,
        }
    }

    fn handle_close(&self, frame: Option<CloseFrame>) -> Result<LoopOutcome> {
        if self.session.lock().should_disconnect {
            return Ok(LoopOutcome::Finished);
        }
        let (code, reason) = match frame {
            Some(frame) => (u16::from(frame.code), frame.reason.into_owned()),
            None => (1000, String::new()),
        };
        info!("[Shard {}] Gateway closed with code {}: {}.", self.info[0], code, reason);
        match close_policy(code) {
            ClosePolicy::Fatal(description) => Err(Error::GatewayClosed {
                code,
                reason: if reason.is_empty() { description.to_string() } else { reason },
            }),
            ClosePolicy::Rejoin => {
                self.session.lock().reset();
                Ok(LoopOutcome::Reconnect { resume: false })
            }
            ClosePolicy::Resume => Ok(LoopOutcome::Reconnect { resume: true }),
        }
    }

    async fn heartbeat_loop(shard: Arc<Shard>, generation: u64, interval: Duration) {
        loop {
            sleep(interval).await;
            let seq = {
                let mut session = shard.session.lock();
                if session.generation != generation || session.should_disconnect {
                    return;
                }
                if !session.received_ack {
                    warn!(
                        "[Shard {}] Heartbeat was not acknowledged, forcing a reconnect.",
                        shard.info[0]
                    );
                    drop(session);
                    shard.close_socket();
                    return;
                }
                session.received_ack = false;
                session.seq
            };
            trace!("[Shard {}] Sending heartbeat.", shard.info[0]);
            if let Err(err) = shard.send_payload(&HeartbeatPacket(seq)).await {
                warn!("[Shard {}] Failed to send heartbeat: {}.", shard.info[0], err);
                return;
            }
        }
    }

    /// Identifies this shard with the gateway.
    async fn identify(&self) -> Result<()> {
        debug!("[Shard {}] Identifying with the gateway.", self.info[0]);
        let presence = self.presence.lock().clone();
        self.send_payload(&IdentifyPacket {
            token: self.token.clone(),
            properties: IdentifyProperties::default(),
            compress: false,
            large_threshold: 250,
            shard: self.info,
            presence: Some(presence),
        })
        .await
    }

    /// Changes the presence of the current shard.
    pub async fn update_status(&self, presence: ClientPresence) -> Result<()> {
        self.limiters.status.wait_for().await;
        self.send_payload(&presence).await?;
        *self.presence.lock() = presence;
        Ok(())
    }

    /// Joins, moves between or disconnects from voice channels.
    pub async fn update_voice_state(&self, state: UpdateVoiceState) -> Result<()> {
        self.send_payload(&state).await
    }

    /// Requests offline guild members from the gateway.
    pub async fn request_guild_members(&self, request: RequestGuildMembers) -> Result<()> {
        self.send_payload(&request).await
    }

    /// Sends a payload to the gateway in the negotiated encoding.
    ///
    /// Every outbound frame passes the send limiter and the frame size cap.
    pub async fn send_payload<T: SendablePacket>(&self, payload: &T) -> Result<()> {
        self.limiters.send.wait_for().await;
        let message = match self.encoding {
            Encoding::Json => WebsocketMessage::Text(payload.to_json()?),
            Encoding::Etf => WebsocketMessage::Binary(payload.to_etf()?),
        };
        if message.len() > MAX_PAYLOAD_BYTES {
            return Err(Error::PacketTooLarge(message.len()));
        }
        self.queue(message)
    }

    /// Resolves a websocket message into a ReceivePacket.
    ///
    /// The format is detected from the transport frame type: text frames
    /// are JSON, binary frames are ETF.
    pub fn resolve_packet(&self, message: &WebsocketMessage) -> Result<ReceivePacket> {
        match message {
            WebsocketMessage::Text(text) => serde_json::from_str(text).map_err(Error::from),
            WebsocketMessage::Binary(bytes) => accord_etf::from_bytes(bytes).map_err(Error::from),
            _ => Err(Error::Protocol(String::from("expected a text or binary frame"))),
        }
    }

    fn queue(&self, message: WebsocketMessage) -> Result<()> {
        match self.sender.lock().as_ref() {
            Some(sender) => sender.send(message).map_err(|_| Error::NotConnected),
            None => Err(Error::NotConnected),
        }
    }

    fn close_socket(&self) {
        if let Some(sender) = self.sender.lock().as_ref() {
            let _ = sender.send(WebsocketMessage::Close(None));
        }
    }

    async fn resolve_url(&self) -> Result<String> {
        if let Some(url) = self.gateway_url.lock().clone() {
            return Ok(url);
        }
        if let Some(configured) = &self.configured_url {
            *self.gateway_url.lock() = Some(configured.clone());
            return Ok(configured.clone());
        }
        debug!("[Shard {}] Fetching the gateway URL.", self.info[0]);
        let info: GatewayInfo = self
            .http
            .get(format!("{}/gateway", API_BASE))
            .send()
            .await?
            .json()
            .await?;
        *self.gateway_url.lock() = Some(info.url.clone());
        Ok(info.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanent_close_codes_are_fatal() {
        for code in &[4001u16, 4002, 4003, 4004, 4005, 4008, 4010, 4011] {
            match close_policy(*code) {
                ClosePolicy::Fatal(_) => {}
                other => panic!("code {} should be fatal, got {:?}", code, other),
            }
        }
    }

    #[test]
    fn session_resetting_codes_rejoin() {
        assert_eq!(close_policy(4007), ClosePolicy::Rejoin);
        assert_eq!(close_policy(4009), ClosePolicy::Rejoin);
    }

    #[test]
    fn everything_else_resumes() {
        assert_eq!(close_policy(1000), ClosePolicy::Resume);
        assert_eq!(close_policy(1001), ClosePolicy::Resume);
        assert_eq!(close_policy(4000), ClosePolicy::Resume);
        assert_eq!(close_policy(4006), ClosePolicy::Resume);
    }

    #[tokio::test]
    async fn oversize_payloads_are_refused() {
        let shard = Shard::new(String::from("Bot x"), ShardOptions::default());
        // a status update padded far past the frame cap
        let mut presence = ClientPresence::default();
        presence.game = Some(accord_model::presence::Activity {
            name: "x".repeat(MAX_PAYLOAD_BYTES),
            ..Default::default()
        });
        match shard.send_payload(&presence).await {
            Err(Error::PacketTooLarge(size)) => assert!(size > MAX_PAYLOAD_BYTES),
            other => panic!("expected PacketTooLarge, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn sends_require_a_connection() {
        let shard = Shard::new(String::from("Bot x"), ShardOptions::default());
        match shard.send_payload(&HeartbeatPacket(None)).await {
            Err(Error::NotConnected) => {}
            other => panic!("expected NotConnected, got {:?}", other),
        }
    }
}
