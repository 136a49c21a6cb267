// src/platforms/discord.rs
use anyhow::{anyhow, Context, Result};
use log::{debug, error, info, warn};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::TcpStream;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tungstenite::protocol::CloseFrame;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message as WsMessage, WebSocket};

use crate::format::Dialect;
use crate::handlers::Reply;
use crate::routes::{Inbound, Router};

const INTENT_GUILDS: u64 = 1 << 0;
const INTENT_GUILD_MESSAGES: u64 = 1 << 9;
const INTENT_DIRECT_MESSAGES: u64 = 1 << 12;
const INTENT_MESSAGE_CONTENT: u64 = 1 << 15;
const INTENTS: u64 = INTENT_GUILDS | INTENT_GUILD_MESSAGES | INTENT_DIRECT_MESSAGES | INTENT_MESSAGE_CONTENT;

const READ_TIMEOUT: Duration = Duration::from_secs(1);
const RECONNECT_PAUSE: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct GatewayPayload {
    op: u8,
    #[serde(default)]
    d: Value,
    s: Option<u64>,
    t: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    pub id: String,
    #[serde(default)]
    pub bot: bool,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelMessage {
    pub channel_id: String,
    pub author: Author,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug)]
pub enum GatewayEvent {
    Ready { user: Author },
    MessageCreate(ChannelMessage),
}

/// What the gateway thread should do after reading one payload.
#[derive(Debug)]
enum Action {
    Hello { heartbeat_interval: Duration },
    HeartbeatNow,
    HeartbeatAck,
    Dispatch(GatewayEvent),
    Reconnect(&'static str),
    Nothing,
}

fn interpret(payload: GatewayPayload) -> Action {
    match payload.op {
        0 => match payload.t.as_deref() {
            Some("READY") => match serde_json::from_value::<Author>(payload.d["user"].clone()) {
                Ok(user) => Action::Dispatch(GatewayEvent::Ready { user }),
                Err(e) => {
                    warn!("Malformed READY payload: {}", e);
                    Action::Nothing
                }
            },
            Some("MESSAGE_CREATE") => match serde_json::from_value::<ChannelMessage>(payload.d) {
                Ok(message) => Action::Dispatch(GatewayEvent::MessageCreate(message)),
                Err(e) => {
                    warn!("Malformed MESSAGE_CREATE payload: {}", e);
                    Action::Nothing
                }
            },
            _ => Action::Nothing,
        },
        1 => Action::HeartbeatNow,
        7 => Action::Reconnect("server requested reconnect"),
        9 => Action::Reconnect("invalid session"),
        10 => match payload.d["heartbeat_interval"].as_u64() {
            Some(ms) => Action::Hello {
                heartbeat_interval: Duration::from_millis(ms),
            },
            None => Action::Reconnect("hello without heartbeat interval"),
        },
        11 => Action::HeartbeatAck,
        _ => Action::Nothing,
    }
}

fn identify(token: &str) -> WsMessage {
    WsMessage::Text(
        json!({
            "op": 2,
            "d": {
                "token": token,
                "intents": INTENTS,
                "properties": { "os": std::env::consts::OS, "browser": "arqma_bot", "device": "arqma_bot" }
            }
        })
        .to_string(),
    )
}

fn heartbeat(sequence: Option<u64>) -> WsMessage {
    WsMessage::Text(json!({ "op": 1, "d": sequence }).to_string())
}

fn set_read_timeout(socket: &WebSocket<MaybeTlsStream<TcpStream>>) -> Result<()> {
    match socket.get_ref() {
        MaybeTlsStream::Plain(stream) => stream.set_read_timeout(Some(READ_TIMEOUT))?,
        MaybeTlsStream::Rustls(stream) => stream.get_ref().set_read_timeout(Some(READ_TIMEOUT))?,
        _ => warn!("Unknown gateway stream type, heartbeats may be late"),
    }
    Ok(())
}

/// Heartbeat schedule and ACK bookkeeping for one session.
#[derive(Debug)]
struct Heartbeat {
    interval: Option<Duration>,
    next: Instant,
    awaiting_ack: bool,
}

impl Heartbeat {
    fn new(now: Instant) -> Self {
        Heartbeat {
            interval: None,
            next: now,
            awaiting_ack: false,
        }
    }

    fn start(&mut self, interval: Duration, now: Instant) {
        self.interval = Some(interval);
        self.next = now + interval;
        self.awaiting_ack = false;
    }

    /// A heartbeat went out outside the schedule (op 1 from the server).
    fn sent(&mut self) {
        self.awaiting_ack = true;
    }

    fn acknowledged(&mut self) {
        self.awaiting_ack = false;
    }

    /// `Ok(true)` when a heartbeat is due now. A heartbeat coming due while the
    /// previous one is still unacknowledged means the connection is dead.
    fn poll(&mut self, now: Instant) -> Result<bool> {
        let Some(interval) = self.interval else {
            return Ok(false);
        };
        if now < self.next {
            return Ok(false);
        }
        if self.awaiting_ack {
            return Err(anyhow!("no heartbeat ACK within {:?}", interval));
        }
        self.next = now + interval;
        self.awaiting_ack = true;
        Ok(true)
    }
}

/// How a session ended without an error worth reconnecting over.
#[derive(Debug, PartialEq)]
enum SessionEnd {
    ReceiverClosed,
    Refused(String),
}

/// Close codes after which identifying again cannot succeed: bad token,
/// sharding and intent problems.
fn close_is_fatal(code: u16) -> bool {
    matches!(code, 4004 | 4010..=4014)
}

fn on_close(frame: Option<CloseFrame>) -> Result<SessionEnd> {
    match frame {
        Some(frame) if close_is_fatal(u16::from(frame.code)) => Ok(SessionEnd::Refused(format!(
            "{} {}",
            u16::from(frame.code),
            frame.reason
        ))),
        Some(frame) => Err(anyhow!("gateway closed: {} {}", u16::from(frame.code), frame.reason)),
        None => Err(anyhow!("gateway closed without a close frame")),
    }
}

/// One gateway session: connect, identify, heartbeat and forward events until
/// the connection drops or the receiving side goes away.
fn gateway_session(url: &str, token: &str, events: &mpsc::Sender<GatewayEvent>) -> Result<SessionEnd> {
    let (mut socket, _) = tungstenite::connect(url).context("cannot connect to Discord gateway")?;
    set_read_timeout(&socket)?;
    info!("Connected to Discord gateway");

    let mut sequence: Option<u64> = None;
    let mut heartbeats = Heartbeat::new(Instant::now());

    loop {
        if heartbeats.poll(Instant::now())? {
            socket.send(heartbeat(sequence))?;
        }

        let text = match socket.read() {
            Ok(WsMessage::Text(text)) => text,
            Ok(WsMessage::Close(frame)) => return on_close(frame),
            Ok(_) => continue,
            Err(tungstenite::Error::Io(e))
                if matches!(e.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut) =>
            {
                continue
            }
            Err(e) => return Err(e.into()),
        };

        let payload: GatewayPayload = match serde_json::from_str(&text) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Unreadable gateway payload: {}", e);
                continue;
            }
        };
        if payload.s.is_some() {
            sequence = payload.s;
        }

        match interpret(payload) {
            Action::Hello { heartbeat_interval } => {
                debug!("Gateway heartbeat interval {:?}", heartbeat_interval);
                heartbeats.start(heartbeat_interval, Instant::now());
                socket.send(identify(token))?;
            }
            Action::HeartbeatNow => {
                socket.send(heartbeat(sequence))?;
                heartbeats.sent();
            }
            Action::HeartbeatAck => heartbeats.acknowledged(),
            Action::Dispatch(event) => {
                if events.blocking_send(event).is_err() {
                    let _ = socket.close(None);
                    return Ok(SessionEnd::ReceiverClosed);
                }
            }
            Action::Reconnect(reason) => return Err(anyhow!("gateway asked to reconnect: {}", reason)),
            Action::Nothing => {}
        }
    }
}

fn gateway_thread(url: String, token: String, events: mpsc::Sender<GatewayEvent>) {
    loop {
        match gateway_session(&url, &token, &events) {
            Ok(SessionEnd::ReceiverClosed) => {
                info!("Discord event receiver closed, stopping gateway");
                return;
            }
            Ok(SessionEnd::Refused(reason)) => {
                error!("Discord gateway refused the session, not reconnecting: {}", reason);
                return;
            }
            Err(e) => {
                warn!("Discord gateway session ended: {:#}", e);
                if events.is_closed() {
                    return;
                }
                thread::sleep(RECONNECT_PAUSE);
            }
        }
    }
}

pub struct DiscordBot {
    client: Client,
    api: String,
    gateway_url: String,
    token: String,
    router: Arc<Router>,
}

impl DiscordBot {
    pub fn new(client: Client, api: &str, gateway_url: &str, token: &str, router: Arc<Router>) -> Self {
        DiscordBot {
            client,
            api: api.trim_end_matches('/').to_string(),
            gateway_url: gateway_url.to_string(),
            token: token.to_string(),
            router,
        }
    }

    fn authorization(&self) -> String {
        format!("Bot {}", self.token)
    }

    pub async fn send_reply(&self, channel_id: &str, reply: Reply) -> Result<()> {
        let url = format!("{}/channels/{}/messages", self.api, channel_id);
        let request = match reply {
            Reply::Text(content) | Reply::Plain(content) => self
                .client
                .post(&url)
                .header("Authorization", self.authorization())
                .json(&json!({ "content": content })),
            Reply::Image(file) => {
                let bytes = tokio::fs::read(file.path())
                    .await
                    .context("cannot read generated image")?;
                let image = Part::bytes(bytes).file_name("arqma.png").mime_str("image/png")?;
                let form = Form::new()
                    .text("payload_json", json!({ "content": "" }).to_string())
                    .part("files[0]", image);
                self.client
                    .post(&url)
                    .header("Authorization", self.authorization())
                    .multipart(form)
            }
        };

        let response = request.send().await.context("Discord send request failed")?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Discord rejected message ({}): {}", status, body));
        }
        Ok(())
    }

    pub async fn handle_message(&self, message: ChannelMessage, own_id: &str) -> Result<()> {
        let inbound = Inbound {
            text: &message.content,
            author_id: &message.author.id,
            author_is_bot: message.author.bot,
        };
        if let Some(reply) = self.router.route(Dialect::Discord, &inbound, own_id).await {
            self.send_reply(&message.channel_id, reply).await?;
        }
        Ok(())
    }

    /// Start the gateway thread and answer messages until it stops.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let (tx, mut rx) = mpsc::channel(64);
        let url = self.gateway_url.clone();
        let token = self.token.clone();
        thread::Builder::new()
            .name("discord-gateway".to_string())
            .spawn(move || gateway_thread(url, token, tx))
            .context("cannot start Discord gateway thread")?;

        let mut own_id = String::new();
        while let Some(event) = rx.recv().await {
            match event {
                GatewayEvent::Ready { user } => {
                    info!(
                        "Discord bot is ready as {}",
                        user.username.as_deref().unwrap_or("unknown")
                    );
                    own_id = user.id;
                }
                GatewayEvent::MessageCreate(message) => {
                    let bot = Arc::clone(&self);
                    let own_id = own_id.clone();
                    tokio::spawn(async move {
                        if let Err(e) = bot.handle_message(message, &own_id).await {
                            error!("Failed to answer Discord message: {:#}", e);
                        }
                    });
                }
            }
        }

        Err(anyhow!("Discord gateway stopped"))
    }
}
