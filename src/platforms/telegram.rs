// src/platforms/telegram.rs
use anyhow::{anyhow, Context, Result};
use log::{debug, error, info, warn};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::format::Dialect;
use crate::handlers::Reply;
use crate::routes::{Inbound, Router};

const POLL_TIMEOUT_SECS: u64 = 30;
const POLL_ERROR_PAUSE: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

pub struct TelegramBot {
    client: Client,
    api: String,
    router: Arc<Router>,
}

impl TelegramBot {
    pub fn new(client: Client, base_url: &str, token: &str, router: Arc<Router>) -> Self {
        TelegramBot {
            client,
            api: format!("{}/bot{}", base_url.trim_end_matches('/'), token),
            router,
        }
    }

    fn unwrap_response<T>(method: &str, response: ApiResponse<T>) -> Result<T> {
        if !response.ok {
            return Err(anyhow!(
                "Telegram {} failed: {}",
                method,
                response.description.unwrap_or_else(|| "no description".to_string())
            ));
        }
        response
            .result
            .ok_or_else(|| anyhow!("Telegram {} returned no result", method))
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: serde_json::Value) -> Result<T> {
        let response: ApiResponse<T> = self
            .client
            .post(format!("{}/{}", self.api, method))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Telegram {} request failed", method))?
            .json()
            .await
            .with_context(|| format!("Telegram {} returned malformed JSON", method))?;
        Self::unwrap_response(method, response)
    }

    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", json!({})).await
    }

    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": POLL_TIMEOUT_SECS,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    pub async fn send_reply(&self, chat_id: i64, reply: Reply) -> Result<()> {
        match reply {
            Reply::Text(text) => {
                let _: serde_json::Value = self
                    .call(
                        "sendMessage",
                        json!({
                            "chat_id": chat_id,
                            "text": text,
                            "parse_mode": "MarkdownV2",
                            "disable_web_page_preview": true,
                        }),
                    )
                    .await?;
            }
            Reply::Plain(text) => {
                let _: serde_json::Value = self
                    .call("sendMessage", json!({ "chat_id": chat_id, "text": text }))
                    .await?;
            }
            Reply::Image(file) => {
                let bytes = tokio::fs::read(file.path())
                    .await
                    .context("cannot read generated image")?;
                let photo = Part::bytes(bytes).file_name("arqma.png").mime_str("image/png")?;
                let form = Form::new().text("chat_id", chat_id.to_string()).part("photo", photo);
                let response: ApiResponse<serde_json::Value> = self
                    .client
                    .post(format!("{}/sendPhoto", self.api))
                    .multipart(form)
                    .send()
                    .await
                    .context("Telegram sendPhoto request failed")?
                    .json()
                    .await?;
                Self::unwrap_response("sendPhoto", response)?;
                // `file` is dropped here, which removes it from disk.
            }
        }
        Ok(())
    }

    /// Route one update and send the reply. Unrecognized messages are ignored.
    pub async fn handle_update(&self, update: Update, own_id: &str) -> Result<()> {
        let Some(message) = update.message else {
            return Ok(());
        };
        let (Some(text), Some(from)) = (message.text.as_deref(), message.from.as_ref()) else {
            return Ok(());
        };

        let author_id = from.id.to_string();
        let inbound = Inbound {
            text,
            author_id: &author_id,
            author_is_bot: from.is_bot,
        };
        if let Some(reply) = self.router.route(Dialect::Telegram, &inbound, own_id).await {
            self.send_reply(message.chat.id, reply).await?;
        }
        Ok(())
    }

    /// Long-poll for updates forever; each update is handled in its own task.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let me = self.get_me().await.context("Telegram getMe failed")?;
        let own_id = me.id.to_string();
        info!(
            "Telegram bot is ready as @{}",
            me.username.as_deref().unwrap_or("unknown")
        );

        let mut offset = 0;
        loop {
            let updates = match self.get_updates(offset).await {
                Ok(updates) => updates,
                Err(e) => {
                    warn!("Telegram polling error: {:#}", e);
                    tokio::time::sleep(POLL_ERROR_PAUSE).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                debug!("Telegram update {}", update.update_id);
                let bot = Arc::clone(&self);
                let own_id = own_id.clone();
                tokio::spawn(async move {
                    if let Err(e) = bot.handle_update(update, &own_id).await {
                        error!("Failed to answer Telegram message: {:#}", e);
                    }
                });
            }
        }
    }
}
