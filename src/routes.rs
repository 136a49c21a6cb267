// src/routes.rs
use log::{debug, info};

use crate::format::Dialect;
use crate::handlers::{self, Reply};
use crate::services::report::DataSources;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Network,
    Links,
    Pools,
    DaemonInfo,
    Help,
    GenerateImage,
    Start,
}

impl Command {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "network" => Some(Command::Network),
            "links" => Some(Command::Links),
            "pools" => Some(Command::Pools),
            "daemon_info" => Some(Command::DaemonInfo),
            "helpme" => Some(Command::Help),
            "generate_image" => Some(Command::GenerateImage),
            "start" => Some(Command::Start),
            _ => None,
        }
    }

    /// Telegram: the first token, `/name` or `/name@BotName`.
    pub fn parse_telegram(text: &str) -> Option<Self> {
        let token = text.split_whitespace().next()?;
        let name = token.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        Self::from_name(name)
    }

    /// Discord: the whole message, `!name`, case-insensitive. There is no `!start`.
    pub fn parse_discord(text: &str) -> Option<Self> {
        let content = text.trim().to_lowercase();
        let name = content.strip_prefix('!')?;
        match Self::from_name(name)? {
            Command::Start => None,
            command => Some(command),
        }
    }

    pub fn parse(dialect: Dialect, text: &str) -> Option<Self> {
        match dialect {
            Dialect::Telegram => Self::parse_telegram(text),
            Dialect::Discord => Self::parse_discord(text),
        }
    }
}

/// An inbound chat message as seen by the router.
#[derive(Debug, Clone)]
pub struct Inbound<'a> {
    pub text: &'a str,
    pub author_id: &'a str,
    pub author_is_bot: bool,
}

pub struct Router {
    sources: DataSources,
    openai_api_key: String,
}

impl Router {
    pub fn new(sources: DataSources, openai_api_key: String) -> Self {
        Router {
            sources,
            openai_api_key,
        }
    }

    /// The command this message asks for, unless it came from a bot (ourselves included).
    pub fn recognize(dialect: Dialect, message: &Inbound<'_>, own_id: &str) -> Option<Command> {
        if message.author_is_bot || message.author_id == own_id {
            debug!("Ignoring message from bot account {}", message.author_id);
            return None;
        }
        Command::parse(dialect, message.text)
    }

    pub async fn dispatch(&self, command: Command, dialect: Dialect) -> Reply {
        info!("Dispatching {:?} for {:?}", command, dialect);
        match command {
            Command::Network => handlers::network::handle(&self.sources, dialect).await,
            Command::DaemonInfo => handlers::daemon::handle(&self.sources, dialect).await,
            Command::Pools => handlers::pools::handle(&self.sources, dialect).await,
            Command::Links => handlers::static_text::links(dialect),
            Command::Help => handlers::static_text::help(dialect),
            Command::Start => handlers::static_text::start(dialect),
            Command::GenerateImage => {
                handlers::image::handle(
                    &self.sources.client,
                    &self.sources.endpoints.openai,
                    &self.openai_api_key,
                )
                .await
            }
        }
    }

    /// Recognize and dispatch in one step; `None` when the message is ignored.
    pub async fn route(&self, dialect: Dialect, message: &Inbound<'_>, own_id: &str) -> Option<Reply> {
        let command = Self::recognize(dialect, message, own_id)?;
        Some(self.dispatch(command, dialect).await)
    }
}
