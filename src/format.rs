// src/format.rs
//! Message rendering for both chat platforms.
//!
//! All text goes through [`MessageBuilder`], which applies the dialect's
//! escaping to every literal and value so no call site escapes by hand.

use crate::models::{DaemonStatus, NetworkReport, PoolEntry};

const EXPLORER_SEARCH: &str = "https://explorer.arqma.com/search?value=";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Telegram MarkdownV2.
    Telegram,
    /// Discord markdown.
    Discord,
}

impl Dialect {
    pub fn command_prefix(self) -> char {
        match self {
            Dialect::Telegram => '/',
            Dialect::Discord => '!',
        }
    }

    pub fn escape(self, text: &str) -> String {
        match self {
            Dialect::Discord => text.to_string(),
            Dialect::Telegram => {
                let mut out = String::with_capacity(text.len());
                for c in text.chars() {
                    if matches!(
                        c,
                        '_' | '*' | '[' | ']' | '(' | ')' | '~' | '`' | '>' | '#' | '+' | '-' | '='
                            | '|' | '{' | '}' | '.' | '!' | '\\'
                    ) {
                        out.push('\\');
                    }
                    out.push(c);
                }
                out
            }
        }
    }

    fn escape_url(self, url: &str) -> String {
        match self {
            Dialect::Discord => url.to_string(),
            Dialect::Telegram => url.replace('\\', "\\\\").replace(')', "\\)"),
        }
    }

    pub fn bold(self, text: &str) -> String {
        match self {
            Dialect::Telegram => format!("*{}*", self.escape(text)),
            Dialect::Discord => format!("**{}**", text),
        }
    }

    pub fn link(self, label: &str, url: &str) -> String {
        format!("[{}]({})", self.escape(label), self.escape_url(url))
    }
}

pub struct MessageBuilder {
    dialect: Dialect,
    lines: Vec<String>,
}

impl MessageBuilder {
    pub fn new(dialect: Dialect) -> Self {
        MessageBuilder {
            dialect,
            lines: Vec::new(),
        }
    }

    /// `emoji **title**` followed by an empty line.
    pub fn title(mut self, emoji: &str, title: &str) -> Self {
        self.lines.push(format!("{} {}", emoji, self.dialect.bold(title)));
        self.lines.push(String::new());
        self
    }

    /// `emoji **label**: value`
    pub fn field(mut self, emoji: &str, label: &str, value: &str) -> Self {
        self.lines.push(format!(
            "{} {}: {}",
            emoji,
            self.dialect.bold(label),
            self.dialect.escape(value)
        ));
        self
    }

    /// `emoji **label**: [text](url)`
    pub fn link_field(mut self, emoji: &str, label: &str, text: &str, url: &str) -> Self {
        self.lines.push(format!(
            "{} {}: {}",
            emoji,
            self.dialect.bold(label),
            self.dialect.link(text, url)
        ));
        self
    }

    /// `emoji [label](url)`
    pub fn link(mut self, emoji: &str, label: &str, url: &str) -> Self {
        self.lines.push(format!("{} {}", emoji, self.dialect.link(label, url)));
        self
    }

    /// `emoji <prefix>command - description`
    pub fn command(mut self, emoji: &str, command: &str, description: &str) -> Self {
        let text = format!("{}{} - {}", self.dialect.command_prefix(), command, description);
        self.lines.push(format!("{} {}", emoji, self.dialect.escape(&text)));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.lines.push(self.dialect.escape(text));
        self
    }

    pub fn build(self) -> String {
        self.lines.join("\n").trim_end().to_string()
    }
}

pub fn network_report(dialect: Dialect, report: &NetworkReport) -> String {
    let mut message = MessageBuilder::new(dialect)
        .title("🔗", "Arqma Network Stats")
        .field("📊", "Network Height", &report.network.height.to_string())
        .field("💻", "Network Hashrate", &format!("{:.2} MH/s", report.network.hashrate))
        .field("⚙️", "Network Difficulty", &report.network.difficulty.to_string())
        .field(
            "🪙",
            "Total Emission (Coinbase)",
            &format!("{} ARQ", report.emission.display_amount()),
        )
        .field(
            "💰",
            "TO Price",
            &format!("{:.8} BTC ({} sat)", report.price.price_btc, report.price.price_sat),
        );

    if let Some(volume) = &report.volume {
        message = message.field(
            "📈",
            "24h Volume",
            &format!("{:.2} ARQ (${:.2})", volume.native, volume.usd),
        );
    }

    message.build()
}

pub fn daemon_info(dialect: Dialect, status: &DaemonStatus) -> String {
    let search_url = format!("{}{}", EXPLORER_SEARCH, status.top_block_hash);
    MessageBuilder::new(dialect)
        .title("🛠️", "Daemon Info")
        .field("💻", "Network Hashrate", &format!("{:.2} MH/s", status.hashrate_mhs()))
        .field("📊", "Height", &status.height.to_string())
        .link_field("🔗", "Top Block Hash", &status.top_block_hash, &search_url)
        .field("🔄", "Version", &status.version)
        .field("💾", "Database Size", &format!("{:.2} GB", status.database_size_gb()))
        .build()
}

/// `A: 2.50 MH/s` at or above 1 000 000 H/s, KH/s below.
pub fn pool_hashrate(hashrate: f64) -> String {
    if hashrate >= 1_000_000.0 {
        format!("{:.2} MH/s", hashrate / 1_000_000.0)
    } else {
        format!("{:.2} KH/s", hashrate / 1_000.0)
    }
}

/// Pools in the order given; the fetcher already sorted them.
pub fn pools(dialect: Dialect, pools: &[PoolEntry]) -> String {
    pools
        .iter()
        .fold(MessageBuilder::new(dialect).title("🔗", "Arqma Pools"), |message, pool| {
            message.field("⛏️", &pool.name, &pool_hashrate(pool.hashrate))
        })
        .build()
}

pub fn links(dialect: Dialect) -> String {
    MessageBuilder::new(dialect)
        .title("🔗", "Important Links")
        .link("🌐", "ArQmA website", "https://arqma.com/")
        .link("📂", "Github", "https://github.com/arqma")
        .link("📖", "Documentation", "https://github.com/arqma/arqma/wiki/")
        .link("🖥️", "GUI Wallet", "https://github.com/arqma/arqma-electron-wallet/releases/")
        .link("📝", "Paper Wallet", "https://generate.arqma.com/")
        .link("⛏️", "Pool stats", "https://miningpoolstats.stream/arqma")
        .link("💬", "Telegram", "https://telegram.arqma.com/")
        .link("🎮", "Discord", "https://chat.arqma.com/")
        .build()
}

pub fn help(dialect: Dialect) -> String {
    MessageBuilder::new(dialect)
        .title("📜", "Available Commands")
        .command("📊", "network", "Get Arqma network statistics")
        .command("🔗", "links", "Display important Arqma-related links")
        .command("⛏️", "pools", "Display Arqma mining pools with hashrates")
        .command("🛠️", "daemon_info", "Get detailed Arqma daemon information")
        .command("🎨", "generate_image", "Generate an AI image of Arqma")
        .command("❓", "helpme", "Show this help message")
        .build()
}

pub fn welcome(dialect: Dialect) -> String {
    let intro = MessageBuilder::new(dialect)
        .text("👋 Welcome to the Arqma community bot!")
        .build();
    format!("{}\n\n{}", intro, help(dialect))
}
