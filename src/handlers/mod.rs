// src/handlers/mod.rs
pub mod daemon;
pub mod image;
pub mod network;
pub mod pools;
pub mod static_text;

use tempfile::NamedTempFile;

/// What a command produces for the platform to send.
#[derive(Debug)]
pub enum Reply {
    /// Markup in the requesting platform's dialect.
    Text(String),
    /// A plain, unformatted line such as a failure notice.
    Plain(String),
    /// A generated image; the file is deleted when the reply is dropped.
    Image(NamedTempFile),
}

impl Reply {
    pub fn text(&self) -> Option<&str> {
        match self {
            Reply::Text(s) | Reply::Plain(s) => Some(s.as_str()),
            Reply::Image(_) => None,
        }
    }
}
