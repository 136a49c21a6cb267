// src/handlers/static_text.rs
use super::Reply;
use crate::format::{self, Dialect};

pub fn links(dialect: Dialect) -> Reply {
    Reply::Text(format::links(dialect))
}

pub fn help(dialect: Dialect) -> Reply {
    Reply::Text(format::help(dialect))
}

pub fn start(dialect: Dialect) -> Reply {
    Reply::Text(format::welcome(dialect))
}
