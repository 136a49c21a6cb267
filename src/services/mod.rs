// src/services/mod.rs
pub mod cache;
pub mod daemon;
pub mod explorer;
pub mod fiat;
pub mod image_gen;
pub mod pools;
pub mod report;
pub mod tradeogre;

use std::error::Error as StdError;

pub type Result<T> = std::result::Result<T, Box<dyn StdError + Send + Sync>>;
