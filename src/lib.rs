// src/lib.rs

pub mod config;
pub mod format;
pub mod handlers;
pub mod models;
pub mod platforms;
pub mod routes;
pub mod services;
