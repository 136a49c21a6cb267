// src/handlers/image.rs
use log::{error, info};
use reqwest::Client;

use super::Reply;
use crate::services::image_gen::{self, IMAGE_PROMPT};

pub async fn handle(client: &Client, openai: &str, api_key: &str) -> Reply {
    info!("Handling image generation request");
    match image_gen::generate_image(client, openai, api_key, IMAGE_PROMPT).await {
        Ok(file) => Reply::Image(file),
        Err(e) => {
            error!("Error generating image: {}", e);
            Reply::Plain(e.user_message().to_string())
        }
    }
}
