// src/services/image_gen.rs
use log::{error, info, warn};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::io::Write;
use tempfile::NamedTempFile;

pub const IMAGE_PROMPT: &str =
    "A futuristic digital artwork of the ArQmA cryptocurrency network: glowing blockchain nodes \
     connected across a dark blue space, with the ArQmA logo at the center";
pub const BILLING_LIMIT_MESSAGE: &str =
    "Image generation is unavailable right now: the billing limit has been reached.";
pub const IMAGE_FAILURE: &str = "Failed to generate image.";

#[derive(Debug)]
pub enum ImageError {
    BillingLimit,
    Failed(String),
}

impl ImageError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ImageError::BillingLimit => BILLING_LIMIT_MESSAGE,
            ImageError::Failed(_) => IMAGE_FAILURE,
        }
    }
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ImageError::BillingLimit => write!(f, "image provider billing limit reached"),
            ImageError::Failed(reason) => write!(f, "image generation failed: {}", reason),
        }
    }
}

impl std::error::Error for ImageError {}

impl From<reqwest::Error> for ImageError {
    fn from(e: reqwest::Error) -> Self {
        ImageError::Failed(e.to_string())
    }
}

impl From<std::io::Error> for ImageError {
    fn from(e: std::io::Error) -> Self {
        ImageError::Failed(e.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ProviderError,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    #[serde(default)]
    message: String,
    code: Option<String>,
}

/// Request one image for `prompt` and download it into a temporary file.
///
/// The returned file is removed when it is dropped, whether or not it was sent.
pub async fn generate_image(
    client: &Client,
    openai: &str,
    api_key: &str,
    prompt: &str,
) -> Result<NamedTempFile, ImageError> {
    let url = format!("{}/v1/images/generations", openai);
    info!("Requesting generated image from {}", url);

    let response = client
        .post(&url)
        .bearer_auth(api_key)
        .json(&json!({
            "model": "dall-e-3",
            "prompt": prompt,
            "n": 1,
            "size": "1024x1024",
        }))
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(classify_provider_error(status.as_u16(), &body));
    }

    let generated: GenerationResponse = serde_json::from_str(&body)
        .map_err(|e| ImageError::Failed(format!("unexpected response: {}", e)))?;
    let image_url = generated
        .data
        .into_iter()
        .find_map(|image| image.url)
        .ok_or_else(|| ImageError::Failed("response has no image url".to_string()))?;

    info!("Downloading generated image");
    let bytes = client
        .get(&image_url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    let mut file = tempfile::Builder::new()
        .prefix("arqma-image-")
        .suffix(".png")
        .tempfile()?;
    file.write_all(&bytes)?;
    file.flush()?;
    info!("Saved generated image ({} bytes) to {}", bytes.len(), file.path().display());

    Ok(file)
}

fn classify_provider_error(status: u16, body: &str) -> ImageError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let err = envelope.error;
            let billing = err.message.to_lowercase().contains("billing limit")
                || err.code.as_deref() == Some("billing_hard_limit_reached");
            if billing {
                warn!("Image provider billing limit reached: {}", err.message);
                ImageError::BillingLimit
            } else {
                error!("Image provider error ({}): {}", status, err.message);
                ImageError::Failed(err.message)
            }
        }
        Err(_) => {
            error!("Image provider error ({}): {}", status, body);
            ImageError::Failed(format!("status {}", status))
        }
    }
}
