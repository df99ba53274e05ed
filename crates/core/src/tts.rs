//! Speech synthesis seam.
//!
//! The platform treats text-to-speech as an external service: the core hands
//! text out and gets audio bytes back. The OpenAI-backed client covers the
//! hosted deployment; tests substitute the trait.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;

/// Default synthesis voice.
pub const DEFAULT_VOICE: &str = "nova";
/// Default playback speed.
pub const DEFAULT_SPEED: f32 = 1.0;

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Renders `text` as spoken audio (mp3).
    async fn synthesize(&self, text: &str, voice: &str, speed: f32) -> Result<Bytes>;
}

/// [`SpeechSynthesizer`] backed by the OpenAI audio API.
pub struct OpenAISpeechClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAISpeechClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
            model,
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAISpeechClient {
    async fn synthesize(&self, text: &str, voice: &str, speed: f32) -> Result<Bytes> {
        let response = self
            .http
            .post(format!("{}/audio/speech", self.base_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "input": text,
                "voice": voice,
                "speed": speed,
                "response_format": "mp3",
            }))
            .send()
            .await
            .context("speech request failed")?
            .error_for_status()
            .context("speech service returned an error status")?;

        let audio = response
            .bytes()
            .await
            .context("failed reading speech audio body")?;
        Ok(audio)
    }
}
