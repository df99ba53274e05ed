//! Realtime transport session minting.
//!
//! The realtime audio transport itself (peer connection, media, data
//! channel) lives on the client; the server's only touch point is minting a
//! short-lived session with the provider and handing the bearer token back.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

/// Sampling temperature for the realtime tutor.
const REALTIME_TEMPERATURE: f32 = 0.6;

/// A freshly minted transport session.
#[derive(Debug, Clone)]
pub struct MintedSession {
    /// Bearer token the client uses to establish the media connection.
    pub token: String,
    /// The provider's id for the session, for log correlation.
    pub provider_session_id: Option<String>,
}

#[derive(Deserialize)]
struct ProviderSessionResponse {
    client_secret: ProviderClientSecret,
    id: Option<String>,
}

#[derive(Deserialize)]
struct ProviderClientSecret {
    value: String,
}

pub struct RealtimeSessionClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    voice: String,
}

impl RealtimeSessionClient {
    pub fn new(api_key: String, base_url: String, model: String, voice: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
            model,
            voice,
        }
    }

    /// Mints a session configured with the given instruction preamble.
    /// `tools` switches the session into routed mode with `tool_choice`
    /// forced, for lessons where the transport must never speak on its own.
    pub async fn mint(
        &self,
        instructions: &str,
        use_vad: bool,
        tools: Option<Value>,
    ) -> Result<MintedSession> {
        let payload = session_payload(
            &self.model,
            &self.voice,
            instructions,
            use_vad,
            tools,
        );
        debug!(model = %self.model, use_vad = use_vad, "minting realtime session");

        let response = self
            .http
            .post(format!("{}/realtime/sessions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("realtime session request failed")?
            .error_for_status()
            .context("realtime provider rejected the session request")?;

        let session: ProviderSessionResponse = response
            .json()
            .await
            .context("malformed realtime session response")?;

        info!(provider_session_id = ?session.id, "realtime session minted");
        Ok(MintedSession {
            token: session.client_secret.value,
            provider_session_id: session.id,
        })
    }
}

/// Builds the provider session configuration. Pure so the shape is testable
/// without the network.
fn session_payload(
    model: &str,
    voice: &str,
    instructions: &str,
    use_vad: bool,
    tools: Option<Value>,
) -> Value {
    let mut payload = json!({
        "model": model,
        "voice": voice,
        "instructions": instructions,
        "modalities": ["text", "audio"],
        "input_audio_transcription": { "model": "whisper-1" },
        "temperature": REALTIME_TEMPERATURE,
    });

    if use_vad {
        payload["turn_detection"] = json!({
            "type": "server_vad",
            "threshold": 0.8,
            "prefix_padding_ms": 500,
            "silence_duration_ms": 3000,
        });
    }

    if let Some(tools) = tools {
        payload["tools"] = tools;
        // Forced tool use keeps the routed session from free-speaking.
        payload["tool_choice"] = json!("required");
    }

    payload
}

/// The tool declarations for the listener-mode (multi-part) lesson: the
/// structured advancement capability replaces free-form speech.
pub fn lesson2_tools() -> Value {
    json!([
        {
            "type": "function",
            "name": "ignore_noise",
            "description": "CALL THIS if the audio is silence, background noise, coughing, or irrelevant sounds. DO NOT SPEAK.",
            "parameters": { "type": "object", "properties": {} }
        },
        {
            "type": "function",
            "name": "process_student_answer",
            "description": "CALL THIS when the user speaks a deliberate attempt at an answer (even if wrong).",
            "parameters": {
                "type": "object",
                "properties": {
                    "transcript": {
                        "type": "string",
                        "description": "The text transcription of what the user said"
                    }
                },
                "required": ["transcript"]
            }
        }
    ])
}
