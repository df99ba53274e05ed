//! The lesson conversation state machine.
//!
//! One parameterized driver replaces the historical pair of near-identical
//! client state machines: the turn evaluator is pluggable (legacy heuristics
//! or the multi-agent analysis pipeline), and the rest of the machine (turn
//! gating, advancement, block-boundary resets, completion) is shared.

pub mod driver;
pub mod evaluators;

pub use driver::{LessonDriver, LessonProgress, TurnGate};
pub use evaluators::{AnalysisEvaluator, HeuristicEvaluator};

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Every this many advances the realtime session is torn down and reopened.
/// The instruction channel accumulates drift across many turns, so periodic
/// reconnection is a correctness measure, not an optimization.
pub const QUESTION_BLOCK_SIZE: u32 = 5;

/// How long to wait between closing the old channel and opening its
/// replacement, so the transport settles before the new session starts.
pub const RESET_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Events arriving from the realtime transport.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A completed transcription of the student's speech.
    UserTranscript(String),
    /// A completed transcript of the assistant's spoken reply.
    AssistantTranscript(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Active,
    Ended,
    Error,
}

/// Updates the driver emits for the UI layer to consume.
#[derive(Debug, Clone, PartialEq)]
pub enum LessonUpdate {
    Connection(ConnectionState),
    UserMessage(String),
    AssistantMessage(String),
    Progress {
        question_index: u32,
        correct: u32,
        incorrect: u32,
    },
    /// Text to hand to the speech-synthesis service (multi-part lessons,
    /// where the transport is listen-only).
    Speak(String),
    /// The lesson is over; the UI triggers the closing flow.
    Completed,
}

/// The lesson variant the driver is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonTrack {
    /// The 52-question single-track lesson; the tutor asks over the channel.
    Simple,
    /// The multi-part lesson; the channel only listens and speech goes
    /// through synthesis.
    Parts,
}

/// One student utterance as seen by a turn evaluator.
#[derive(Debug, Clone)]
pub struct StudentTurn {
    pub transcription: String,
    pub question_index: u32,
    pub current_question: String,
    pub session_id: String,
}

/// How the driver should derive the next index once the gating conditions
/// are met.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceMode {
    /// The evaluator produced a structured advancement signal; the next index
    /// is current + 1.
    Explicit,
    /// Legacy path: detect the index by matching the assistant transcript
    /// against the question catalog.
    DetectFromTranscript,
}

/// The evaluator's judgement of a student turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnVerdict {
    /// Valid answer: arm the semaphore and advance on the next assistant turn.
    Advance { mode: AdvanceMode },
    /// The student must retry; speak this instruction.
    Retry { instruction: String },
    /// Noise or non-event; do nothing.
    Ignore,
}

/// A live bidirectional instruction channel to the realtime transport.
/// Everything behind it (peer connection, media, data channel) is the
/// transport's problem; `close` must be safe to call repeatedly.
#[async_trait]
pub trait RealtimeChannel: Send {
    /// Replaces the session instructions (the transport's `session.update`).
    async fn update_instructions(&mut self, instructions: &str) -> Result<()>;
    /// Asks the assistant to produce its next response.
    async fn trigger_response(&mut self) -> Result<()>;
    /// Asks for a one-off response under the given instructions.
    async fn trigger_response_with(&mut self, instructions: &str) -> Result<()>;
    /// Tears the channel down. Idempotent.
    async fn close(&mut self) -> Result<()>;
}

/// Opens realtime channels seeded with a starting question index.
#[async_trait]
pub trait RealtimeConnector: Send + Sync {
    async fn connect(
        &self,
        session_id: &str,
        initial_question_index: u32,
    ) -> Result<Box<dyn RealtimeChannel>>;
}

/// Classifies one student turn. Implementations must not fail: uncertainty
/// degrades to `Ignore`.
#[async_trait]
pub trait TurnEvaluator: Send + Sync {
    async fn evaluate(&self, turn: &StudentTurn) -> TurnVerdict;
}
