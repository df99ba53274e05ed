//! The lesson driver: consumes transport events, gates turns, advances the
//! session, and owns the block-boundary reset cycle.

use crate::lesson::{
    AdvanceMode, ConnectionState, LessonTrack, LessonUpdate, QUESTION_BLOCK_SIZE, RESET_SETTLE_DELAY,
    RealtimeChannel, RealtimeConnector, StudentTurn, TransportEvent, TurnEvaluator, TurnVerdict,
};
use crate::questions;
use crate::session::{AdvanceOutcome, PartAdvanceOutcome, SessionStore};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Transcripts shorter than this are treated as non-events.
const MIN_TRANSCRIPT_CHARS: usize = 2;

/// The turn-gating flags.
///
/// Invariants: at most one of `is_processing` / `is_resetting` is true at any
/// time; `expecting_response` is armed only by a validated advancing user
/// turn and cleared when the next assistant turn is consumed.
#[derive(Debug, Clone, Copy)]
pub struct TurnGate {
    pub can_advance: bool,
    /// The semaphore: while false, assistant utterances are history only and
    /// never reach the advancement logic.
    pub expecting_response: bool,
    pub is_processing: bool,
    pub is_resetting: bool,
}

impl Default for TurnGate {
    fn default() -> Self {
        Self {
            can_advance: true,
            expecting_response: false,
            is_processing: false,
            is_resetting: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LessonProgress {
    pub question_index: u32,
    pub correct: u32,
    pub incorrect: u32,
}

pub struct LessonDriver {
    session_id: String,
    track: LessonTrack,
    total_questions: u32,
    store: Arc<SessionStore>,
    evaluator: Arc<dyn TurnEvaluator>,
    connector: Arc<dyn RealtimeConnector>,
    updates: mpsc::Sender<LessonUpdate>,
    channel: Option<Box<dyn RealtimeChannel>>,
    gate: TurnGate,
    progress: LessonProgress,
    pending_mode: AdvanceMode,
    /// Running advance counter; drives block-boundary resets on both tracks.
    advanced_count: u32,
    current_part: u32,
}

impl LessonDriver {
    pub fn new(
        session_id: impl Into<String>,
        track: LessonTrack,
        store: Arc<SessionStore>,
        evaluator: Arc<dyn TurnEvaluator>,
        connector: Arc<dyn RealtimeConnector>,
        updates: mpsc::Sender<LessonUpdate>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            track,
            total_questions: questions::TOTAL_QUESTIONS,
            store,
            evaluator,
            connector,
            updates,
            channel: None,
            gate: TurnGate::default(),
            progress: LessonProgress::default(),
            pending_mode: AdvanceMode::DetectFromTranscript,
            advanced_count: 0,
            current_part: 1,
        }
    }

    pub fn gate(&self) -> TurnGate {
        self.gate
    }

    pub fn progress(&self) -> LessonProgress {
        self.progress
    }

    /// Opens the realtime channel and seeds the session state.
    #[instrument(name = "lesson_start", skip_all, fields(session_id = %self.session_id))]
    pub async fn start(&mut self, initial_question_index: u32) -> Result<()> {
        self.emit(LessonUpdate::Connection(ConnectionState::Connecting))
            .await;

        match self.track {
            LessonTrack::Simple => {
                let state = self
                    .store
                    .get_or_create_simple(&self.session_id, initial_question_index);
                self.progress.question_index = state.current_question_index;
            }
            LessonTrack::Parts => {
                let state = self
                    .store
                    .get_or_create_part(&self.session_id, 1, initial_question_index);
                self.current_part = state.current_part;
                self.progress.question_index = state.current_question_in_part;
            }
        }

        match self
            .connector
            .connect(&self.session_id, self.progress.question_index)
            .await
        {
            Ok(channel) => {
                self.channel = Some(channel);
                self.emit(LessonUpdate::Connection(ConnectionState::Active)).await;
                self.emit_progress().await;
                Ok(())
            }
            Err(error) => {
                self.emit(LessonUpdate::Connection(ConnectionState::Error)).await;
                Err(error)
            }
        }
    }

    /// Ends the conversation and releases the channel.
    pub async fn stop(&mut self) {
        self.close_channel().await;
        self.emit(LessonUpdate::Connection(ConnectionState::Ended)).await;
    }

    /// Entry point for transport events. Callers feed events one at a time;
    /// per-session state is never mutated concurrently.
    pub async fn handle_event(&mut self, event: TransportEvent) -> Result<()> {
        match event {
            TransportEvent::UserTranscript(text) => self.on_user_transcript(text).await,
            TransportEvent::AssistantTranscript(text) => self.on_assistant_transcript(text).await,
        }
    }

    async fn on_user_transcript(&mut self, text: String) -> Result<()> {
        let text = text.trim().to_string();
        if text.chars().count() < MIN_TRANSCRIPT_CHARS {
            // Noise: drop the gate so the next assistant utterance cannot
            // advance anything.
            self.gate.can_advance = false;
            self.gate.expecting_response = false;
            return Ok(());
        }

        let turn = StudentTurn {
            transcription: text.clone(),
            question_index: self.progress.question_index,
            current_question: self.current_question().unwrap_or_default().to_string(),
            session_id: self.session_id.clone(),
        };

        match self.evaluator.evaluate(&turn).await {
            TurnVerdict::Ignore => {
                self.gate.can_advance = false;
                self.gate.expecting_response = false;
            }
            TurnVerdict::Retry { instruction } => {
                self.gate.can_advance = false;
                self.gate.expecting_response = false;
                self.progress.incorrect += 1;
                self.emit(LessonUpdate::UserMessage(text)).await;
                self.emit_progress().await;
                if let Some(channel) = self.channel.as_mut() {
                    channel.trigger_response_with(&instruction).await?;
                }
            }
            TurnVerdict::Advance { mode } => {
                self.gate.can_advance = true;
                self.pending_mode = mode;
                self.emit(LessonUpdate::UserMessage(text)).await;
                match self.track {
                    // Arm the semaphore: the next assistant turn carries the
                    // advancement.
                    LessonTrack::Simple => self.gate.expecting_response = true,
                    // Listen-only channel: there is no assistant turn, the
                    // accepted answer itself advances the script.
                    LessonTrack::Parts => {
                        if !self.gate.is_processing {
                            self.gate.is_processing = true;
                            let result = self.advance_parts().await;
                            self.gate.is_processing = false;
                            result?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn on_assistant_transcript(&mut self, text: String) -> Result<()> {
        let text = text.trim().to_string();
        if text.is_empty() || self.gate.is_resetting {
            return Ok(());
        }

        if !self.gate.expecting_response {
            // Unsolicited assistant output: keep the history, never advance.
            debug!(session_id = %self.session_id, "assistant turn with semaphore down");
            self.emit(LessonUpdate::AssistantMessage(text)).await;
            return Ok(());
        }
        self.gate.expecting_response = false;

        if self.gate.is_processing {
            return Ok(());
        }
        self.gate.is_processing = true;
        let result = self.process_assistant_turn(&text).await;
        self.gate.is_processing = false;
        result
    }

    async fn process_assistant_turn(&mut self, text: &str) -> Result<()> {
        if self.gate.can_advance {
            self.advance_simple(text).await?;
        }
        self.emit(LessonUpdate::AssistantMessage(text.to_string())).await;
        Ok(())
    }

    /// Single-track advancement. On a block boundary the channel is recycled
    /// before returning.
    async fn advance_simple(&mut self, assistant_text: &str) -> Result<()> {
        let detected = match self.pending_mode {
            AdvanceMode::Explicit => Some(self.progress.question_index + 1),
            AdvanceMode::DetectFromTranscript => questions::find_question_index(assistant_text),
        };
        let Some(detected) = detected else {
            return Ok(());
        };

        let AdvanceOutcome::Advanced { new_index } = self.store.advance(&self.session_id, detected)
        else {
            return Ok(());
        };

        self.progress.question_index = new_index;
        self.progress.correct += 1;
        self.advanced_count += 1;
        self.emit_progress().await;

        if new_index > self.total_questions {
            info!(session_id = %self.session_id, "lesson complete");
            self.emit(LessonUpdate::Completed).await;
            return Ok(());
        }

        if let Some(question) = questions::question_by_index(new_index)
            && let Some(channel) = self.channel.as_mut()
        {
            channel
                .update_instructions(&questions::strict_order_instruction(new_index, question))
                .await?;
            channel.trigger_response().await?;
        }

        // Index-based boundary: entering question 6, 11, 16, … recycles the
        // transport regardless of where the session started.
        if new_index > 1 && (new_index - 1) % QUESTION_BLOCK_SIZE == 0 {
            self.reset_session(new_index).await?;
        }
        Ok(())
    }

    /// Multi-part advancement: every accepted turn moves one question forward,
    /// the next scripted line goes out through speech synthesis.
    async fn advance_parts(&mut self) -> Result<bool> {
        match self.store.advance_part(&self.session_id) {
            PartAdvanceOutcome::Advanced {
                part,
                question_in_part,
                advanced_in_session,
            } => {
                self.current_part = part;
                self.progress.question_index = question_in_part;
                self.progress.correct += 1;
                self.advanced_count = advanced_in_session;
                self.emit_progress().await;

                if let Some(question) = questions::lesson2_question(part, question_in_part) {
                    self.emit(LessonUpdate::Speak(question.to_string())).await;
                }

                if self.crossed_block_boundary() {
                    self.reset_session(question_in_part).await?;
                }
                Ok(true)
            }
            PartAdvanceOutcome::Complete => {
                info!(session_id = %self.session_id, "multi-part lesson complete");
                self.emit(LessonUpdate::Completed).await;
                Ok(true)
            }
            PartAdvanceOutcome::UnknownSession => {
                warn!(session_id = %self.session_id, "advance on unknown session");
                Ok(false)
            }
        }
    }

    fn crossed_block_boundary(&self) -> bool {
        self.advanced_count > 0 && self.advanced_count % QUESTION_BLOCK_SIZE == 0
    }

    /// Full teardown and reopen of the realtime channel, with the settle
    /// delay in between. Reentrant calls are no-ops.
    async fn reset_session(&mut self, target_question_index: u32) -> Result<()> {
        if self.gate.is_resetting {
            return Ok(());
        }
        self.gate.is_processing = false;
        self.gate.is_resetting = true;
        info!(session_id = %self.session_id, target_question_index, "block boundary, recycling realtime session");

        self.close_channel().await;
        tokio::time::sleep(RESET_SETTLE_DELAY).await;

        match self
            .connector
            .connect(&self.session_id, target_question_index)
            .await
        {
            Ok(channel) => {
                self.channel = Some(channel);
                self.gate.is_resetting = false;
                Ok(())
            }
            Err(error) => {
                self.gate.is_resetting = false;
                self.emit(LessonUpdate::Connection(ConnectionState::Error)).await;
                Err(error)
            }
        }
    }

    /// Defensive close: safe to call with no channel open, and close errors
    /// are logged and swallowed so teardown always completes.
    async fn close_channel(&mut self) {
        if let Some(mut channel) = self.channel.take()
            && let Err(error) = channel.close().await
        {
            debug!(session_id = %self.session_id, %error, "ignoring close error");
        }
    }

    fn current_question(&self) -> Option<&'static str> {
        match self.track {
            LessonTrack::Simple => questions::question_by_index(self.progress.question_index),
            LessonTrack::Parts => {
                questions::lesson2_question(self.current_part, self.progress.question_index)
            }
        }
    }

    async fn emit_progress(&self) {
        self.emit(LessonUpdate::Progress {
            question_index: self.progress.question_index,
            correct: self.progress.correct,
            incorrect: self.progress.incorrect,
        })
        .await;
    }

    async fn emit(&self, update: LessonUpdate) {
        if self.updates.send(update).await.is_err() {
            debug!(session_id = %self.session_id, "updates receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    /// Records channel lifecycle calls with paused-clock timestamps.
    #[derive(Clone, Default)]
    struct CallLog {
        calls: Arc<Mutex<Vec<(String, Instant)>>>,
    }

    impl CallLog {
        fn record(&self, name: &str) {
            self.calls.lock().unwrap().push((name.to_string(), Instant::now()));
        }

        fn count(&self, name: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|(n, _)| n == name).count()
        }

        fn gap(&self, after: &str, before: &str) -> Option<Duration> {
            let calls = self.calls.lock().unwrap();
            let close = calls.iter().rev().find(|(n, _)| n == after)?.1;
            let open = calls.iter().rev().find(|(n, _)| n == before)?.1;
            open.checked_duration_since(close)
        }
    }

    struct RecordingChannel {
        log: CallLog,
    }

    #[async_trait]
    impl RealtimeChannel for RecordingChannel {
        async fn update_instructions(&mut self, _instructions: &str) -> Result<()> {
            self.log.record("update_instructions");
            Ok(())
        }
        async fn trigger_response(&mut self) -> Result<()> {
            self.log.record("trigger_response");
            Ok(())
        }
        async fn trigger_response_with(&mut self, _instructions: &str) -> Result<()> {
            self.log.record("trigger_response_with");
            Ok(())
        }
        async fn close(&mut self) -> Result<()> {
            self.log.record("close");
            Ok(())
        }
    }

    struct RecordingConnector {
        log: CallLog,
    }

    #[async_trait]
    impl RealtimeConnector for RecordingConnector {
        async fn connect(
            &self,
            _session_id: &str,
            _initial_question_index: u32,
        ) -> Result<Box<dyn RealtimeChannel>> {
            self.log.record("connect");
            Ok(Box::new(RecordingChannel { log: self.log.clone() }))
        }
    }

    /// Always approves the turn with the given mode.
    struct ApprovingEvaluator {
        mode: AdvanceMode,
    }

    #[async_trait]
    impl TurnEvaluator for ApprovingEvaluator {
        async fn evaluate(&self, _turn: &StudentTurn) -> TurnVerdict {
            TurnVerdict::Advance { mode: self.mode }
        }
    }

    struct RetryingEvaluator;

    #[async_trait]
    impl TurnEvaluator for RetryingEvaluator {
        async fn evaluate(&self, _turn: &StudentTurn) -> TurnVerdict {
            TurnVerdict::Retry {
                instruction: "Intenta de nuevo.".into(),
            }
        }
    }

    struct Harness {
        driver: LessonDriver,
        updates: mpsc::Receiver<LessonUpdate>,
        log: CallLog,
        store: Arc<SessionStore>,
    }

    fn harness(evaluator: Arc<dyn TurnEvaluator>, initial_index: u32) -> Harness {
        let log = CallLog::default();
        let store = Arc::new(SessionStore::default());
        let (tx, rx) = mpsc::channel(64);
        let mut driver = LessonDriver::new(
            "test-session",
            LessonTrack::Simple,
            store.clone(),
            evaluator,
            Arc::new(RecordingConnector { log: log.clone() }),
            tx,
        );
        driver.progress.question_index = initial_index;
        Harness {
            driver,
            updates: rx,
            log,
            store,
        }
    }

    fn drain(updates: &mut mpsc::Receiver<LessonUpdate>) -> Vec<LessonUpdate> {
        let mut collected = vec![];
        while let Ok(update) = updates.try_recv() {
            collected.push(update);
        }
        collected
    }

    #[tokio::test]
    async fn unsolicited_assistant_turn_is_history_only() {
        let mut h = harness(
            Arc::new(ApprovingEvaluator { mode: AdvanceMode::Explicit }),
            1,
        );
        h.driver.start(1).await.unwrap();
        drain(&mut h.updates);

        // No user turn armed the semaphore.
        assert!(!h.driver.gate().expecting_response);
        h.driver
            .handle_event(TransportEvent::AssistantTranscript(
                "It's nice to meet you. How are you?".into(),
            ))
            .await
            .unwrap();

        let updates = drain(&mut h.updates);
        assert!(updates.iter().any(|u| matches!(u, LessonUpdate::AssistantMessage(_))));
        assert_eq!(h.store.simple("test-session").unwrap().current_question_index, 1);
        assert_eq!(h.driver.progress().question_index, 1);
    }

    #[tokio::test]
    async fn validated_turn_arms_semaphore_and_advances_once() {
        let mut h = harness(
            Arc::new(ApprovingEvaluator { mode: AdvanceMode::Explicit }),
            1,
        );
        h.driver.start(1).await.unwrap();

        h.driver
            .handle_event(TransportEvent::UserTranscript("My name is Ana".into()))
            .await
            .unwrap();
        assert!(h.driver.gate().expecting_response);

        h.driver
            .handle_event(TransportEvent::AssistantTranscript(
                "It's nice to meet you. How are you?".into(),
            ))
            .await
            .unwrap();

        // The semaphore was consumed and the index moved by exactly one.
        assert!(!h.driver.gate().expecting_response);
        assert_eq!(h.driver.progress().question_index, 2);
        assert_eq!(h.store.simple("test-session").unwrap().current_question_index, 2);
        // The transport was told the next question.
        assert_eq!(h.log.count("update_instructions"), 1);
        assert_eq!(h.log.count("trigger_response"), 1);
    }

    #[tokio::test]
    async fn near_empty_transcript_drops_the_gate() {
        let mut h = harness(
            Arc::new(ApprovingEvaluator { mode: AdvanceMode::Explicit }),
            1,
        );
        h.driver.start(1).await.unwrap();

        h.driver
            .handle_event(TransportEvent::UserTranscript("a".into()))
            .await
            .unwrap();
        assert!(!h.driver.gate().expecting_response);
        assert!(!h.driver.gate().can_advance);

        h.driver
            .handle_event(TransportEvent::AssistantTranscript(
                "It's nice to meet you. How are you?".into(),
            ))
            .await
            .unwrap();
        assert_eq!(h.driver.progress().question_index, 1);
    }

    #[tokio::test]
    async fn retry_verdict_speaks_correction_and_blocks_advance() {
        let mut h = harness(Arc::new(RetryingEvaluator), 1);
        h.driver.start(1).await.unwrap();

        h.driver
            .handle_event(TransportEvent::UserTranscript("I don't like cook".into()))
            .await
            .unwrap();
        assert!(!h.driver.gate().expecting_response);
        assert_eq!(h.log.count("trigger_response_with"), 1);
        assert_eq!(h.driver.progress().incorrect, 1);

        // The correction the assistant then speaks must not advance anything.
        h.driver
            .handle_event(TransportEvent::AssistantTranscript(
                "Casi. Do you like to cook?".into(),
            ))
            .await
            .unwrap();
        assert_eq!(h.driver.progress().question_index, 1);
    }

    #[tokio::test]
    async fn transcript_detection_advances_on_matching_question() {
        let mut h = harness(
            Arc::new(ApprovingEvaluator {
                mode: AdvanceMode::DetectFromTranscript,
            }),
            1,
        );
        h.driver.start(1).await.unwrap();

        h.driver
            .handle_event(TransportEvent::UserTranscript("My name is Ana".into()))
            .await
            .unwrap();
        h.driver
            .handle_event(TransportEvent::AssistantTranscript(
                "It's nice to meet you. How are you?".into(),
            ))
            .await
            .unwrap();
        assert_eq!(h.driver.progress().question_index, 2);

        // An assistant transcript that matches nothing leaves the index alone.
        h.driver
            .handle_event(TransportEvent::UserTranscript("I am fine".into()))
            .await
            .unwrap();
        h.driver
            .handle_event(TransportEvent::AssistantTranscript(
                "mmm interesting".into(),
            ))
            .await
            .unwrap();
        assert_eq!(h.driver.progress().question_index, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn block_boundary_recycles_the_channel_with_settle_delay() {
        let mut h = harness(
            Arc::new(ApprovingEvaluator { mode: AdvanceMode::Explicit }),
            5,
        );
        // Seed the store at question 5 so the next advance crosses 5 -> 6.
        h.store.get_or_create_simple("test-session", 5);
        h.driver.start(5).await.unwrap();
        assert_eq!(h.log.count("connect"), 1);

        h.driver
            .handle_event(TransportEvent::UserTranscript("Yes, I like to work".into()))
            .await
            .unwrap();
        h.driver
            .handle_event(TransportEvent::AssistantTranscript(
                "I like to cook. Do you like to cook?".into(),
            ))
            .await
            .unwrap();

        assert_eq!(h.driver.progress().question_index, 6);
        assert_eq!(h.log.count("close"), 1);
        assert_eq!(h.log.count("connect"), 2);
        let gap = h.log.gap("close", "connect").expect("close then connect");
        assert!(gap >= RESET_SETTLE_DELAY, "gap: {gap:?}");
        assert!(!h.driver.gate().is_resetting);

        // The next advance (6 -> 7) must not recycle anything.
        h.store.backdate("test-session", 3000);
        h.driver
            .handle_event(TransportEvent::UserTranscript("Yes, I do".into()))
            .await
            .unwrap();
        h.driver
            .handle_event(TransportEvent::AssistantTranscript(
                "I like to play drums. Do you like to play an instrument?".into(),
            ))
            .await
            .unwrap();
        assert_eq!(h.driver.progress().question_index, 7);
        assert_eq!(h.log.count("close"), 1);
        assert_eq!(h.log.count("connect"), 2);
    }

    #[tokio::test]
    async fn completion_emits_signal_and_stops_instructing() {
        let mut h = harness(
            Arc::new(ApprovingEvaluator { mode: AdvanceMode::Explicit }),
            1,
        );
        h.driver.total_questions = 1;
        h.store.get_or_create_simple("test-session", 1);
        h.driver.start(1).await.unwrap();
        drain(&mut h.updates);

        h.driver
            .handle_event(TransportEvent::UserTranscript("My name is Ana".into()))
            .await
            .unwrap();
        h.driver
            .handle_event(TransportEvent::AssistantTranscript(
                "Let's stay in touch. Take care!".into(),
            ))
            .await
            .unwrap();

        let updates = drain(&mut h.updates);
        assert!(updates.contains(&LessonUpdate::Completed));
        // Past the end no instruction update goes out.
        assert_eq!(h.log.count("update_instructions"), 0);
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let mut h = harness(
            Arc::new(ApprovingEvaluator { mode: AdvanceMode::Explicit }),
            1,
        );
        h.driver.start(1).await.unwrap();
        h.driver.stop().await;
        h.driver.stop().await;
        assert_eq!(h.log.count("close"), 1);
    }

    #[tokio::test]
    async fn parts_track_speaks_next_scripted_question() {
        let log = CallLog::default();
        let store = Arc::new(SessionStore::default());
        let (tx, mut rx) = mpsc::channel(64);
        let mut driver = LessonDriver::new(
            "part-session",
            LessonTrack::Parts,
            store.clone(),
            Arc::new(ApprovingEvaluator { mode: AdvanceMode::Explicit }),
            Arc::new(RecordingConnector { log: log.clone() }),
            tx,
        );
        driver.start(1).await.unwrap();
        drain(&mut rx);

        // The accepted answer advances the script directly; the listen-only
        // channel never sees an assistant turn.
        driver
            .handle_event(TransportEvent::UserTranscript("My name is Ana".into()))
            .await
            .unwrap();

        let updates = drain(&mut rx);
        assert!(updates.contains(&LessonUpdate::Speak("Where are you from?".to_string())));
        assert_eq!(store.part("part-session").unwrap().current_question_in_part, 2);
        assert_eq!(log.count("update_instructions"), 0);

        // An unsolicited assistant transcript stays history only.
        driver
            .handle_event(TransportEvent::AssistantTranscript("stray echo".into()))
            .await
            .unwrap();
        assert_eq!(store.part("part-session").unwrap().current_question_in_part, 2);
    }
}
