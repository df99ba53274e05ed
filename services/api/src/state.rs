//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds all shared
//! resources: the session store, orchestrators, and external-service clients.

use crate::config::Config;
use crate::realtime::RealtimeSessionClient;
use charla_core::{
    history::HistoryStore,
    orchestrator::{AnalysisOrchestrator, ConversationOrchestrator},
    session::SessionStore,
    tts::SpeechSynthesizer,
};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all
/// handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
    pub analysis: Arc<AnalysisOrchestrator>,
    pub conversation: Arc<ConversationOrchestrator>,
    pub realtime: Arc<RealtimeSessionClient>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub history: Arc<dyn HistoryStore>,
    pub config: Arc<Config>,
}
