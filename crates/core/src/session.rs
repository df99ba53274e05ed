//! Server-owned lesson session state.
//!
//! One entry per session id, mutated only through the advancement checks so
//! per-session writes are serialized behind the store lock. Entries carry an
//! idle TTL: sessions abandoned mid-lesson are evicted on the next sweep
//! instead of accumulating for the lifetime of the process.

use crate::questions;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

/// Minimum interval between two accepted advances for the same session.
/// Tolerates duplicate near-simultaneous detections from noisy transcription
/// matching without needing a lock around the whole round trip.
pub const ADVANCE_DEBOUNCE_MS: i64 = 2000;

/// Sessions idle longer than this are evicted.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// State for the single-track lesson.
#[derive(Debug, Clone)]
pub struct LessonSessionState {
    pub current_question_index: u32,
    pub last_advanced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    last_touched_at: DateTime<Utc>,
}

/// State for the multi-part lesson.
#[derive(Debug, Clone)]
pub struct PartSessionState {
    pub current_part: u32,
    pub current_question_in_part: u32,
    /// Running count of questions advanced past in this session; drives the
    /// block-boundary reset.
    pub advanced_in_session: u32,
    pub last_advanced_at: Option<DateTime<Utc>>,
    pub last_user_input_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    last_touched_at: DateTime<Utc>,
}

/// Result of a single-track advancement check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Advanced { new_index: u32 },
    Rejected { current_index: u32 },
    UnknownSession,
}

/// Result of a multi-part advancement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartAdvanceOutcome {
    Advanced {
        part: u32,
        question_in_part: u32,
        advanced_in_session: u32,
    },
    Complete,
    UnknownSession,
}

pub struct SessionStore {
    ttl: Duration,
    simple: Mutex<HashMap<String, LessonSessionState>>,
    parts: Mutex<HashMap<String, PartSessionState>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            simple: Mutex::new(HashMap::new()),
            parts: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the session for `id`, creating it at `initial_index` if absent.
    pub fn get_or_create_simple(&self, id: &str, initial_index: u32) -> LessonSessionState {
        let now = Utc::now();
        let mut sessions = self.simple.lock().expect("session store poisoned");
        let entry = sessions.entry(id.to_string()).or_insert_with(|| {
            info!(session_id = id, initial_index, "created lesson session");
            LessonSessionState {
                current_question_index: initial_index.max(1),
                last_advanced_at: None,
                created_at: now,
                last_touched_at: now,
            }
        });
        entry.last_touched_at = now;
        entry.clone()
    }

    /// Returns the multi-part session for `id`, creating it if absent.
    pub fn get_or_create_part(&self, id: &str, part: u32, question: u32) -> PartSessionState {
        let now = Utc::now();
        let mut sessions = self.parts.lock().expect("session store poisoned");
        let entry = sessions.entry(id.to_string()).or_insert_with(|| {
            info!(session_id = id, part, question, "created part session");
            PartSessionState {
                current_part: part.max(1),
                current_question_in_part: question.max(1),
                advanced_in_session: 0,
                last_advanced_at: None,
                last_user_input_at: None,
                created_at: now,
                last_touched_at: now,
            }
        });
        entry.last_touched_at = now;
        entry.clone()
    }

    pub fn simple(&self, id: &str) -> Option<LessonSessionState> {
        self.simple
            .lock()
            .expect("session store poisoned")
            .get(id)
            .cloned()
    }

    pub fn part(&self, id: &str) -> Option<PartSessionState> {
        self.parts
            .lock()
            .expect("session store poisoned")
            .get(id)
            .cloned()
    }

    /// The single-track advancement check: accept iff the detected index is
    /// exactly one past the current index and the debounce window since the
    /// last accepted advance has elapsed.
    pub fn advance(&self, id: &str, detected_index: u32) -> AdvanceOutcome {
        self.advance_at(id, detected_index, Utc::now())
    }

    fn debounced(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        last.is_some_and(|t| (now - t).num_milliseconds() <= ADVANCE_DEBOUNCE_MS)
    }

    pub(crate) fn advance_at(
        &self,
        id: &str,
        detected_index: u32,
        now: DateTime<Utc>,
    ) -> AdvanceOutcome {
        let mut sessions = self.simple.lock().expect("session store poisoned");
        let Some(entry) = sessions.get_mut(id) else {
            return AdvanceOutcome::UnknownSession;
        };
        entry.last_touched_at = now;

        if detected_index == entry.current_question_index + 1
            && !Self::debounced(entry.last_advanced_at, now)
        {
            entry.current_question_index = detected_index;
            entry.last_advanced_at = Some(now);
            info!(session_id = id, new_index = detected_index, "session advanced");
            AdvanceOutcome::Advanced {
                new_index: detected_index,
            }
        } else {
            debug!(
                session_id = id,
                detected_index,
                current_index = entry.current_question_index,
                "advance rejected"
            );
            AdvanceOutcome::Rejected {
                current_index: entry.current_question_index,
            }
        }
    }

    /// Moves a multi-part session past its current question, rolling into the
    /// next part at a part boundary.
    pub fn advance_part(&self, id: &str) -> PartAdvanceOutcome {
        let now = Utc::now();
        let mut sessions = self.parts.lock().expect("session store poisoned");
        let Some(entry) = sessions.get_mut(id) else {
            return PartAdvanceOutcome::UnknownSession;
        };
        entry.last_touched_at = now;
        entry.last_user_input_at = Some(now);

        let part_len = questions::lesson2_part_question_count(entry.current_part);
        if entry.current_question_in_part < part_len {
            entry.current_question_in_part += 1;
        } else if entry.current_part < questions::lesson2_part_count() {
            entry.current_part += 1;
            entry.current_question_in_part = 1;
        } else {
            return PartAdvanceOutcome::Complete;
        }

        entry.advanced_in_session += 1;
        entry.last_advanced_at = Some(now);
        PartAdvanceOutcome::Advanced {
            part: entry.current_part,
            question_in_part: entry.current_question_in_part,
            advanced_in_session: entry.advanced_in_session,
        }
    }

    pub fn remove(&self, id: &str) {
        self.simple.lock().expect("session store poisoned").remove(id);
        self.parts.lock().expect("session store poisoned").remove(id);
    }

    /// Drops every session idle longer than the TTL. Returns how many were
    /// evicted. Called periodically by the service.
    pub fn evict_expired(&self) -> usize {
        let now = Utc::now();
        let ttl_ms = self.ttl.as_millis() as i64;
        let mut evicted = 0;

        let mut simple = self.simple.lock().expect("session store poisoned");
        let before = simple.len();
        simple.retain(|_, s| (now - s.last_touched_at).num_milliseconds() <= ttl_ms);
        evicted += before - simple.len();
        drop(simple);

        let mut parts = self.parts.lock().expect("session store poisoned");
        let before = parts.len();
        parts.retain(|_, s| (now - s.last_touched_at).num_milliseconds() <= ttl_ms);
        evicted += before - parts.len();

        if evicted > 0 {
            info!(evicted, "evicted idle sessions");
        }
        evicted
    }

    /// Test hook: pretend the last advance (and last touch) happened `ms`
    /// milliseconds earlier than recorded.
    #[cfg(test)]
    pub(crate) fn backdate(&self, id: &str, ms: i64) {
        let delta = chrono::TimeDelta::milliseconds(ms);
        if let Some(entry) = self.simple.lock().unwrap().get_mut(id) {
            if let Some(t) = entry.last_advanced_at.as_mut() {
                *t -= delta;
            }
            entry.last_touched_at -= delta;
        }
        if let Some(entry) = self.parts.lock().unwrap().get_mut(id) {
            if let Some(t) = entry.last_advanced_at.as_mut() {
                *t -= delta;
            }
            entry.last_touched_at -= delta;
        }
    }
}
