use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::session::SessionState;

pub const DEFAULT_CHUNK: usize = 2;
pub const DEFAULT_TICK: Duration = Duration::from_millis(20);

#[derive(Debug, Clone)]
pub struct RevealConfig {
    /// Characters revealed per tick. Clamped to at least 1 so every reveal
    /// makes progress.
    pub chunk: usize,
    pub tick: Duration,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            chunk: DEFAULT_CHUNK,
            tick: DEFAULT_TICK,
        }
    }
}

struct ActiveReveal {
    message_id: String,
    task: JoinHandle<()>,
}

/// Reveals an already-fetched answer into a transcript message chunk by
/// chunk, mimicking live typing. Holds at most one task; starting a new
/// reveal preempts the previous one.
pub struct TypingRevealer {
    state: Arc<Mutex<SessionState>>,
    config: RevealConfig,
    active: Option<ActiveReveal>,
}

impl TypingRevealer {
    pub fn new(state: Arc<Mutex<SessionState>>, mut config: RevealConfig) -> Self {
        config.chunk = config.chunk.max(1);
        Self {
            state,
            config,
            active: None,
        }
    }

    /// Starts revealing `full_text` into the message with `message_id`.
    /// Chunks are counted in characters, never splitting a UTF-8 scalar.
    pub fn start(&mut self, message_id: &str, full_text: String) {
        self.cancel();

        let state = self.state.clone();
        let id = message_id.to_string();
        let chunk = self.config.chunk;
        let tick = self.config.tick;

        let task = tokio::spawn({
            let id = id.clone();
            async move {
                let chars: Vec<char> = full_text.chars().collect();
                let mut shown = 0usize;
                let mut timer = tokio::time::interval(tick);
                // The first interval tick fires immediately; skip it so the
                // cadence starts one tick after the answer arrives.
                timer.tick().await;
                loop {
                    timer.tick().await;
                    shown = (shown + chunk).min(chars.len());
                    let prefix: String = chars[..shown].iter().collect();
                    let done = shown == chars.len();
                    state
                        .lock()
                        .expect("session state lock poisoned")
                        .reveal_tick(&id, prefix, done);
                    if done {
                        break;
                    }
                }
            }
        });

        self.active = Some(ActiveReveal {
            message_id: id,
            task,
        });
    }

    /// Aborts the active reveal, if any. Safe to call repeatedly. The target
    /// message keeps whatever prefix was already shown but is never left
    /// marked as revealing.
    pub fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            active.task.abort();
            let mut state = self.state.lock().expect("session state lock poisoned");
            if let Some(message) = state.transcript.get_mut(&active.message_id) {
                if message.revealing {
                    debug!(message_id = %active.message_id, "reveal canceled mid-flight");
                    message.revealing = false;
                }
            }
        }
    }
}
