use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::backend::{BackendError, Query, SupportBackend};
use crate::chat::{ChatMessage, Transcript};
use crate::reveal::{RevealConfig, TypingRevealer};

/// Shown instead of status/body when the request never completed.
pub const CONNECTIVITY_ERROR: &str =
    "Could not reach the AI backend. Check that it is running and that BACKEND_URL is set correctly.";

/// Local reply when the product-scoped chat is used without a selection.
pub const SELECT_PRODUCT_PROMPT: &str =
    "Pilih produk dulu, lalu tanyakan apa saja tentang produk itu.";

/// Canned prompts offered next to the input box.
pub const QUICK_REPLIES: &[&str] = &["Cara pesan produk", "Cara bayar", "Cek status pesanan"];

/// Everything a renderer needs: the transcript plus the single-flight busy
/// flag. All transitions are small synchronous methods so the state machine
/// is testable without a network or a runtime.
#[derive(Debug, Default)]
pub struct SessionState {
    pub transcript: Transcript,
    pub busy: bool,
}

pub struct TurnIds {
    pub user_id: String,
    pub placeholder_id: String,
}

impl SessionState {
    /// Opens a turn: user message plus empty assistant placeholder, busy
    /// flag raised. Returns `None` (and changes nothing) for blank input or
    /// while another turn is outstanding.
    pub fn begin_turn(&mut self, text: &str) -> Option<TurnIds> {
        let text = text.trim();
        if text.is_empty() || self.busy {
            return None;
        }
        let user_id = self.transcript.push(ChatMessage::user(text));
        let placeholder_id = self.transcript.push(ChatMessage::placeholder());
        self.busy = true;
        Some(TurnIds {
            user_id,
            placeholder_id,
        })
    }

    /// Failed turn: the placeholder is removed, one error message is
    /// appended in its place, and the input unlocks.
    pub fn fail_turn(&mut self, placeholder_id: &str, error_text: impl Into<String>) {
        self.transcript.remove(placeholder_id);
        self.transcript.push(ChatMessage::assistant(error_text));
        self.busy = false;
    }

    /// One reveal step. Clears the busy flag on the final tick so the input
    /// unlocks exactly when the answer is fully shown.
    pub fn reveal_tick(&mut self, message_id: &str, prefix: String, done: bool) {
        if let Some(message) = self.transcript.get_mut(message_id) {
            message.text = prefix;
            message.revealing = !done;
        }
        if done {
            self.busy = false;
        }
    }

    /// Assistant message produced locally, outside any turn (no busy flag).
    pub fn local_reply(&mut self, text: impl Into<String>) {
        self.transcript.push(ChatMessage::assistant(text));
    }

    pub fn clear(&mut self) {
        self.transcript.clear();
        self.busy = false;
    }
}

/// Which backend route the session talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatScope {
    Support,
    Product { selected: Option<i64> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A turn was opened and resolved against the backend.
    Sent,
    /// Blank input or an outstanding turn; nothing changed.
    Ignored,
    /// Product scope without a selection: answered locally, no network.
    PromptedSelection,
}

/// One assistant conversation: optimistic transcript updates, a single
/// in-flight request, and the typing reveal for successful answers.
pub struct AssistantSession<B> {
    backend: B,
    scope: ChatScope,
    state: Arc<Mutex<SessionState>>,
    revealer: TypingRevealer,
}

impl<B: SupportBackend> AssistantSession<B> {
    pub fn support(backend: B, reveal: RevealConfig) -> Self {
        Self::with_scope(backend, ChatScope::Support, reveal)
    }

    pub fn product(backend: B, reveal: RevealConfig) -> Self {
        Self::with_scope(backend, ChatScope::Product { selected: None }, reveal)
    }

    fn with_scope(backend: B, scope: ChatScope, reveal: RevealConfig) -> Self {
        let state = Arc::new(Mutex::new(SessionState::default()));
        let revealer = TypingRevealer::new(state.clone(), reveal);
        Self {
            backend,
            scope,
            state,
            revealer,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().expect("session state lock poisoned")
    }

    pub fn scope(&self) -> ChatScope {
        self.scope
    }

    pub fn is_busy(&self) -> bool {
        self.lock().busy
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock().transcript.messages().to_vec()
    }

    /// Discards the conversation, canceling any reveal first so a stale
    /// timer cannot touch messages that no longer have an owner.
    pub fn clear(&mut self) {
        self.revealer.cancel();
        self.lock().clear();
    }

    /// Focuses the product-scoped chat on one product. Switching products
    /// starts a fresh conversation.
    pub fn select_product(&mut self, product_id: i64) {
        self.clear();
        self.scope = ChatScope::Product {
            selected: Some(product_id),
        };
        info!(product_id, "product chat focused");
    }

    /// Submits user input. Resolves the whole request phase before
    /// returning; the typing reveal keeps running in the background and the
    /// busy flag stays up until it finishes.
    pub async fn submit(&mut self, text: &str) -> SubmitOutcome {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return SubmitOutcome::Ignored;
        }

        let query = match self.scope {
            ChatScope::Support => Query::Support {
                message: trimmed.to_string(),
            },
            ChatScope::Product { selected: Some(id) } => Query::Product {
                product_id: id,
                intent: trimmed.to_string(),
            },
            ChatScope::Product { selected: None } => {
                // No product, no request: answer locally and leave the input
                // unlocked.
                self.lock().local_reply(SELECT_PRODUCT_PROMPT);
                return SubmitOutcome::PromptedSelection;
            }
        };

        let Some(ids) = self.lock().begin_turn(trimmed) else {
            debug!("submission rejected while a turn is outstanding");
            return SubmitOutcome::Ignored;
        };

        match self.backend.answer(&query).await {
            Ok(answer) => {
                self.revealer.start(&ids.placeholder_id, answer);
            }
            Err(BackendError::Rejected { status, body }) => {
                warn!(status, "assistant request rejected");
                self.lock().fail_turn(
                    &ids.placeholder_id,
                    format!("The assistant call failed ({status}). {body}"),
                );
            }
            Err(BackendError::Unreachable(reason)) => {
                warn!(%reason, "assistant backend unreachable");
                self.lock().fail_turn(&ids.placeholder_id, CONNECTIVITY_ERROR);
            }
        }
        SubmitOutcome::Sent
    }

    /// Sends one of the canned quick replies. Same single-flight rules as
    /// free text.
    pub async fn quick_reply(&mut self, index: usize) -> SubmitOutcome {
        match QUICK_REPLIES.get(index) {
            Some(text) => self.submit(text).await,
            None => SubmitOutcome::Ignored,
        }
    }

    /// Waits for the current turn (request and reveal) to settle.
    pub async fn settled(&self) {
        while self.is_busy() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Role;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct FakeBackend {
        replies: StdMutex<VecDeque<Result<String, BackendError>>>,
        seen: StdMutex<Vec<Query>>,
    }

    impl FakeBackend {
        fn scripted(replies: Vec<Result<String, BackendError>>) -> Self {
            Self {
                replies: StdMutex::new(replies.into()),
                seen: StdMutex::new(Vec::new()),
            }
        }
    }

    impl SupportBackend for &FakeBackend {
        async fn answer(&self, query: &Query) -> Result<String, BackendError> {
            self.seen.lock().unwrap().push(query.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("fallback".to_string()))
        }
    }

    fn fast_reveal() -> RevealConfig {
        RevealConfig {
            chunk: 8,
            tick: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn blank_input_changes_nothing() {
        let backend = FakeBackend::default();
        let mut session = AssistantSession::support(&backend, fast_reveal());

        assert_eq!(session.submit("   ").await, SubmitOutcome::Ignored);
        assert!(session.messages().is_empty());
        assert!(!session.is_busy());
        assert!(backend.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn successful_turn_reveals_the_answer() {
        let backend = FakeBackend::scripted(vec![Ok("Silakan cek menu pesanan.".to_string())]);
        let mut session = AssistantSession::support(&backend, fast_reveal());

        assert_eq!(session.submit("Cara pesan produk").await, SubmitOutcome::Sent);
        session.settled().await;

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].text, "Cara pesan produk");
        let last = &messages[1];
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.text, "Silakan cek menu pesanan.");
        assert!(!last.revealing);
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn rejection_replaces_the_placeholder_with_one_error() {
        let backend = FakeBackend::scripted(vec![Err(BackendError::Rejected {
            status: 503,
            body: "model overloaded".to_string(),
        })]);
        let mut session = AssistantSession::support(&backend, fast_reveal());

        session.submit("halo").await;

        let messages = session.messages();
        // user + error, not user + placeholder + error
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, Role::Assistant);
        assert!(messages[1].text.contains("503"));
        assert!(messages[1].text.contains("model overloaded"));
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn transport_failure_uses_the_fixed_advisory() {
        let backend = FakeBackend::scripted(vec![Err(BackendError::Unreachable(
            "connection refused".to_string(),
        ))]);
        let mut session = AssistantSession::support(&backend, fast_reveal());

        session.submit("halo").await;

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].text, CONNECTIVITY_ERROR);
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn second_submission_is_rejected_while_revealing() {
        let backend = FakeBackend::scripted(vec![Ok("a".repeat(400))]);
        let mut session = AssistantSession::support(
            &backend,
            RevealConfig {
                chunk: 1,
                tick: Duration::from_millis(20),
            },
        );

        session.submit("pertama").await;
        assert!(session.is_busy());

        assert_eq!(session.submit("kedua").await, SubmitOutcome::Ignored);
        assert_eq!(session.messages().len(), 2);
        assert_eq!(backend.seen.lock().unwrap().len(), 1);

        session.clear();
    }

    #[tokio::test]
    async fn quick_replies_use_the_canned_payloads() {
        let backend = FakeBackend::scripted(vec![Ok("Transfer atau COD.".to_string())]);
        let mut session = AssistantSession::support(&backend, fast_reveal());

        assert_eq!(session.quick_reply(1).await, SubmitOutcome::Sent);
        session.settled().await;

        let seen = backend.seen.lock().unwrap();
        assert_eq!(
            seen[0],
            Query::Support {
                message: QUICK_REPLIES[1].to_string()
            }
        );
        drop(seen);
        assert_eq!(session.quick_reply(99).await, SubmitOutcome::Ignored);
    }

    #[tokio::test]
    async fn product_scope_without_selection_answers_locally() {
        let backend = FakeBackend::default();
        let mut session = AssistantSession::product(&backend, fast_reveal());

        assert_eq!(
            session.submit("cocok untuk apa?").await,
            SubmitOutcome::PromptedSelection
        );

        let messages = session.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::Assistant);
        assert_eq!(messages[0].text, SELECT_PRODUCT_PROMPT);
        assert!(!session.is_busy());
        assert!(backend.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn selecting_a_product_scopes_the_query_and_resets_the_chat() {
        let backend = FakeBackend::scripted(vec![Ok("Hoodie hangat.".to_string())]);
        let mut session = AssistantSession::product(&backend, fast_reveal());

        session.submit("halo").await; // local prompt
        session.select_product(4);
        assert!(session.messages().is_empty());

        session.submit("cocok untuk cuaca dingin?").await;
        session.settled().await;

        let seen = backend.seen.lock().unwrap();
        assert_eq!(
            seen[0],
            Query::Product {
                product_id: 4,
                intent: "cocok untuk cuaca dingin?".to_string()
            }
        );
    }

    #[tokio::test]
    async fn clear_during_a_reveal_leaves_no_revealing_message() {
        let backend = FakeBackend::scripted(vec![Ok("jawaban yang panjang sekali".to_string())]);
        let mut session = AssistantSession::support(
            &backend,
            RevealConfig {
                chunk: 1,
                tick: Duration::from_millis(20),
            },
        );

        session.submit("halo").await;
        assert!(session.is_busy());
        session.clear();

        assert!(session.messages().is_empty());
        assert!(!session.is_busy());
    }

    #[test]
    fn state_transitions_reject_reentrant_turns() {
        let mut state = SessionState::default();
        let ids = state.begin_turn("halo").expect("first turn opens");
        assert!(state.busy);
        assert!(state.begin_turn("lagi").is_none());
        assert_eq!(state.transcript.len(), 2);

        state.fail_turn(&ids.placeholder_id, "gagal");
        assert!(!state.busy);
        assert_eq!(state.transcript.len(), 2);
        assert_eq!(state.transcript.last().unwrap().text, "gagal");
    }
}
