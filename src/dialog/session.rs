//! Conversation session controller.
//!
//! Owns the transcript, the pending buttons, and the busy flag, and
//! sequences open/turn/close through a [`DialogApi`] and the trace
//! normalizer. Gateway failures never escape: a failed turn still produces
//! a visible model-side reply.

use crate::dialog::trace::{Button, NormalizedTurn, normalize_traces};
use crate::gateway::DialogApi;

/// Shown when the engine returns no greeting, or none at all.
pub const DEFAULT_GREETING: &str = "Say Hello to get started!";

/// Model-side reply appended when a turn fails or yields nothing.
const FALLBACK_REPLY: &str = "Unable to reply.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

/// One transcript entry. Immutable once appended; order is display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// A conversation bound to one authenticated identity.
pub struct ChatSession<D> {
    gateway: D,
    identity: Option<String>,
    transcript: Vec<Message>,
    buttons: Vec<Button>,
    busy: bool,
}

impl<D: DialogApi> ChatSession<D> {
    pub fn new(gateway: D) -> Self {
        Self {
            gateway,
            identity: None,
            transcript: Vec::new(),
            buttons: Vec::new(),
            busy: false,
        }
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Whether a resolved gateway result still applies. A result that lands
    /// after the session moved to another identity (or closed) is stale and
    /// must be dropped, since the calls cannot be cancelled once in flight.
    fn is_current(&self, identity: &str) -> bool {
        self.identity.as_deref() == Some(identity)
    }

    /// Start a conversation for `identity`: best-effort engine reset, then
    /// launch. The transcript is never left empty — if the engine offers no
    /// greeting (or the launch fails outright) the default greeting stands
    /// in.
    pub async fn open(&mut self, identity: &str) {
        if self.busy {
            return;
        }
        self.busy = true;
        self.identity = Some(identity.to_string());
        self.transcript.clear();
        self.buttons.clear();

        if let Err(e) = self.gateway.reset(identity).await {
            tracing::warn!("pre-launch reset failed, continuing: {e}");
        }
        let turn = match self.gateway.launch(identity).await {
            Ok(reply) => normalize_traces(&reply.raw),
            Err(e) => {
                tracing::warn!("launch failed, using default greeting: {e}");
                NormalizedTurn::default()
            }
        };
        if self.is_current(identity) {
            let greeting = if turn.messages.is_empty() {
                vec![DEFAULT_GREETING.to_string()]
            } else {
                turn.messages
            };
            self.transcript = greeting.into_iter().map(Message::model).collect();
            self.buttons = turn.buttons;
        }
        self.busy = false;
    }

    /// One user turn: the user message is appended before the network call
    /// resolves, and a failed (or empty) reply appends the fallback model
    /// message so the transcript never stalls on a user turn.
    pub async fn submit_text(&mut self, text: &str) {
        if self.busy {
            return;
        }
        let Some(identity) = self.identity.clone() else {
            return;
        };
        self.busy = true;
        self.transcript.push(Message::user(text));
        self.buttons.clear();

        match self.gateway.send(&identity, text).await {
            Ok(reply) => {
                if self.is_current(&identity) {
                    let turn = normalize_traces(&reply.raw);
                    if turn.messages.is_empty() {
                        self.transcript.push(Message::model(FALLBACK_REPLY));
                    } else {
                        self.transcript
                            .extend(turn.messages.into_iter().map(Message::model));
                    }
                    self.buttons = turn.buttons;
                }
            }
            Err(e) => {
                tracing::warn!("turn failed: {e}");
                if self.is_current(&identity) {
                    self.transcript.push(Message::model(FALLBACK_REPLY));
                    self.buttons.clear();
                }
            }
        }
        self.busy = false;
    }

    /// A button click: hide the buttons, then treat the button's value as
    /// typed user text.
    pub async fn submit_choice(&mut self, value: &str) {
        if self.busy {
            return;
        }
        self.buttons.clear();
        let value = value.to_string();
        self.submit_text(&value).await;
    }

    /// End the session: best-effort engine reset, then the caller's logout
    /// continuation runs no matter what.
    pub async fn close<F: FnOnce()>(&mut self, on_logout: F) {
        if let Some(identity) = self.identity.take() {
            if let Err(e) = self.gateway.reset(&identity).await {
                tracing::warn!("logout reset failed: {e}");
            }
        }
        self.transcript.clear();
        self.buttons.clear();
        self.busy = false;
        on_logout();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConversationError;
    use crate::gateway::TurnReply;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted dialog engine: serves a fixed raw trace array, optionally
    /// failing sends/launches/resets, and counts calls.
    #[derive(Default)]
    struct MockDialog {
        raw: Mutex<serde_json::Value>,
        fail_turns: bool,
        fail_reset: bool,
        sends: AtomicUsize,
        launches: AtomicUsize,
        resets: AtomicUsize,
    }

    impl MockDialog {
        fn with_raw(raw: serde_json::Value) -> Self {
            Self {
                raw: Mutex::new(raw),
                ..Default::default()
            }
        }

        fn reply(&self) -> TurnReply {
            TurnReply {
                messages: Vec::new(),
                raw: self.raw.lock().unwrap().clone(),
            }
        }
    }

    #[async_trait]
    impl DialogApi for &MockDialog {
        async fn send(&self, _identity: &str, _text: &str) -> Result<TurnReply, ConversationError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            if self.fail_turns {
                return Err(ConversationError::Engine("engine down".into()));
            }
            Ok(self.reply())
        }

        async fn launch(&self, _identity: &str) -> Result<TurnReply, ConversationError> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            if self.fail_turns {
                return Err(ConversationError::Engine("engine down".into()));
            }
            Ok(self.reply())
        }

        async fn reset(&self, _identity: &str) -> Result<(), ConversationError> {
            self.resets.fetch_add(1, Ordering::SeqCst);
            if self.fail_reset {
                return Err(ConversationError::Engine("reset refused".into()));
            }
            Ok(())
        }
    }

    fn greeting_raw() -> serde_json::Value {
        json!([
            {"type": "speak", "payload": {"message": "Welcome back!"}},
            {"type": "choice", "payload": {"buttons": [{"name": "Start"}]}},
        ])
    }

    #[tokio::test]
    async fn open_seeds_transcript_from_engine_greeting() {
        let mock = MockDialog::with_raw(greeting_raw());
        let mut session = ChatSession::new(&mock);

        session.open("a@b.com").await;

        assert_eq!(session.identity(), Some("a@b.com"));
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.transcript()[0].text, "Welcome back!");
        assert_eq!(session.transcript()[0].role, Role::Model);
        assert_eq!(session.buttons().len(), 1);
        assert_eq!(mock.resets.load(Ordering::SeqCst), 1);
        assert_eq!(mock.launches.load(Ordering::SeqCst), 1);
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn open_falls_back_to_default_greeting_when_launch_fails() {
        let mock = MockDialog {
            fail_turns: true,
            ..Default::default()
        };
        let mut session = ChatSession::new(&mock);

        session.open("a@b.com").await;

        assert_eq!(
            session.transcript(),
            &[Message::model(DEFAULT_GREETING)]
        );
        assert!(session.buttons().is_empty());
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn open_survives_a_failed_pre_launch_reset() {
        let mock = MockDialog {
            raw: Mutex::new(greeting_raw()),
            fail_reset: true,
            ..Default::default()
        };
        let mut session = ChatSession::new(&mock);

        session.open("a@b.com").await;

        assert_eq!(mock.launches.load(Ordering::SeqCst), 1);
        assert_eq!(session.transcript()[0].text, "Welcome back!");
    }

    #[tokio::test]
    async fn turn_appends_user_then_model_messages() {
        let mock = MockDialog::with_raw(json!([
            {"type": "text", "payload": {"message": "Sure."}},
            {"type": "text", "payload": {"message": "Anything else?"}},
        ]));
        let mut session = ChatSession::new(&mock);
        session.open("a@b.com").await;
        let before = session.transcript().len();

        session.submit_text("help me").await;

        let added = &session.transcript()[before..];
        assert_eq!(added.len(), 3);
        assert_eq!(added[0], Message::user("help me"));
        assert_eq!(added[1], Message::model("Sure."));
        assert_eq!(added[2], Message::model("Anything else?"));
    }

    #[tokio::test]
    async fn failed_turn_still_gets_a_model_reply() {
        let mock = MockDialog::with_raw(greeting_raw());
        let mut session = ChatSession::new(&mock);
        session.open("a@b.com").await;
        let before = session.transcript().len();
        *mock.raw.lock().unwrap() = json!(null);

        // Engine rejects the send from here on
        let failing = MockDialog {
            fail_turns: true,
            ..Default::default()
        };
        let mut failing_session = ChatSession::new(&failing);
        failing_session.open("a@b.com").await;
        let failing_before = failing_session.transcript().len();

        failing_session.submit_text("hello?").await;

        let added = &failing_session.transcript()[failing_before..];
        assert_eq!(added.len(), 2);
        assert_eq!(added[0].role, Role::User);
        assert_eq!(added[1], Message::model(FALLBACK_REPLY));
        assert!(failing_session.buttons().is_empty());
        assert!(!failing_session.is_busy());

        // An empty-but-successful reply also yields the fallback
        session.submit_text("anything").await;
        let added = &session.transcript()[before..];
        assert_eq!(added.len(), 2);
        assert_eq!(added[1], Message::model(FALLBACK_REPLY));
    }

    #[tokio::test]
    async fn turn_replaces_pending_buttons() {
        let mock = MockDialog::with_raw(greeting_raw());
        let mut session = ChatSession::new(&mock);
        session.open("a@b.com").await;
        assert_eq!(session.buttons().len(), 1);

        *mock.raw.lock().unwrap() = json!([
            {"type": "text", "payload": {"message": "Pick:"}},
            {"type": "choice", "payload": {"buttons": [{"name": "A"}, {"name": "B"}]}},
        ]);
        session.submit_text("options").await;

        let labels: Vec<_> = session.buttons().iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn button_click_is_just_a_user_turn_with_the_value() {
        let mock = MockDialog::with_raw(greeting_raw());
        let mut session = ChatSession::new(&mock);
        session.open("a@b.com").await;
        let before = session.transcript().len();

        *mock.raw.lock().unwrap() = json!([
            {"type": "text", "payload": {"message": "Starting."}}
        ]);
        session.submit_choice("Start").await;

        let added = &session.transcript()[before..];
        assert_eq!(added[0], Message::user("Start"));
        assert_eq!(added[1], Message::model("Starting."));
        assert_eq!(mock.sends.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn turn_while_busy_is_a_silent_noop() {
        let mock = MockDialog::with_raw(greeting_raw());
        let mut session = ChatSession::new(&mock);
        session.open("a@b.com").await;
        let before = session.transcript().len();
        session.busy = true;

        session.submit_text("dropped").await;
        session.submit_choice("also dropped").await;

        assert_eq!(session.transcript().len(), before);
        assert_eq!(mock.sends.load(Ordering::SeqCst), 0);
        assert!(session.is_busy());
    }

    #[tokio::test]
    async fn turn_without_an_open_session_is_a_noop() {
        let mock = MockDialog::default();
        let mut session = ChatSession::new(&mock);

        session.submit_text("to nobody").await;

        assert!(session.transcript().is_empty());
        assert_eq!(mock.sends.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn close_invokes_logout_even_when_reset_fails() {
        let mock = MockDialog {
            raw: Mutex::new(greeting_raw()),
            fail_reset: true,
            ..Default::default()
        };
        let mut session = ChatSession::new(&mock);
        session.open("a@b.com").await;

        let mut logged_out = false;
        session.close(|| logged_out = true).await;

        assert!(logged_out);
        assert!(session.identity().is_none());
        assert!(session.transcript().is_empty());
        assert!(session.buttons().is_empty());
        // Both the pre-launch reset and the logout reset were attempted
        assert_eq!(mock.resets.load(Ordering::SeqCst), 2);
    }
}
