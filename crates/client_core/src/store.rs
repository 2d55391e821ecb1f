use std::sync::Arc;

use shared::{
    domain::{MessageId, ProcessingPhase, SessionId},
    protocol::{ChatRequest, ChatSession, Message},
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{
    client::ChatBackend,
    error::{ChatClientError, ChatErrorKind},
    reducer::{reduce, Action, ConversationState, Transition},
};

pub const APOLOGY_MESSAGE: &str =
    "I apologize, but I encountered an error while processing your request. Please try again.";
pub const FAILURE_TITLE: &str = "Error";
pub const FAILURE_DESCRIPTION: &str =
    "Something went wrong while processing your message. Please try again.";

/// Transient, non-blocking failure report for whoever renders the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub detail: String,
}

impl Notification {
    fn turn_failed(err: &ChatClientError) -> Self {
        Self {
            title: FAILURE_TITLE.into(),
            description: FAILURE_DESCRIPTION.into(),
            detail: err.to_string(),
        }
    }
}

/// Broadcast while the state lock is held, so receivers see events in the
/// order the state changed.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    MessageAppended {
        session_id: SessionId,
        message: Message,
    },
    ProcessingChanged(Option<ProcessingPhase>),
    SessionReset(SessionId),
    Notification(Notification),
    StaleResponseDropped {
        session_id: SessionId,
    },
}

#[derive(Debug, Clone)]
pub struct ConversationSnapshot {
    pub session: ChatSession,
    pub processing: Option<ProcessingPhase>,
}

impl ConversationSnapshot {
    pub fn is_processing(&self) -> bool {
        self.processing.is_some()
    }
}

/// A submitted user turn whose network half has not run yet.
#[derive(Debug)]
pub(crate) struct PendingTurn {
    session_id: SessionId,
    request: ChatRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Answered(MessageId),
    Failed(ChatErrorKind),
    /// The session was replaced while the request was in flight; the reply was dropped.
    Stale,
}

/// Clears the processing flag if a spawned turn is dropped before it resolves.
struct TurnGuard {
    store: Arc<ConversationStore>,
    session_id: Option<SessionId>,
}

impl TurnGuard {
    fn disarm(mut self) {
        self.session_id = None;
    }
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        let Some(session_id) = self.session_id.take() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let store = Arc::clone(&self.store);
        runtime.spawn(async move { store.abandon_turn(session_id).await });
    }
}

/// Single writer for the active session and its processing flag.
pub struct ConversationStore {
    backend: Arc<dyn ChatBackend>,
    session_title: String,
    inner: Mutex<ConversationState>,
    events: broadcast::Sender<StoreEvent>,
}

impl ConversationStore {
    pub fn new(backend: Arc<dyn ChatBackend>, session_title: impl Into<String>) -> Arc<Self> {
        let session_title = session_title.into();
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            backend,
            inner: Mutex::new(ConversationState::new(ChatSession::new(
                session_title.clone(),
            ))),
            session_title,
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> ConversationSnapshot {
        let guard = self.inner.lock().await;
        ConversationSnapshot {
            session: guard.session.clone(),
            processing: guard.flow.processing,
        }
    }

    /// Submits `text` and resolves the turn on a spawned task.
    ///
    /// Returns `None` without touching state when `text` is blank or a turn is
    /// already outstanding. Aborting the returned handle leaves the user message
    /// in place and returns the store to idle.
    pub async fn send_user_message(
        self: &Arc<Self>,
        text: &str,
    ) -> Option<JoinHandle<TurnOutcome>> {
        let turn = self.submit_user_message(text).await?;
        let guard = TurnGuard {
            store: Arc::clone(self),
            session_id: Some(turn.session_id.clone()),
        };
        let store = Arc::clone(self);
        Some(tokio::spawn(async move {
            let outcome = store.resolve_turn(turn).await;
            guard.disarm();
            outcome
        }))
    }

    /// Discards the session and processing state; any in-flight reply becomes stale.
    pub async fn start_new_session(&self) {
        let session = ChatSession::new(self.session_title.clone());
        let session_id = session.id.clone();

        let mut guard = self.inner.lock().await;
        reduce(&mut guard, Action::Reset { session });
        info!("store: new session started session={session_id}");
        let _ = self.events.send(StoreEvent::SessionReset(session_id));
        let _ = self.events.send(StoreEvent::ProcessingChanged(None));
    }

    /// Appends the user message and raises the processing flag. The returned
    /// turn must reach [`ConversationStore::resolve_turn`] to clear it again.
    pub(crate) async fn submit_user_message(&self, text: &str) -> Option<PendingTurn> {
        let message = Message::user(text.trim());

        let mut guard = self.inner.lock().await;
        match reduce(
            &mut guard,
            Action::Submit {
                message: message.clone(),
            },
        ) {
            Transition::Applied => {}
            Transition::Rejected(reason) => {
                debug!("store: submission rejected reason={reason:?}");
                return None;
            }
            Transition::Stale => return None,
        }

        let session_id = guard.session.id.clone();
        let request = ChatRequest {
            message: message.content.clone(),
            session_id: Some(session_id.clone()),
            history: guard.session.messages.clone(),
        };
        info!(
            "store: user turn submitted session={} history_len={}",
            session_id,
            request.history.len()
        );
        let _ = self.events.send(StoreEvent::MessageAppended {
            session_id: session_id.clone(),
            message,
        });
        let _ = self
            .events
            .send(StoreEvent::ProcessingChanged(guard.flow.processing));

        Some(PendingTurn {
            session_id,
            request,
        })
    }

    /// Runs the network half of a turn and applies whatever comes back.
    pub(crate) async fn resolve_turn(&self, turn: PendingTurn) -> TurnOutcome {
        let PendingTurn {
            session_id,
            request,
        } = turn;

        match self.backend.chat(request).await {
            Ok(reply) => self.apply_reply(session_id, reply).await,
            Err(err) => self.apply_failure(session_id, err).await,
        }
    }

    async fn apply_reply(&self, session_id: SessionId, reply: Message) -> TurnOutcome {
        let reply_id = reply.id.clone();

        let mut guard = self.inner.lock().await;
        let transition = reduce(
            &mut guard,
            Action::ResponseReceived {
                session_id: session_id.clone(),
                message: reply,
            },
        );
        if transition == Transition::Stale {
            self.drop_stale(session_id);
            return TurnOutcome::Stale;
        }

        if let Some(message) = guard.session.messages.last() {
            info!(
                "store: assistant reply appended session={} intent={:?} sources={}",
                session_id,
                message.intent,
                message.sources.as_ref().map_or(0, Vec::len)
            );
            let _ = self.events.send(StoreEvent::MessageAppended {
                session_id,
                message: message.clone(),
            });
        }
        let _ = self.events.send(StoreEvent::ProcessingChanged(None));
        TurnOutcome::Answered(reply_id)
    }

    async fn apply_failure(&self, session_id: SessionId, err: ChatClientError) -> TurnOutcome {
        error!("store: chat turn failed session={session_id}: {err}");

        let apology = Message::assistant(APOLOGY_MESSAGE);
        let mut guard = self.inner.lock().await;
        let transition = reduce(
            &mut guard,
            Action::RequestFailed {
                session_id: session_id.clone(),
                apology: apology.clone(),
            },
        );
        if transition == Transition::Stale {
            self.drop_stale(session_id);
            return TurnOutcome::Stale;
        }

        let _ = self.events.send(StoreEvent::MessageAppended {
            session_id,
            message: apology,
        });
        let _ = self.events.send(StoreEvent::ProcessingChanged(None));
        let _ = self
            .events
            .send(StoreEvent::Notification(Notification::turn_failed(&err)));
        TurnOutcome::Failed(err.kind())
    }

    async fn abandon_turn(&self, session_id: SessionId) {
        let mut guard = self.inner.lock().await;
        let transition = reduce(
            &mut guard,
            Action::TurnAbandoned {
                session_id: session_id.clone(),
            },
        );
        if transition == Transition::Applied {
            warn!("store: turn abandoned before a reply session={session_id}");
            let _ = self.events.send(StoreEvent::ProcessingChanged(None));
        }
    }

    fn drop_stale(&self, session_id: SessionId) {
        warn!("store: dropping reply for inactive session={session_id}");
        let _ = self
            .events
            .send(StoreEvent::StaleResponseDropped { session_id });
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
