//! Reducer-style transitions for the conversation state.
//!
//! All mutation of the active session goes through [`reduce`]. The function does
//! no I/O; the store wraps it with locking, the network call and event fan-out.

use shared::{
    domain::{ProcessingPhase, SessionId},
    protocol::{ChatSession, Message},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowState {
    pub current_message: String,
    pub processing: Option<ProcessingPhase>,
}

impl FlowState {
    pub fn is_processing(&self) -> bool {
        self.processing.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct ConversationState {
    pub session: ChatSession,
    pub flow: FlowState,
}

impl ConversationState {
    pub fn new(session: ChatSession) -> Self {
        Self {
            session,
            flow: FlowState::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    Submit {
        message: Message,
    },
    ResponseReceived {
        session_id: SessionId,
        message: Message,
    },
    RequestFailed {
        session_id: SessionId,
        apology: Message,
    },
    /// The turn went away without a reply; only the processing flag is cleared.
    TurnAbandoned {
        session_id: SessionId,
    },
    Reset {
        session: ChatSession,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    EmptyMessage,
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Rejected(RejectReason),
    /// The action belongs to a session or turn that is no longer active.
    Stale,
}

pub fn reduce(state: &mut ConversationState, action: Action) -> Transition {
    match action {
        Action::Submit { message } => {
            if message.content.trim().is_empty() {
                return Transition::Rejected(RejectReason::EmptyMessage);
            }
            if state.flow.is_processing() {
                return Transition::Rejected(RejectReason::Busy);
            }
            state.flow.current_message = message.content.clone();
            state.flow.processing = Some(ProcessingPhase::Classification);
            state.session.append(message);
            Transition::Applied
        }
        Action::ResponseReceived {
            session_id,
            message,
        } => complete_turn(state, &session_id, message.without_stray_sources()),
        Action::RequestFailed {
            session_id,
            apology,
        } => complete_turn(state, &session_id, apology),
        Action::TurnAbandoned { session_id } => {
            if !owns_turn(state, &session_id) {
                return Transition::Stale;
            }
            state.flow.processing = None;
            Transition::Applied
        }
        Action::Reset { session } => {
            *state = ConversationState::new(session);
            Transition::Applied
        }
    }
}

fn complete_turn(
    state: &mut ConversationState,
    session_id: &SessionId,
    reply: Message,
) -> Transition {
    if !owns_turn(state, session_id) {
        return Transition::Stale;
    }
    state.session.append(reply);
    state.flow.processing = None;
    Transition::Applied
}

fn owns_turn(state: &ConversationState, session_id: &SessionId) -> bool {
    state.session.id == *session_id && state.flow.is_processing()
}
