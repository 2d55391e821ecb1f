//! Client side of the research chat: the HTTP API wrapper and the conversation store that drives it.

pub mod client;
pub mod config;
pub mod error;
pub mod reducer;
pub mod store;

pub use client::{ChatBackend, ChatClient};
pub use config::{load_settings, resolve_base_url, ClientSettings};
pub use error::{ChatClientError, ChatErrorKind};
pub use store::{ConversationSnapshot, ConversationStore, Notification, StoreEvent, TurnOutcome};
