//! Data model shared between the chat client and anything that renders it.

pub mod domain;
pub mod error;
pub mod protocol;
