//! Plain-text rendering of a conversation for the terminal.

use std::fmt::Write as _;

use chrono::{DateTime, Local, Utc};
use client_core::{ConversationSnapshot, Notification};
use shared::{
    domain::{Intent, ProcessingPhase, Role},
    protocol::{Message, ResearchSource},
};

pub const EXAMPLE_PROMPTS: &[(&str, &[&str])] = &[
    (
        "Research",
        &[
            "What are the latest developments in quantum computing?",
            "Research papers on climate change mitigation strategies",
            "Studies about AI impact on healthcare outcomes",
            "Recent findings in renewable energy efficiency",
        ],
    ),
    (
        "Analysis",
        &[
            "Compare different machine learning approaches",
            "Analyze trends in sustainable technology adoption",
            "What are the ethical implications of gene editing?",
            "Economic impact of automation on employment",
        ],
    ),
];

pub fn welcome_banner() -> String {
    let mut out = String::from(
        "Research Assistant - intelligent research & conversation\n\
         Type a question, '/new' for a fresh session, '/health' to ping the API, 'exit' to quit.\n",
    );
    for (category, prompts) in EXAMPLE_PROMPTS {
        let _ = writeln!(out, "\n{category}:");
        for prompt in prompts.iter() {
            let _ = writeln!(out, "  - {prompt}");
        }
    }
    out
}

pub fn session_header(snapshot: &ConversationSnapshot) -> String {
    let count = snapshot.session.messages.len();
    if count == 0 {
        snapshot.session.title.clone()
    } else {
        format!("{} ({count} messages)", snapshot.session.title)
    }
}

pub fn busy_indicator(phase: Option<ProcessingPhase>) -> String {
    format!("... {}", ProcessingPhase::label_for(phase))
}

/// Busy line printed right after a submission, which always starts in classification.
pub fn submission_indicator() -> String {
    busy_indicator(Some(ProcessingPhase::Classification))
}

fn format_time(timestamp: &DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M").to_string()
}

pub fn render_message(message: &Message) -> String {
    let mut out = String::new();
    let speaker = match message.role {
        Role::User => "You",
        Role::Assistant => "Assistant",
    };
    let _ = write!(out, "{speaker} [{}]", format_time(&message.timestamp));
    match message.intent {
        Some(Intent::Research) => out.push_str(" (Research Mode)"),
        Some(Intent::Conversation) => out.push_str(" (Conversation)"),
        None => {}
    }
    out.push('\n');

    for line in message.content.lines() {
        let _ = writeln!(out, "  {line}");
    }

    if message.has_research() {
        let sources = message.sources.as_deref().unwrap_or_default();
        let _ = writeln!(out, "  Sources ({})", sources.len());
        for (index, source) in sources.iter().enumerate() {
            render_source(&mut out, index + 1, source);
        }
    }

    if let Some(reasoning) = message.reasoning.as_deref().filter(|r| !r.is_empty()) {
        let _ = writeln!(out, "  ({reasoning})");
    }

    out
}

fn render_source(out: &mut String, number: usize, source: &ResearchSource) {
    let _ = writeln!(out, "    [{number}] {}", source.title);
    let _ = writeln!(out, "        {}", source.url);
    if !source.description.is_empty() {
        let _ = writeln!(out, "        {}", source.description);
    }
    let authors = source
        .metadata
        .as_ref()
        .and_then(|metadata| metadata.authors.as_ref())
        .filter(|authors| !authors.is_empty());
    if let Some(authors) = authors {
        let _ = writeln!(out, "        Authors: {}", authors.join(", "));
    }
}

/// Full transcript in conversation order, followed by the busy line when a turn is outstanding.
pub fn render_transcript(snapshot: &ConversationSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", session_header(snapshot));
    for message in &snapshot.session.messages {
        out.push_str(&render_message(message));
        out.push('\n');
    }
    if snapshot.is_processing() {
        out.push_str(&busy_indicator(snapshot.processing));
        out.push('\n');
    }
    out
}

pub fn render_notification(notification: &Notification) -> String {
    format!(
        "! {}: {} ({})",
        notification.title, notification.description, notification.detail
    )
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
