use super::*;

use shared::{
    domain::SourceKind,
    protocol::{ChatSession, SourceMetadata},
};

fn source(id: &str, title: &str, authors: Option<Vec<&str>>) -> ResearchSource {
    ResearchSource {
        id: id.into(),
        title: title.into(),
        url: format!("https://example.org/{id}"),
        description: format!("about {title}"),
        kind: SourceKind::Paper,
        metadata: authors.map(|authors| SourceMetadata {
            authors: Some(authors.into_iter().map(String::from).collect()),
            ..SourceMetadata::default()
        }),
    }
}

fn research_reply() -> Message {
    let mut reply = Message::assistant("Qubits are getting better.\nError rates are falling.");
    reply.intent = Some(Intent::Research);
    reply.sources = Some(vec![
        source("1", "Surface codes", Some(vec!["A. Author", "B. Author"])),
        source("2", "Logical qubits", None),
    ]);
    reply.reasoning = Some("Research conducted for query: qubits".into());
    reply
}

#[test]
fn research_reply_lists_numbered_sources() {
    let rendered = render_message(&research_reply());

    assert!(rendered.starts_with("Assistant ["));
    assert!(rendered.contains("(Research Mode)"));
    assert!(rendered.contains("  Error rates are falling.\n"));
    assert!(rendered.contains("Sources (2)"));
    assert!(rendered.contains("[1] Surface codes"));
    assert!(rendered.contains("[2] Logical qubits"));
    assert!(rendered.contains("Authors: A. Author, B. Author"));
    assert!(rendered.contains("(Research conducted for query: qubits)"));
}

#[test]
fn conversation_reply_has_badge_but_no_sources() {
    let mut reply = Message::assistant("Happy to help.");
    reply.intent = Some(Intent::Conversation);

    let rendered = render_message(&reply);
    assert!(rendered.contains("(Conversation)"));
    assert!(!rendered.contains("Sources"));
}

#[test]
fn user_message_has_no_badge() {
    let rendered = render_message(&Message::user("Hello"));
    assert!(rendered.starts_with("You ["));
    assert!(!rendered.contains("(Research Mode)"));
    assert!(rendered.ends_with("  Hello\n"));
}

#[test]
fn transcript_keeps_order_and_shows_busy_phase() {
    let mut session = ChatSession::new("Research Session");
    session.append(Message::user("first question"));
    session.append(research_reply());
    session.append(Message::user("follow up"));

    let snapshot = ConversationSnapshot {
        session,
        processing: Some(ProcessingPhase::Classification),
    };
    let rendered = render_transcript(&snapshot);

    assert!(rendered.starts_with("== Research Session (3 messages) =="));
    let first = rendered.find("first question").expect("first");
    let second = rendered.find("Qubits are getting better.").expect("second");
    let third = rendered.find("follow up").expect("third");
    assert!(first < second && second < third);
    assert!(rendered.trim_end().ends_with("... Analyzing intent..."));
}

#[test]
fn idle_empty_session_renders_title_only() {
    let snapshot = ConversationSnapshot {
        session: ChatSession::new("Research Session"),
        processing: None,
    };
    assert_eq!(render_transcript(&snapshot), "== Research Session ==\n");
}

#[test]
fn notification_includes_failure_detail() {
    let notification = Notification {
        title: "Error".into(),
        description: "Something went wrong".into(),
        detail: "model unavailable".into(),
    };
    assert_eq!(
        render_notification(&notification),
        "! Error: Something went wrong (model unavailable)"
    );
}

#[test]
fn welcome_banner_lists_examples() {
    let banner = welcome_banner();
    assert!(banner.contains("Research:"));
    assert!(banner.contains("  - What are the latest developments in quantum computing?"));
}

#[test]
fn submission_indicator_names_classification_phase() {
    assert_eq!(submission_indicator(), "... Analyzing intent...");
    assert_eq!(busy_indicator(None), "... Processing...");
}
