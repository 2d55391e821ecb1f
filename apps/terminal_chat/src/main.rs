use std::{io::Write as _, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{load_settings, ChatClient, ConversationStore, StoreEvent};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::RecvError},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod render;
mod repl;

use repl::Command;

#[derive(Parser, Debug)]
#[command(about = "Terminal client for the research chat API")]
struct Args {
    /// API base URL; overrides chat_client.toml and the environment.
    #[arg(long)]
    api_base_url: Option<String>,
    /// Origin the client is considered to be served from.
    #[arg(long)]
    origin: Option<String>,
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(v) = args.api_base_url {
        settings.api_base_url = Some(v);
    }
    if let Some(v) = args.origin {
        settings.origin = Some(v);
    }
    if let Some(v) = args.timeout_secs {
        settings.request_timeout_secs = v;
    }

    let client = ChatClient::from_settings(&settings).context("failed to configure chat client")?;
    info!(
        "api: endpoint={} timeout_secs={}",
        client.base_url(),
        settings.request_timeout_secs
    );
    check_health(&client).await;

    let store = ConversationStore::new(Arc::new(client.clone()), settings.session_title.clone());
    spawn_notification_printer(store.subscribe_events());

    println!("{}", render::welcome_banner());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().context("failed to flush stdout")?;

        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            break;
        };

        match Command::parse(&line) {
            Command::Exit => break,
            Command::Empty => continue,
            Command::Health => check_health(&client).await,
            Command::Transcript => {
                println!("{}", render::render_transcript(&store.snapshot().await));
            }
            Command::NewSession => {
                store.start_new_session().await;
                println!("{}", render::welcome_banner());
            }
            Command::Submit(text) => {
                let Some(turn) = store.send_user_message(text).await else {
                    continue;
                };
                println!("{}", render::submission_indicator());
                turn.await.context("chat turn task failed")?;

                let snapshot = store.snapshot().await;
                if let Some(reply) = snapshot.session.messages.last() {
                    println!("{}", render::render_message(reply));
                }
            }
        }
    }

    Ok(())
}

async fn check_health(client: &ChatClient) {
    match client.health_check().await {
        Ok(health) => info!("api: health status={} at={}", health.status, health.timestamp),
        Err(err) => warn!("api: health check failed: {err}"),
    }
}

fn spawn_notification_printer(mut events: broadcast::Receiver<StoreEvent>) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(StoreEvent::Notification(notification)) => {
                    eprintln!("{}", render::render_notification(&notification));
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!("ui: notification printer lagged skipped={skipped}");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}
