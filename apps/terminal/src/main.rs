use std::{io, path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser;
use client_core::{HttpRemoteService, Session};
use shared::domain::Namespace;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod commands;
mod config;
mod render;

use app::TerminalApp;
use config::{load_settings, Overrides};

#[derive(Parser, Debug)]
#[command(name = "talk-to-code", about = "Chat with an ingested code repository")]
struct Args {
    /// Base URL of the ingestion/query service.
    #[arg(long)]
    service_url: Option<String>,
    #[arg(long)]
    namespace: Option<String>,
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Settings file; defaults to ./talk.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Submit this repository right away instead of prompting for one.
    #[arg(long)]
    repo: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the conversation, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let settings = load_settings(
        args.config.as_deref(),
        Overrides {
            service_url: args.service_url,
            namespace: args.namespace,
            timeout_secs: args.timeout_secs,
        },
    )?;
    let service = HttpRemoteService::new(&settings.service_url, settings.request_timeout())?;
    info!(
        ingest = %service.ingest_url(),
        query = %service.query_url(),
        namespace = %settings.namespace,
        "using remote service"
    );

    let session = Session::new(Arc::new(service), Namespace::new(settings.namespace));
    let mut app = TerminalApp::new(session, io::stdout(), io::stderr());
    app.run(BufReader::new(tokio::io::stdin()), args.repo).await
}
