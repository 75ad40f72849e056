mod config;
mod console;
mod engine;
mod prompts;
mod render;
mod runner;
mod server;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::Request;
use clap::Parser;
use dotenvy::dotenv;
use sentry::integrations::tower::{NewSentryLayer, SentryHttpLayer};
use std::error::Error;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::console::events::ConsoleEventType;
use crate::console::filters::ContentFilter;
use crate::console::format::ReturnFormat;
use crate::console::{Console, FormUpdate};
use crate::engine::PromptEngine;
use crate::engine::jigsaw::HttpPromptEngine;
use crate::prompts::memory_repository::MemoryPromptRepository;

#[derive(Parser)]
#[command(name = "prompt-console", about = "Run prompt templates against a streaming prompt engine")]
enum Cli {
    /// Start the HTTP server (default when no subcommand is given)
    Serve,
    /// Execute one prompt and print the rendered result
    Run {
        /// Prompt template, e.g. 'Tell me a story about {input}'
        #[arg(long)]
        prompt: String,
        /// Value bound to {input}
        #[arg(long, default_value = "")]
        input: String,
        /// Output format: markdown, json, html or text
        #[arg(long, default_value = "markdown")]
        format: ReturnFormat,
        /// Content filter to guard against (repeatable)
        #[arg(long = "filter")]
        filters: Vec<ContentFilter>,
        /// Print chunks as they arrive instead of the rendered result
        #[arg(long)]
        stream: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();

    // Default to Serve when no subcommand is given, but still allow --help and --version.
    let args: Vec<String> = std::env::args().collect();
    let cli = if args.len() <= 1 { Cli::Serve } else { Cli::parse() };

    let config = config::Config::from_env()?;

    match cli {
        Cli::Serve => run_server(config).await,
        Cli::Run {
            prompt,
            input,
            format,
            filters,
            stream,
        } => {
            init_tracing("prompt_console=warn");
            run_once(config, prompt, input, format, filters, stream).await?;
            Ok(())
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_tree::HierarchicalLayer::new(2).with_targets(true).with_bracketed_fields(false))
        .with(sentry::integrations::tracing::layer().event_filter(
            |metadata| match *metadata.level() {
                tracing::Level::ERROR => sentry::integrations::tracing::EventFilter::Event,
                tracing::Level::WARN | tracing::Level::INFO => {
                    sentry::integrations::tracing::EventFilter::Breadcrumb
                }
                _ => sentry::integrations::tracing::EventFilter::Ignore,
            },
        ))
        .init();
}

fn build_console(config: &config::Config) -> Result<Console> {
    let http_client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()
        .context("failed to build HTTP client")?;

    let engine: Arc<dyn PromptEngine> = Arc::new(HttpPromptEngine::new(
        http_client,
        config.api_key.clone(),
        config.api_base_url.clone(),
    ));

    Ok(Console::new(engine, Arc::new(MemoryPromptRepository::new())))
}

async fn run_server(config: config::Config) -> Result<(), Box<dyn Error>> {
    init_tracing("prompt_console=info,tower_http=warn,hyper=warn");

    let _guard = sentry::init((
        config.sentry_dsn.clone().unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(config.environment.clone().into()),
            send_default_pii: true,
            traces_sample_rate: 0.2,
            enable_logs: true,
            ..Default::default()
        },
    ));

    let console = Arc::new(build_console(&config)?);
    let app_state = server::AppState { console };

    let app = server::create_app(app_state)
        .layer(SentryHttpLayer::new().enable_transaction())
        .layer(NewSentryLayer::<Request<Body>>::new_from_top());

    let port = config.port;
    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(engine = %config.api_base_url, "Prompt console ready");
    println!("Listening on http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_once(
    config: config::Config,
    prompt: String,
    input: String,
    format: ReturnFormat,
    filters: Vec<ContentFilter>,
    stream: bool,
) -> Result<()> {
    let console = build_console(&config)?;
    console
        .update_form(FormUpdate {
            return_format: Some(format),
            ..Default::default()
        })
        .await;
    let mut filters = filters;
    filters.sort_by_key(|f| f.as_str());
    filters.dedup();
    for filter in filters {
        console.toggle_filter(filter).await;
    }

    let mut events = console.subscribe();
    let started = console.run(&prompt, &input).await;

    if stream {
        while let Ok(event) = events.recv().await {
            match event.event_type {
                ConsoleEventType::Chunk => {
                    print!("{}", event.message);
                    let _ = std::io::stdout().flush();
                }
                ConsoleEventType::RunCompleted
                | ConsoleEventType::RunFailed
                | ConsoleEventType::RunCancelled => break,
                ConsoleEventType::RunStarted => {}
            }
        }
        println!();
    }

    started.handle.await.context("prompt run task panicked")?;

    let form = console.snapshot().await;
    if let Some(error) = form.error {
        anyhow::bail!(error);
    }
    if !stream {
        println!("{}", render::render_plain(&form.result, form.return_format));
    }
    Ok(())
}
