//! `gap-extension` command-line driver
//!
//! Runs the full runtime against a simulated page so the service round trips and
//! routing can be exercised from a terminal. Every command prints JSON.

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

use crate::core::context::detect_platform;
use crate::core::gap::{ChatId, ChatOrigin};
use crate::core::service::GapServiceClient;
use crate::runtime::ExtensionRuntime;
use crate::shared::error::{AppError, AppResult};
use crate::shared::settings::{SettingsPatch, SettingsStore};
use crate::shared::types::{ActionKind, ActionRequest, ActionResponse, TransformPayload, WrapPayload};
use crate::system::clipboard::{ClipboardCapability, MemoryClipboard, SystemClipboard};
use crate::system::page::SimulatedPage;

#[derive(Parser)]
#[command(name = "gap-extension")]
#[command(about = "GAP extension core: platform detection and GAP service round trips", long_about = None)]
#[command(version)]
struct Cli {
    /// Settings file (defaults to the per-user config directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Override the GAP service URL (persisted like a popup edit)
    #[arg(long, global = true)]
    service_url: Option<String>,

    /// Use the OS clipboard instead of an in-memory one
    #[arg(long, global = true)]
    system_clipboard: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the platform a URL belongs to
    Detect { url: String },

    /// Check that the GAP service is up
    Health,

    /// List the platforms the service can transform for
    Platforms,

    /// Wrap text as if it were selected on the page at --url
    Wrap {
        #[arg(long, default_value = "about:blank")]
        url: String,
        /// Thread to attach the message to
        #[arg(long)]
        thread: Option<String>,
        #[arg(long, default_value = "assistant")]
        role: String,
        text: String,
    },

    /// Transform an envelope for the platform of --url
    Transform {
        #[arg(long, default_value = "about:blank")]
        url: String,
        /// File holding the envelope, or `-` for stdin
        input: String,
    },

    /// Show what the service knows about a thread
    Context { thread: String },
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Logs go to stderr so stdout stays parseable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(execute(cli)) {
        Ok((output, ok)) => {
            println!("{}", serde_json::to_string_pretty(&output).unwrap_or_else(|_| output.to_string()));
            if ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            println!("{}", json!({ "error": e.to_string() }));
            ExitCode::FAILURE
        }
    }
}

async fn load_settings(cli: &Cli) -> AppResult<SettingsStore> {
    let path = match &cli.settings {
        Some(path) => path.clone(),
        None => SettingsStore::default_path()?,
    };
    let store = SettingsStore::load(path).await?;
    if let Some(url) = &cli.service_url {
        store
            .update(SettingsPatch {
                service_url: Some(url.clone()),
                ..Default::default()
            })
            .await?;
    }
    Ok(store)
}

async fn read_input(input: &str) -> AppResult<String> {
    if input == "-" {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        Ok(buf)
    } else {
        Ok(tokio::fs::read_to_string(input).await?)
    }
}

/// Returns the JSON to print and whether the command succeeded
async fn execute(cli: Cli) -> AppResult<(Value, bool)> {
    if let Command::Detect { url } = &cli.command {
        return Ok((json!({ "url": url, "platform": detect_platform(url) }), true));
    }

    let settings = load_settings(&cli).await?;

    match &cli.command {
        Command::Platforms => {
            let platforms = GapServiceClient::new(settings)?.supported_platforms().await?;
            return Ok((json!({ "platforms": platforms }), true));
        }
        Command::Context { thread } => {
            let context = GapServiceClient::new(settings)?.thread_context(thread).await?;
            return Ok((json!(context), true));
        }
        _ => {}
    }

    let url = match &cli.command {
        Command::Wrap { url, .. } | Command::Transform { url, .. } => url.clone(),
        _ => "about:blank".to_string(),
    };
    let os_clipboard = MemoryClipboard::new();
    let capability: Arc<dyn ClipboardCapability> = if cli.system_clipboard {
        Arc::new(SystemClipboard)
    } else {
        Arc::new(os_clipboard.clone())
    };
    let page = Arc::new(SimulatedPage::new(url.clone(), os_clipboard.clone()));
    let popup_page = Arc::new(SimulatedPage::new("chrome-extension://gap/popup.html", os_clipboard));

    let runtime = ExtensionRuntime::builder(settings)
        .clipboard(capability)
        .start(page, popup_page)?;

    let request = match &cli.command {
        Command::Health => ActionRequest::new(ActionKind::CheckService),
        Command::Wrap { thread, role, text, .. } => {
            let mut payload = WrapPayload::new(text.clone());
            payload.platform = Some(detect_platform(&url).to_string());
            payload.chat_id = Some(ChatId::generate(ChatOrigin::Command).into());
            payload.thread_id = thread.clone();
            payload.role = Some(role.clone());
            ActionRequest::with_payload(ActionKind::WrapContent, &payload)?
        }
        Command::Transform { input, .. } => {
            let mut payload = TransformPayload::new(read_input(input).await?);
            payload.target_platform = Some(detect_platform(&url).to_string());
            ActionRequest::with_payload(ActionKind::TransformContent, &payload)?
        }
        Command::Detect { .. } | Command::Platforms | Command::Context { .. } => {
            return Err(AppError::Unknown("command already handled".to_string()));
        }
    };

    let response = runtime.send(request).await?;
    runtime.shutdown();

    let ok = !matches!(response, ActionResponse::Error(_));
    Ok((serde_json::to_value(&response)?, ok))
}
