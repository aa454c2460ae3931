//! Headless walkthrough of the editor bridge.
//!
//! Wires a host controller and an editor session over an in-process bridge, then
//! replays host messages one at a time, printing what crosses the wire.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use webtext_bridge::{
    BridgeConfig, EditorEndpoint, EditorSession, HostController, WebViewMessage,
};

mod script;

const DEFAULT_CONTENT: &str = "<p>Release notes</p><p>Ship the bridge</p>";

#[derive(Parser)]
#[command(name = "webtext-story")]
#[command(about = "Replay a scripted editor session over the bridge", long_about = None)]
struct Cli {
    /// Bridge configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON-lines file of host messages; a built-in session is used when omitted
    #[arg(long)]
    script: Option<PathBuf>,

    /// HTML the host supplies before the editor is ready
    #[arg(long, default_value = DEFAULT_CONTENT)]
    content: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let source = match &cli.script {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?,
        None => script::DEMO.to_string(),
    };

    run(config, &cli.content, &source)
}

fn load_config(path: Option<&Path>) -> Result<BridgeConfig> {
    let Some(path) = path else {
        return Ok(BridgeConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    BridgeConfig::from_json_str(&text)
        .with_context(|| format!("invalid config {}", path.display()))
}

fn run(config: BridgeConfig, content: &str, source: &str) -> Result<()> {
    let (host_end, editor_end) = webtext_bridge::pair();
    let mut host = HostController::new(host_end, &config);
    let mut session = EditorSession::with_config(config);

    // Content goes out before the editor is ready, as it does when a view mounts.
    host.set_content(content)?;
    println!("-> initialContent {content}");
    settle(&mut host, &mut session, &editor_end)?;

    session.boot();
    settle(&mut host, &mut session, &editor_end)?;

    for line in script::lines(source) {
        println!("-> [{}] {}", line.number, line.text);
        host.endpoint().send_raw(line.text)?;
        settle(&mut host, &mut session, &editor_end)?;
    }

    println!();
    println!("final html: {}", host.state().html);
    let diagnostics = session.take_diagnostics();
    for err in &diagnostics {
        println!("editor reported: {err}");
    }
    info!(diagnostics = diagnostics.len(), "session replay finished");
    Ok(())
}

// Runs both sides in lock-step until neither has anything left to read.
fn settle(
    host: &mut HostController,
    session: &mut EditorSession,
    editor_end: &EditorEndpoint,
) -> Result<()> {
    loop {
        let read = session.pump(editor_end)?;
        let received = host.pump()?;
        for msg in &received {
            print_received(host, msg);
        }
        if read == 0 && received.is_empty() {
            return Ok(());
        }
    }
}

fn print_received(host: &HostController, msg: &WebViewMessage) {
    match msg {
        WebViewMessage::EditorInitialised => println!("<- editorInitialised"),
        WebViewMessage::EditorStateUpdate(state) => {
            println!("<- editorStateUpdate {}", state.html);
            let toolbar = host.toolbar();
            let active: Vec<&str> = toolbar
                .iter()
                .filter(|c| c.active)
                .map(|c| c.control.label())
                .collect();
            let enabled: Vec<&str> = toolbar
                .iter()
                .filter(|c| c.enabled)
                .map(|c| c.control.label())
                .collect();
            println!("   active:  {}", active.join(" "));
            println!("   enabled: {}", enabled.join(" "));
        }
    }
}
