//! Blind Navigator - Main Entry Point
//!
//! Interactive demo: loads a page outline, runs an accessibility session
//! with console speech output, and feeds it commands typed on stdin. Typed
//! `say ...` lines stand in for recognized speech.

use anyhow::{Context, Result};
use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blind_navigator::business::KeyInput;
use blind_navigator::{
    AccessibilitySession, AppConfig, Command, FileSettingsStore, InMemoryPage, PageOutline,
    PlatformFactory, SessionEvent, Speaker, SpeechService,
};

const SAMPLE_PAGE: &str = include_str!("../demos/sample_page.json");

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let debug = args.iter().any(|a| a == "--debug" || a == "-d");
    let page_path = args
        .iter()
        .position(|a| a == "--page")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from);

    init_logging(debug);
    run_cli(page_path).await
}

fn load_page(path: Option<PathBuf>) -> Result<InMemoryPage> {
    let json = match path {
        Some(ref path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading page outline {}", path.display()))?,
        None => SAMPLE_PAGE.to_string(),
    };
    let outline: Vec<PageOutline> =
        serde_json::from_str(&json).context("parsing page outline")?;
    Ok(InMemoryPage::from_outline(&outline))
}

async fn run_cli(page_path: Option<PathBuf>) -> Result<()> {
    println!("╔═══════════════════════════════════════════════════════════╗");
    println!(
        "║          Blind Navigator - CLI demo v{:<20} ║",
        env!("CARGO_PKG_VERSION")
    );
    println!("╚═══════════════════════════════════════════════════════════╝");
    println!();

    info!("Starting Blind Navigator v{}", env!("CARGO_PKG_VERSION"));

    // Step 1: Load configuration
    println!("[1/4] Loading configuration...");
    let config = AppConfig::load_or_default()?;
    info!("Configuration loaded");

    // Step 2: Speech service and voice settings
    println!("[2/4] Preparing speech service...");
    let store = Arc::new(FileSettingsStore::new(AppConfig::settings_path()));
    let synthesizer = Arc::from(PlatformFactory::create_synthesizer());
    let service = Arc::new(SpeechService::new(store, synthesizer));
    match service.install_defaults() {
        Ok(true) => println!("      Default voice settings installed"),
        Ok(false) => {}
        Err(e) => warn!("Could not install default voice settings: {}", e),
    }
    let speaker = Arc::new(Speaker::new(service, config.speech.max_text_chars));

    // Step 3: Page
    println!("[3/4] Loading page...");
    let page = Arc::new(load_page(page_path)?);

    // Step 4: Session
    println!("[4/4] Starting session...");
    let (recognizer, feeder) = PlatformFactory::create_recognizer();
    let session = AccessibilitySession::new(page, speaker, Arc::new(recognizer), &config);
    let events = session.sender();
    let session_task = tokio::spawn(session.run());

    println!();
    println!("════════════════════════════════════════════════════════════");
    println!("  start | stop            accessibility mode");
    println!("  contrast | map | zoom   visual aids");
    println!("  h l b n p r | key K     keyboard navigation");
    println!("  say <words>             speak a voice command");
    println!("  click N | move X Y      heading map entry / pointer");
    println!("  rate X | voice NAME     voice settings");
    println!("  q                       quit");
    println!("════════════════════════════════════════════════════════════");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!(">>> ");
        std::io::stdout().flush()?;

        let Some(input) = lines.next_line().await? else {
            break;
        };
        let input = input.trim();
        let (cmd, rest) = input.split_once(' ').unwrap_or((input, ""));
        let rest = rest.trim();

        let event = match cmd {
            "start" => SessionEvent::Command(Command::Start),
            "stop" => SessionEvent::Command(Command::Stop),
            "contrast" => SessionEvent::Command(Command::ToggleContrast),
            "map" => SessionEvent::Command(Command::ToggleHeadingMap),
            "zoom" => SessionEvent::Command(Command::ToggleMagnifier),
            "rate" => SessionEvent::Command(Command::SetVoiceRate {
                rate: rest.parse().ok(),
            }),
            "voice" => SessionEvent::Command(Command::SetVoiceName {
                name: (!rest.is_empty()).then(|| rest.to_string()),
            }),
            "key" if !rest.is_empty() => SessionEvent::Key(KeyInput::new(rest)),
            "click" => match rest.parse() {
                Ok(index) => SessionEvent::HeadingMapClick(index),
                Err(_) => {
                    println!("usage: click N");
                    continue;
                }
            },
            "move" => {
                let coords: Vec<f64> = rest
                    .split_whitespace()
                    .filter_map(|v| v.parse().ok())
                    .collect();
                match coords[..] {
                    [x, y] => SessionEvent::PointerMove { x, y },
                    _ => {
                        println!("usage: move X Y");
                        continue;
                    }
                }
            }
            "say" => {
                if !feeder.say(rest) {
                    println!("(not listening, run 'start' first)");
                }
                continue;
            }
            "q" | "quit" | "exit" => {
                info!("User requested exit");
                break;
            }
            "" => continue,
            key if key.chars().count() == 1 => SessionEvent::Key(KeyInput::new(key)),
            _ => {
                println!("unknown command: {}", cmd);
                continue;
            }
        };

        if events.send(event).is_err() {
            error!("Session ended unexpectedly");
            break;
        }
        // Give the session a moment so its output lands before the prompt.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    // Cleanup
    let _ = events.send(SessionEvent::Shutdown);
    if let Err(e) = session_task.await {
        error!("Session task failed: {}", e);
    }

    println!("Bye");
    Ok(())
}

fn init_logging(debug: bool) {
    let level = if debug {
        "blind_navigator=debug"
    } else {
        "blind_navigator=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
