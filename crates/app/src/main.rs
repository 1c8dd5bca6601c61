use anyhow::Context;
use clap::Parser;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use echolearn_app::accessibility::LogFeedback;
use echolearn_app::announcer::Announcer;
use echolearn_app::controller::{InteractionController, NavEvent};
use echolearn_app::fallback::{FallbackConfig, FallbackPresenter};
use echolearn_app::session::View;
use echolearn_catalog::MemCatalog;
use echolearn_foundation::{Lifecycle, LifecycleTracker, ShutdownHandler};
use echolearn_speech::{SpeechConfig, SpeechEngine, SpeechEvent};
use echolearn_speech_espeak::EspeakBackend;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

#[derive(Parser, Debug)]
#[command(name = "echolearn", about = "Learn & Listen: accessible learning with spoken content")]
struct Args {
    /// Language tag for spoken content
    #[arg(long, default_value = "en-US")]
    language: String,

    /// Speaking rate relative to the synthesizer default
    #[arg(long, default_value_t = 0.9)]
    rate: f32,

    /// Explicit voice id, overriding the selection heuristic
    #[arg(long)]
    voice: Option<String>,

    /// Seconds before the fallback text hides itself
    #[arg(long, default_value_t = 8)]
    fallback_secs: u64,

    /// Disable speech entirely (text fallback only)
    #[arg(long)]
    no_speech: bool,
}

fn init_logging() -> anyhow::Result<()> {
    std::fs::create_dir_all("logs").context("creating logs directory")?;
    let file_appender = RollingFileAppender::new(Rotation::DAILY, "logs", "echolearn.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    // Log to file only; stdout belongs to the learner UI.
    tracing_subscriber::fmt()
        .with_writer(non_blocking_file)
        .with_env_filter(log_level)
        .with_ansi(false)
        .init();
    std::mem::forget(guard);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging()?;
    tracing::info!("Starting EchoLearn");

    let lifecycle = LifecycleTracker::new();
    let shutdown = ShutdownHandler::new().install();

    let speech_config = SpeechConfig {
        enabled: !args.no_speech,
        language: args.language.clone(),
        rate: args.rate,
        preferred_voice: args.voice.clone(),
        ..SpeechConfig::default()
    };
    let (speech_tx, speech_rx) = mpsc::channel::<SpeechEvent>(32);
    let engine = SpeechEngine::new(Arc::new(EspeakBackend::new()), speech_config, speech_tx).await;
    let speech_supported = engine.is_supported();

    let fallback = FallbackPresenter::new(FallbackConfig {
        auto_hide: Duration::from_secs(args.fallback_secs),
    });
    let announcer = Announcer::new(engine, fallback);
    let pump = announcer.spawn_event_pump(speech_rx);

    let catalog = Arc::new(MemCatalog::seeded());
    let feedback = Arc::new(LogFeedback);
    let mut controller =
        InteractionController::new(catalog, announcer.clone(), feedback).await?;

    lifecycle.advance(Lifecycle::Running)?;
    if !speech_supported {
        tracing::warn!("no speech synthesizer found; running with text fallback only");
    }

    let mut keys = spawn_key_reader(shutdown.clone());
    let mut focus: usize = 0;
    let mut tick = tokio::time::interval(Duration::from_millis(500));

    crossterm::terminal::enable_raw_mode().context("enabling raw terminal mode")?;
    let run = async {
        loop {
            render(&controller, &announcer, focus, speech_supported)?;
            tokio::select! {
                _ = shutdown.wait() => break,
                _ = tick.tick() => {}
                key = keys.recv() => {
                    let Some(key) = key else { break };
                    handle_key(key, &mut controller, &announcer, &mut focus, &shutdown).await;
                }
            }
        }
        anyhow::Ok(())
    };
    let result = run.await;
    crossterm::terminal::disable_raw_mode().ok();
    println!();

    tracing::info!("Beginning graceful shutdown");
    lifecycle.advance(Lifecycle::Stopping)?;
    announcer.stop_speech().await;
    pump.abort();
    lifecycle.advance(Lifecycle::Stopped)?;
    tracing::info!("EchoLearn stopped");
    result
}

/// Keyboard input on a dedicated blocking thread. Polls so the thread can
/// notice shutdown instead of parking forever inside `read`.
fn spawn_key_reader(shutdown: ShutdownHandler) -> mpsc::Receiver<KeyEvent> {
    let (tx, rx) = mpsc::channel(16);
    tokio::task::spawn_blocking(move || {
        while !shutdown.is_triggered() {
            match crossterm::event::poll(Duration::from_millis(200)) {
                Ok(true) => {
                    if let Ok(Event::Key(key)) = crossterm::event::read() {
                        if tx.blocking_send(key).is_err() {
                            return;
                        }
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!("keyboard read failed: {}", e);
                    return;
                }
            }
        }
    });
    rx
}

async fn handle_key(
    key: KeyEvent,
    controller: &mut InteractionController,
    announcer: &Announcer,
    focus: &mut usize,
    shutdown: &ShutdownHandler,
) {
    let list_len = match controller.session().view() {
        View::Categories => controller.categories().len(),
        View::Items => controller.items().len(),
    };

    let outcome = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            shutdown.trigger();
            Ok(())
        }
        KeyCode::Char('q') => {
            shutdown.trigger();
            Ok(())
        }
        KeyCode::Up => {
            *focus = focus.saturating_sub(1);
            Ok(())
        }
        KeyCode::Down => {
            if list_len > 0 && *focus < list_len - 1 {
                *focus += 1;
            }
            Ok(())
        }
        KeyCode::Char('x') => {
            announcer.dismiss_fallback();
            Ok(())
        }
        // Enter/Space activates the focused control.
        KeyCode::Enter | KeyCode::Char(' ') => {
            if controller.session().open_item().is_some() {
                controller.handle(NavEvent::Cancel).await
            } else {
                match controller.session().view() {
                    View::Categories => {
                        let event = controller
                            .categories()
                            .get(*focus)
                            .map(|c| NavEvent::SelectCategory(c.id.clone()));
                        match event {
                            Some(event) => {
                                let result = controller.handle(event).await;
                                *focus = 0;
                                result
                            }
                            None => Ok(()),
                        }
                    }
                    View::Items => {
                        let event = controller
                            .items()
                            .get(*focus)
                            .map(|i| NavEvent::SelectItem(i.id.clone()));
                        match event {
                            Some(event) => controller.handle(event).await,
                            None => Ok(()),
                        }
                    }
                }
            }
        }
        // Escape cancels speech and steps back one level.
        KeyCode::Esc => {
            let was_items = controller.session().view() == View::Items
                && controller.session().open_item().is_none();
            let result = controller.handle(NavEvent::Cancel).await;
            if was_items {
                *focus = 0;
            }
            result
        }
        _ => Ok(()),
    };

    if let Err(e) = outcome {
        tracing::warn!("interaction rejected: {}", e);
    }
}

fn render(
    controller: &InteractionController,
    announcer: &Announcer,
    focus: usize,
    speech_supported: bool,
) -> anyhow::Result<()> {
    use crossterm::{cursor::MoveTo, execute, terminal::{Clear, ClearType}};

    let mut out = std::io::stdout();
    execute!(out, Clear(ClearType::All), MoveTo(0, 0))?;

    let mut screen = String::new();
    screen.push_str("Learn & Listen — Accessible Learning for Everyone\r\n");
    screen.push_str(if speech_supported {
        "(speech on — Enter/Space: select, Esc: back, x: close text, q: quit)\r\n\r\n"
    } else {
        "(speech unavailable, text only — Enter/Space: select, Esc: back, x: close text, q: quit)\r\n\r\n"
    });

    match controller.session().selected_category() {
        Some(category) => screen.push_str(&format!("Home → {}\r\n\r\n", category.name)),
        None => screen.push_str("Home\r\n\r\n"),
    }

    if let Some(item) = controller.session().open_item() {
        screen.push_str(&format!("  {}  {}\r\n\r\n", item.emoji, item.name));
        let spelled = item
            .name
            .chars()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" · ");
        screen.push_str(&format!("  Spell it: {}\r\n", spelled));
        screen.push_str(&format!("  Fun fact: {}\r\n\r\n", item.fact));
        screen.push_str("  (Enter or Esc to close)\r\n");
    } else {
        match controller.session().view() {
            View::Categories => {
                screen.push_str("Choose a learning category:\r\n\r\n");
                for (i, category) in controller.categories().iter().enumerate() {
                    let marker = if i == focus { ">" } else { " " };
                    screen.push_str(&format!(
                        "{} {}  {} — {}\r\n",
                        marker, category.emoji, category.name, category.description
                    ));
                }
            }
            View::Items => {
                screen.push_str("Tap any item to see its spelling and a fun fact:\r\n\r\n");
                for (i, item) in controller.items().iter().enumerate() {
                    let marker = if i == focus { ">" } else { " " };
                    screen.push_str(&format!("{} {}  {}\r\n", marker, item.emoji, item.name));
                }
            }
        }
    }

    let status = announcer.status();
    screen.push_str("\r\n");
    if status.is_speaking {
        screen.push_str("🔊 Speaking...\r\n");
    }
    if let (Some(text), true) = (&status.fallback_text, status.fallback_visible) {
        screen.push_str(&format!("── Learning content ──\r\n{}\r\n", text));
    }
    if let Some(kind) = &status.last_error {
        tracing::debug!(%kind, "speech error shown in log only");
    }

    out.write_all(screen.as_bytes())?;
    out.flush()?;
    Ok(())
}
