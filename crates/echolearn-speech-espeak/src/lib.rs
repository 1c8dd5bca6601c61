//! eSpeak speech backend for EchoLearn
//!
//! Drives the `espeak` (or `espeak-ng`) command-line synthesizer. One child
//! process per utterance; `Started` is reported on successful spawn, the
//! terminal event on process exit. Cancellation is a broadcast: every
//! in-flight utterance task kills its child when the cancel epoch moves.

use async_trait::async_trait;
use echolearn_speech::{
    BackendEvent, FailureReason, SpeechBackend, SpeechError, SpeechResult, UtteranceRequest,
    VoiceGender, VoiceInfo,
};
use regex::Regex;
use std::io::ErrorKind as IoErrorKind;
use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::{mpsc, watch, OnceCell};
use tracing::{debug, warn};


/// eSpeak's built-in defaults, used to translate the engine's relative
/// delivery parameters into command-line arguments.
const ESPEAK_DEFAULT_WPM: f32 = 175.0;
const ESPEAK_DEFAULT_PITCH: f32 = 50.0;

pub struct EspeakBackend {
    command: OnceCell<Option<String>>,
    cancel_tx: watch::Sender<u64>,
}

impl Default for EspeakBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl EspeakBackend {
    pub fn new() -> Self {
        let (cancel_tx, _) = watch::channel(0);
        Self {
            command: OnceCell::new(),
            cancel_tx,
        }
    }

    /// Resolve which espeak binary exists, once. `espeak-ng` is preferred
    /// where both are installed.
    async fn resolve_command(&self) -> Option<&str> {
        self.command
            .get_or_init(|| async {
                for candidate in ["espeak-ng", "espeak"] {
                    let probe = Command::new(candidate)
                        .arg("--version")
                        .stdout(Stdio::null())
                        .stderr(Stdio::null())
                        .status()
                        .await;
                    if matches!(probe, Ok(status) if status.success()) {
                        debug!(command = candidate, "espeak binary found");
                        return Some(candidate.to_string());
                    }
                }
                None
            })
            .await
            .as_deref()
    }
}

#[async_trait]
impl SpeechBackend for EspeakBackend {
    fn name(&self) -> &str {
        "espeak"
    }

    async fn probe(&self) -> bool {
        self.resolve_command().await.is_some()
    }

    async fn list_voices(&self) -> SpeechResult<Vec<VoiceInfo>> {
        let command = self
            .resolve_command()
            .await
            .ok_or(SpeechError::Unsupported)?;
        let output = Command::new(command).arg("--voices").output().await?;
        if !output.status.success() {
            return Err(SpeechError::Backend(format!(
                "{} --voices exited with {}",
                command, output.status
            )));
        }
        let listing = String::from_utf8_lossy(&output.stdout);
        let voices = parse_voice_listing(&listing);
        debug!(count = voices.len(), "espeak voices loaded");
        Ok(voices)
    }

    async fn speak(
        &self,
        request: UtteranceRequest,
        events: mpsc::Sender<BackendEvent>,
    ) -> SpeechResult<()> {
        let command = self
            .resolve_command()
            .await
            .ok_or(SpeechError::Unsupported)?
            .to_string();
        let args = build_args(&request);
        let id = request.id;

        // Baseline the cancel epoch before returning, so any cancel issued
        // after this call is guaranteed to reach the utterance task.
        let mut cancel_rx = self.cancel_tx.subscribe();
        cancel_rx.borrow_and_update();

        tokio::spawn(async move {
            debug!(utterance_id = id, command = %command, "spawning espeak");
            let spawned = Command::new(&command)
                .args(&args)
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .spawn();

            let mut child = match spawned {
                Ok(child) => child,
                Err(e) => {
                    warn!(utterance_id = id, "failed to spawn espeak: {}", e);
                    let _ = events
                        .send(BackendEvent::Failed {
                            utterance_id: id,
                            reason: classify_spawn_error(&e),
                        })
                        .await;
                    return;
                }
            };

            // Audio output begins as soon as the process is up; anything
            // quieter than that is the silent-failure mode the engine's
            // deadlines exist for.
            let _ = events
                .send(BackendEvent::Started { utterance_id: id })
                .await;

            let mut stderr = child.stderr.take();
            tokio::select! {
                _ = cancel_rx.changed() => {
                    debug!(utterance_id = id, "cancelled, killing espeak process");
                    if let Err(e) = child.kill().await {
                        warn!(utterance_id = id, "failed to kill espeak: {}", e);
                    }
                    // No event after cancellation; the engine has already
                    // moved on and would drop it anyway.
                }
                status = child.wait() => match status {
                    Ok(status) if status.success() => {
                        let _ = events
                            .send(BackendEvent::Finished { utterance_id: id })
                            .await;
                    }
                    Ok(status) => {
                        let detail = read_stderr(stderr.take()).await;
                        warn!(utterance_id = id, %status, "espeak exited abnormally: {}", detail);
                        let _ = events
                            .send(BackendEvent::Failed {
                                utterance_id: id,
                                reason: FailureReason::Other(detail),
                            })
                            .await;
                    }
                    Err(e) => {
                        let _ = events
                            .send(BackendEvent::Failed {
                                utterance_id: id,
                                reason: FailureReason::Other(e.to_string()),
                            })
                            .await;
                    }
                },
            }
        });

        Ok(())
    }

    async fn cancel(&self) {
        self.cancel_tx.send_modify(|epoch| *epoch += 1);
    }
}

fn classify_spawn_error(e: &std::io::Error) -> FailureReason {
    match e.kind() {
        IoErrorKind::PermissionDenied => FailureReason::NotPermitted,
        _ => FailureReason::Other(e.to_string()),
    }
}

async fn read_stderr(stderr: Option<tokio::process::ChildStderr>) -> String {
    use tokio::io::AsyncReadExt;
    let mut detail = String::new();
    if let Some(mut stderr) = stderr {
        let _ = stderr.read_to_string(&mut detail).await;
    }
    let detail = detail.trim();
    if detail.is_empty() {
        "no diagnostic output".to_string()
    } else {
        detail.to_string()
    }
}

/// Build espeak arguments from an utterance request.
fn build_args(request: &UtteranceRequest) -> Vec<String> {
    let wpm = (ESPEAK_DEFAULT_WPM * request.rate).round().clamp(80.0, 450.0) as u32;
    let pitch = (ESPEAK_DEFAULT_PITCH * request.pitch).round().clamp(0.0, 99.0) as u32;
    let amplitude = (request.volume * 200.0).round().clamp(0.0, 200.0) as u32;

    let voice = request
        .voice
        .clone()
        .unwrap_or_else(|| request.language.to_ascii_lowercase());

    vec![
        "-v".to_string(),
        voice,
        "-s".to_string(),
        wpm.to_string(),
        "-p".to_string(),
        pitch.to_string(),
        "-a".to_string(),
        amplitude.to_string(),
        request.text.clone(),
    ]
}

/// Parse `espeak --voices` output. Both layouts are handled:
///
/// espeak:    ` 5  en-us          M  english-us           en-us`
/// espeak-ng: ` 5  en-US          --/M      English (America)   gmw/en-US`
fn parse_voice_listing(listing: &str) -> Vec<VoiceInfo> {
    let line_re = Regex::new(r"^\s*\d+\s+([\w-]+)\s+(?:[-\d]+/)?([MF-])\s+(\S+)").unwrap();

    let mut voices = Vec::new();
    for line in listing.lines().skip(1) {
        let Some(captures) = line_re.captures(line) else {
            continue;
        };
        let language = captures[1].to_string();
        let gender = match &captures[2] {
            "M" => Some(VoiceGender::Male),
            "F" => Some(VoiceGender::Female),
            _ => Some(VoiceGender::Unknown),
        };
        let name = captures[3].to_string();
        voices.push(VoiceInfo {
            id: name.clone(),
            name,
            language,
            gender,
        });
    }
    voices
}
