use crate::dispatch::{CommandDispatcher, DispatchOutcome, JournalActions};
use crate::intent::{Intent, IntentClassifier};
use crate::settings::{SettingsError, SettingsStore, VoiceCommandSettings};
use crate::transcript::sanitize_transcript;
use chrono::Local;
use serde::Serialize;
use serde_json::Value;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::sync::{mpsc::UnboundedSender, Mutex};
use tokio_util::sync::CancellationToken;

// Blocking transcription collaborator. `None` covers silence, unrecognized
// audio, and service failure alike; the core does not distinguish them.
pub trait Transcribe: Send + Sync {
    fn transcribe(
        &self,
        max_duration: Duration,
        settings: &VoiceCommandSettings,
    ) -> Option<String>;
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Idle,
    AwaitingActivation,
    AwaitingCommand,
    Dispatching,
    Cooldown,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum CommandFailure {
    #[error("no command pattern matched")]
    Unclassified { transcript: String },
    #[error("transcription produced no usable text")]
    TranscriptionFailed,
    #[error("intent requires a parameter")]
    MissingParameter { intent: Intent },
    #[error("could not interpret day reference '{token}'")]
    UnresolvedDate { token: String },
    #[error("no handler registered for the intent")]
    UnsupportedIntent { intent: Intent },
    #[error("action handler failed: {message}")]
    HandlerFailed { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum SessionEvent {
    State {
        state: SessionState,
        message: Option<String>,
    },
    Transcript {
        text: String,
    },
    Dispatched {
        intent: Intent,
        outcome: Value,
    },
    Failed {
        failure: CommandFailure,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("a listening session is already active")]
    SessionAlreadyActive,
    #[error("voice commands are disabled in settings")]
    Disabled,
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error("{0}")]
    Runtime(String),
}

#[derive(Debug, Default)]
pub struct SessionGuard {
    active: AtomicBool,
}

impl SessionGuard {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn try_acquire(self: &Arc<Self>) -> Result<SessionPermit, SessionError> {
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            Ok(SessionPermit {
                guard: self.clone(),
            })
        } else {
            Err(SessionError::SessionAlreadyActive)
        }
    }
}

pub struct SessionPermit {
    guard: Arc<SessionGuard>,
}

impl Drop for SessionPermit {
    fn drop(&mut self) {
        self.guard.active.store(false, Ordering::Release);
    }
}

// Activation polling uses short fixed chunks; only the command phase is
// bounded by the configured timeout.
const ACTIVATION_POLL_SECS: u64 = 3;
const MIN_COMMAND_TIMEOUT_SECS: u64 = 1;
const MAX_COMMAND_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.6;

fn clamp_command_timeout_secs(value: u64) -> u64 {
    value.clamp(MIN_COMMAND_TIMEOUT_SECS, MAX_COMMAND_TIMEOUT_SECS)
}

fn clamp_confidence_threshold(value: f32) -> f32 {
    if !value.is_finite() {
        return DEFAULT_CONFIDENCE_THRESHOLD;
    }
    value.clamp(0.0, 1.0)
}

pub struct SessionController {
    settings: VoiceCommandSettings,
    classifier: IntentClassifier,
    dispatcher: CommandDispatcher,
    transcriber: Arc<dyn Transcribe>,
    guard: Arc<SessionGuard>,
    events: UnboundedSender<SessionEvent>,
    cancel: CancellationToken,
    state: Mutex<SessionState>,
}

impl SessionController {
    pub fn new(
        mut settings: VoiceCommandSettings,
        transcriber: Arc<dyn Transcribe>,
        actions: Arc<dyn JournalActions>,
        guard: Arc<SessionGuard>,
        events: UnboundedSender<SessionEvent>,
    ) -> Self {
        settings.command_timeout_secs = clamp_command_timeout_secs(settings.command_timeout_secs);
        settings.confidence_threshold = clamp_confidence_threshold(settings.confidence_threshold);
        let classifier = IntentClassifier::with_custom_commands(&settings.custom_commands);
        Self {
            settings,
            classifier,
            dispatcher: CommandDispatcher::new(actions),
            transcriber,
            guard,
            events,
            cancel: CancellationToken::new(),
            state: Mutex::new(SessionState::Idle),
        }
    }

    // Configuration load or parse failure is the one condition allowed to
    // abort session start.
    pub fn from_store(
        store: &SettingsStore,
        transcriber: Arc<dyn Transcribe>,
        actions: Arc<dyn JournalActions>,
        guard: Arc<SessionGuard>,
        events: UnboundedSender<SessionEvent>,
    ) -> Result<Self, SessionError> {
        let settings = store.load()?;
        Ok(Self::new(settings, transcriber, actions, guard, events))
    }

    pub fn settings(&self) -> &VoiceCommandSettings {
        &self.settings
    }

    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn current_state(&self) -> SessionState {
        *self.state.lock().await
    }

    pub async fn run(&self) -> Result<(), SessionError> {
        if !self.settings.enabled {
            return Err(SessionError::Disabled);
        }
        let _permit = self.guard.try_acquire()?;

        let result = self.run_cycles().await;
        self.set_state(
            SessionState::Stopped,
            Some("Listening session stopped.".to_string()),
        )
        .await;
        result
    }

    async fn run_cycles(&self) -> Result<(), SessionError> {
        let phrase = self.settings.activation_phrase.to_lowercase();
        let listening_message = format!(
            "Say '{}' to issue a command.",
            self.settings.activation_phrase
        );
        self.set_state(
            SessionState::AwaitingActivation,
            Some(listening_message.clone()),
        )
        .await;

        // Cancellation is cooperative: observed between cycles, never
        // during an in-flight transcription call.
        while !self.cancel.is_cancelled() {
            let Some(heard) = self.transcribe_chunk(ACTIVATION_POLL_SECS).await? else {
                continue;
            };
            let heard = sanitize_transcript(&heard);
            if heard.is_empty() || !heard.to_lowercase().contains(&phrase) {
                continue;
            }

            tracing::debug!("activation phrase detected");
            self.set_state(
                SessionState::AwaitingCommand,
                Some("Activation phrase detected. Listening for a command...".to_string()),
            )
            .await;

            let command_text = self
                .transcribe_chunk(self.settings.command_timeout_secs)
                .await?
                .map(|text| sanitize_transcript(&text))
                .filter(|text| !text.is_empty());

            match command_text {
                None => {
                    self.emit(SessionEvent::Failed {
                        failure: CommandFailure::TranscriptionFailed,
                    });
                    self.set_state(
                        SessionState::AwaitingActivation,
                        Some("No command heard.".to_string()),
                    )
                    .await;
                    continue;
                }
                Some(text) => {
                    self.emit(SessionEvent::Transcript { text: text.clone() });
                    self.set_state(SessionState::Dispatching, None).await;
                    self.handle_command(&text);
                    self.set_state(SessionState::Cooldown, None).await;
                }
            }

            if self.cancel.is_cancelled() {
                break;
            }
            self.set_state(
                SessionState::AwaitingActivation,
                Some(listening_message.clone()),
            )
            .await;
        }

        Ok(())
    }

    fn handle_command(&self, transcript: &str) {
        let command = self.classifier.interpret(transcript);
        if command.intent == Intent::Unclassified {
            tracing::debug!(%transcript, "no pattern matched transcript");
            self.emit(SessionEvent::Failed {
                failure: CommandFailure::Unclassified {
                    transcript: transcript.to_string(),
                },
            });
            return;
        }

        let today = Local::now().date_naive();
        match self.dispatcher.dispatch(&command, today) {
            Ok(DispatchOutcome::Dispatched { intent, outcome }) => {
                self.emit(SessionEvent::Dispatched { intent, outcome });
            }
            Ok(DispatchOutcome::MissingParameter { intent }) => {
                self.emit(SessionEvent::Failed {
                    failure: CommandFailure::MissingParameter { intent },
                });
            }
            Ok(DispatchOutcome::UnresolvedDate { token }) => {
                self.emit(SessionEvent::Failed {
                    failure: CommandFailure::UnresolvedDate { token },
                });
            }
            Ok(DispatchOutcome::UnsupportedIntent { intent }) => {
                self.emit(SessionEvent::Failed {
                    failure: CommandFailure::UnsupportedIntent { intent },
                });
            }
            Err(err) => {
                tracing::warn!("action handler failed: {err}");
                self.emit(SessionEvent::Failed {
                    failure: CommandFailure::HandlerFailed {
                        message: err.to_string(),
                    },
                });
            }
        }
    }

    async fn transcribe_chunk(&self, max_secs: u64) -> Result<Option<String>, SessionError> {
        let transcriber = self.transcriber.clone();
        let settings = self.settings.clone();
        tokio::task::spawn_blocking(move || {
            transcriber.transcribe(Duration::from_secs(max_secs), &settings)
        })
        .await
        .map_err(|err| SessionError::Runtime(format!("transcription task join failure: {err}")))
    }

    async fn set_state(&self, state: SessionState, message: Option<String>) {
        {
            let mut current = self.state.lock().await;
            *current = state;
        }
        tracing::debug!(?state, "session state change");
        self.emit(SessionEvent::State { state, message });
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}
