//! Runtime capabilities the controller may or may not have: speech output,
//! speech input and user-facing notices. They are injected, never looked up.

use log::warn;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Locale every dictation session is fixed to.
pub const DICTATION_LOCALE: &str = "hi-IN";

pub enum Capability<T: ?Sized> {
    Available(Arc<T>),
    Unavailable,
}

impl<T: ?Sized> Capability<T> {
    pub fn get(&self) -> Option<&Arc<T>> {
        match self {
            Capability::Available(inner) => Some(inner),
            Capability::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Capability::Available(_))
    }
}

impl<T: ?Sized> Clone for Capability<T> {
    fn clone(&self) -> Self {
        match self {
            Capability::Available(inner) => Capability::Available(Arc::clone(inner)),
            Capability::Unavailable => Capability::Unavailable,
        }
    }
}

impl<T: ?Sized> Default for Capability<T> {
    fn default() -> Self {
        Capability::Unavailable
    }
}

pub trait SpeechSynthesizer: Send + Sync {
    /// Queues `text` for playback. Completion and failure are not reported.
    fn speak(&self, text: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionConfig {
    pub lang: String,
    pub interim_results: bool,
    pub max_alternatives: u32,
    pub continuous: bool,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            lang: DICTATION_LOCALE.to_string(),
            interim_results: false,
            max_alternatives: 1,
            continuous: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Started,
    /// Alternatives of the first final result, best first.
    Transcript(Vec<String>),
    Ended,
    Error(String),
}

pub type RecognitionEvents = mpsc::UnboundedSender<RecognitionEvent>;

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("Failed to start recognition: {0}")]
    Start(String),
}

pub trait SpeechRecognizer: Send + Sync {
    fn start(
        &self,
        config: &RecognitionConfig,
        events: RecognitionEvents
    ) -> Result<Box<dyn RecognitionSession>, RecognitionError>;
}

pub trait RecognitionSession: Send + Sync {
    /// Asks the engine to finish; `Ended` follows on the event channel.
    fn stop(&self);
}

pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        warn!("{}", message);
    }
}
