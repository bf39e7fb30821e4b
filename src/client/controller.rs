use chrono::Utc;
use log::{ debug, error, info, warn };
use std::sync::atomic::{ AtomicBool, AtomicI64, AtomicU64, Ordering };
use std::sync::Arc;
use tokio::sync::{ mpsc, Mutex };

use super::attachment::{ encode_all, Attachment, MAX_ATTACHMENTS };
use super::capability::{
    Capability,
    LogNotifier,
    Notifier,
    RecognitionConfig,
    RecognitionEvent,
    RecognitionSession,
    SpeechRecognizer,
    SpeechSynthesizer,
};
use super::transport::ChatTransport;
use crate::models::chat::{ Message, Role };

const RECOGNITION_UNSUPPORTED: &str = "Voice recognition not supported on this device";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing to send.
    Skipped,
    /// Another send is still in flight.
    Busy,
    Replied(Message),
    /// The relay answered with an empty reply.
    Unanswered,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingOutcome {
    Started,
    AlreadyActive,
    Unsupported,
    Failed,
}

#[derive(Default)]
struct ConversationState {
    messages: Vec<Message>,
    input: String,
    attachments: Vec<Attachment>,
}

struct ActiveSession {
    generation: u64,
    handle: Box<dyn RecognitionSession>,
}

struct Dictation {
    recording: AtomicBool,
    generation: AtomicU64,
    session: Mutex<Option<ActiveSession>>,
}

/// Resets the sending flag however the send ends.
struct SendingGuard<'a>(&'a AtomicBool);

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Owns one conversation: the append-only message list, the pending input
/// and attachments, and the single dictation session.
pub struct ConversationController {
    transport: Arc<dyn ChatTransport>,
    synthesizer: Capability<dyn SpeechSynthesizer>,
    recognizer: Capability<dyn SpeechRecognizer>,
    notifier: Arc<dyn Notifier>,
    state: Arc<Mutex<ConversationState>>,
    sending: AtomicBool,
    last_id: AtomicI64,
    dictation: Arc<Dictation>,
}

impl ConversationController {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            transport,
            synthesizer: Capability::Unavailable,
            recognizer: Capability::Unavailable,
            notifier: Arc::new(LogNotifier),
            state: Arc::new(Mutex::new(ConversationState::default())),
            sending: AtomicBool::new(false),
            last_id: AtomicI64::new(0),
            dictation: Arc::new(Dictation {
                recording: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                session: Mutex::new(None),
            }),
        }
    }

    pub fn with_synthesizer(mut self, synthesizer: Capability<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn with_recognizer(mut self, recognizer: Capability<dyn SpeechRecognizer>) -> Self {
        self.recognizer = recognizer;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.state.lock().await.messages.clone()
    }

    pub async fn input(&self) -> String {
        self.state.lock().await.input.clone()
    }

    pub async fn set_input(&self, text: impl Into<String>) {
        self.state.lock().await.input = text.into();
    }

    pub async fn attachments(&self) -> Vec<Attachment> {
        self.state.lock().await.attachments.clone()
    }

    /// Replaces the pending attachments with the first four of `files`.
    /// Returns how many were kept.
    pub async fn attach_files(&self, mut files: Vec<Attachment>) -> usize {
        if files.len() > MAX_ATTACHMENTS {
            debug!("Dropping {} attachment(s) over the limit", files.len() - MAX_ATTACHMENTS);
            files.truncate(MAX_ATTACHMENTS);
        }
        let kept = files.len();
        self.state.lock().await.attachments = files;
        kept
    }

    pub async fn clear_attachments(&self) {
        self.state.lock().await.attachments.clear();
    }

    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::SeqCst)
    }

    pub fn is_recording(&self) -> bool {
        self.dictation.recording.load(Ordering::SeqCst)
    }

    fn next_id(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let prev = self.last_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
            .unwrap_or(now - 1);
        now.max(prev + 1)
    }

    pub async fn send_message(&self) -> SendOutcome {
        let (text, attachments) = {
            let state = self.state.lock().await;
            (state.input.trim().to_string(), state.attachments.clone())
        };
        if text.is_empty() && attachments.is_empty() {
            return SendOutcome::Skipped;
        }
        if self.sending.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_err() {
            debug!("Send ignored: previous message still in flight");
            return SendOutcome::Busy;
        }
        let _guard = SendingGuard(&self.sending);

        let images = match encode_all(&attachments).await {
            Ok(images) => images,
            Err(e) => {
                error!("Failed to encode attachments: {}", e);
                return SendOutcome::Failed(e.to_string());
            }
        };

        let history = {
            let mut state = self.state.lock().await;
            let user_message = Message::new(self.next_id(), Role::User, text, images);
            state.messages.push(user_message);
            state.input.clear();
            state.attachments.clear();
            state.messages.clone()
        };

        let reply = match self.transport.send(&history).await {
            Ok(reply) => reply.reply,
            Err(e) => {
                error!("Chat request failed: {}", e);
                return SendOutcome::Failed(e.to_string());
            }
        };
        if reply.is_empty() {
            warn!("Relay returned an empty reply");
            return SendOutcome::Unanswered;
        }

        let assistant = Message::new(self.next_id(), Role::Assistant, reply, Vec::new());
        self.state.lock().await.messages.push(assistant.clone());

        if let Some(synth) = self.synthesizer.get() {
            synth.speak(&assistant.content);
        }

        SendOutcome::Replied(assistant)
    }

    pub async fn start_recording(&self) -> RecordingOutcome {
        let mut slot = self.dictation.session.lock().await;
        if self.is_recording() {
            return RecordingOutcome::AlreadyActive;
        }
        let recognizer = match self.recognizer.get() {
            Some(r) => Arc::clone(r),
            None => {
                self.notifier.notify(RECOGNITION_UNSUPPORTED);
                return RecordingOutcome::Unsupported;
            }
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = match recognizer.start(&RecognitionConfig::default(), tx) {
            Ok(handle) => handle,
            Err(e) => {
                error!("{}", e);
                return RecordingOutcome::Failed;
            }
        };

        let generation = self.dictation.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *slot = Some(ActiveSession { generation, handle });
        self.dictation.recording.store(true, Ordering::SeqCst);
        drop(slot);

        tokio::spawn(
            watch_session(rx, generation, Arc::clone(&self.state), Arc::clone(&self.dictation))
        );
        info!("Dictation started");

        RecordingOutcome::Started
    }

    /// Requests the active session to stop. Returns `false` when none is active.
    pub async fn stop_recording(&self) -> bool {
        match self.dictation.session.lock().await.as_ref() {
            Some(active) => {
                active.handle.stop();
                true
            }
            None => false,
        }
    }
}

async fn watch_session(
    mut events: mpsc::UnboundedReceiver<RecognitionEvent>,
    generation: u64,
    state: Arc<Mutex<ConversationState>>,
    dictation: Arc<Dictation>
) {
    while let Some(event) = events.recv().await {
        match event {
            RecognitionEvent::Started => debug!("Recognition session {} started", generation),
            RecognitionEvent::Transcript(alternatives) => {
                if let Some(best) = alternatives.into_iter().next() {
                    state.lock().await.input = best;
                }
            }
            RecognitionEvent::Ended => {
                break;
            }
            RecognitionEvent::Error(e) => {
                warn!("Recognition error: {}", e);
                break;
            }
        }
    }

    let mut slot = dictation.session.lock().await;
    if slot.as_ref().map(|s| s.generation) == Some(generation) {
        *slot = None;
        dictation.recording.store(false, Ordering::SeqCst);
    }
}
