pub mod attachment;
pub mod capability;
pub mod controller;
pub mod terminal;
pub mod transport;

pub use attachment::{ Attachment, EncodeError, MAX_ATTACHMENTS };
pub use capability::{
    Capability,
    LogNotifier,
    Notifier,
    RecognitionConfig,
    RecognitionEvent,
    RecognitionSession,
    SpeechRecognizer,
    SpeechSynthesizer,
};
pub use controller::{ ConversationController, RecordingOutcome, SendOutcome };
pub use transport::{ ChatTransport, HttpChatTransport, TransportError };
