pub mod history;
pub mod session;

pub use history::{render_transcript, ChatMessage, ConversationStore, Role};
pub use session::{ChatSession, SessionError};
