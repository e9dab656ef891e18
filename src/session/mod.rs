//! Session and conversation state.
//!
//! Every rendering of the chat page gets its own in-memory [`Session`]. A
//! session holds the append-only message list, the backend thread id, and
//! the lock that keeps the input disabled while a question is in flight.
//! Nothing here is persisted.
//!
//! # Example
//!
//! ```rust
//! use graphrag_chat::session::{MessageRole, SessionStore};
//!
//! let store = SessionStore::new("Welcome!");
//! let session = store.create();
//! session.append(MessageRole::User, "Hello!", false);
//!
//! assert_eq!(session.message_count(), 2);
//! ```

mod conversation;
mod message;
mod thread;

pub use conversation::{Conversation, sanitize_thread_id};
pub use message::{Message, MessageId, MessageRole};
pub use thread::{ControlsGuard, Session, SessionStore};
