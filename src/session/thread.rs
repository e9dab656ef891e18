//! Page sessions and their storage.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::ChatError;
use crate::events::ChatEvent;

use super::conversation::Conversation;
use super::message::{Message, MessageId, MessageRole};

/// Buffered events per session before slow subscribers start lagging.
const EVENT_CAPACITY: usize = 256;

/// One rendering of the chat page.
///
/// Owns the conversation, the controls lock, and the event broadcaster
/// the browser subscribes to. Cloning is cheap and shares state.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    id: String,
    conversation: RwLock<Conversation>,
    controls_locked: AtomicBool,
    events: broadcast::Sender<ChatEvent>,
    cancel: CancellationToken,
    last_activity: RwLock<DateTime<Utc>>,
}

impl Session {
    fn new(id: String, welcome: &str) -> Self {
        let now = Utc::now();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(SessionInner {
                id,
                conversation: RwLock::new(Conversation::with_welcome(welcome)),
                controls_locked: AtomicBool::new(false),
                events,
                cancel: CancellationToken::new(),
                last_activity: RwLock::new(now),
            }),
        }
    }

    /// Get the session ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Copy of every message, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.read().messages().to_vec()
    }

    #[must_use]
    pub fn message(&self, id: MessageId) -> Option<Message> {
        self.read().get(id).cloned()
    }

    #[must_use]
    pub fn message_count(&self) -> usize {
        self.read().len()
    }

    /// Thread id to echo on the next request.
    #[must_use]
    pub fn thread_id(&self) -> Option<String> {
        self.read().thread_id().map(ToString::to_string)
    }

    /// Append a message and announce it.
    pub fn append(&self, role: MessageRole, content: impl Into<String>, streaming: bool) -> Message {
        let message = self.write().push(role, content, streaming);
        self.touch();
        self.publish(ChatEvent::message_appended(&message));
        message
    }

    /// Replace the visible content of a message that is still streaming.
    pub fn update_content(&self, id: MessageId, content: &str) -> Option<Message> {
        let message = self.write().set_content(id, content).cloned()?;
        self.publish(ChatEvent::message_updated(&message));
        Some(message)
    }

    /// Mark a message complete, optionally swapping in final content.
    pub fn finish_message(&self, id: MessageId, content: Option<String>) -> Option<Message> {
        let message = self.write().finish(id, content).cloned()?;
        self.touch();
        self.publish(ChatEvent::message_updated(&message));
        Some(message)
    }

    /// Store a backend thread id; blank or unchanged values are ignored.
    pub fn set_thread_id(&self, raw: &str) -> Option<String> {
        let stored = self.write().set_thread_id(raw).map(ToString::to_string)?;
        self.publish(ChatEvent::ThreadUpdated {
            thread_id: stored.clone(),
        });
        Some(stored)
    }

    /// Lock the input controls for the duration of one turn.
    ///
    /// Fails with [`ChatError::Busy`] if another turn holds them.
    pub fn lock_controls(&self) -> Result<ControlsGuard, ChatError> {
        self.inner
            .controls_locked
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_already_locked| ChatError::Busy(self.id().to_string()))?;

        self.publish(ChatEvent::ControlsLocked);
        Ok(ControlsGuard {
            session: self.clone(),
        })
    }

    #[must_use]
    pub fn controls_locked(&self) -> bool {
        self.inner.controls_locked.load(Ordering::Acquire)
    }

    /// Everything a freshly connected page needs to render the panel.
    #[must_use]
    pub fn snapshot(&self) -> ChatEvent {
        let (messages, thread_id) = {
            let conversation = self.read();
            (
                conversation.messages().iter().map(Into::into).collect(),
                conversation.thread_id().map(ToString::to_string),
            )
        };
        ChatEvent::Snapshot {
            messages,
            thread_id,
            controls_locked: self.controls_locked(),
        }
    }

    /// Event receiver for this session. Past events are not replayed.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.inner.events.subscribe()
    }

    /// Token cancelled when the session is closed.
    #[must_use]
    pub fn cancellation(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    /// Stop any in-flight turn.
    pub fn close(&self) {
        self.inner.cancel.cancel();
    }

    /// Whether a page is currently listening for events.
    #[must_use]
    pub fn has_subscribers(&self) -> bool {
        self.inner.events.receiver_count() > 0
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Check if the session has been idle for at least `timeout`.
    #[must_use]
    pub fn is_expired_with_timeout(&self, timeout: Duration) -> bool {
        let last = *self
            .inner
            .last_activity
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        (Utc::now() - last)
            .to_std()
            .is_ok_and(|idle| idle >= timeout)
    }

    fn publish(&self, event: ChatEvent) {
        // No subscribers is fine: the page may not have connected yet.
        let _ = self.inner.events.send(event);
    }

    fn touch(&self) {
        let mut guard = self
            .inner
            .last_activity
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Utc::now();
    }

    fn read(&self) -> RwLockReadGuard<'_, Conversation> {
        self.inner
            .conversation
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Conversation> {
        self.inner
            .conversation
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds the controls lock; dropping it re-enables the input.
#[derive(Debug)]
#[must_use = "dropping the guard immediately unlocks the controls"]
pub struct ControlsGuard {
    session: Session,
}

impl Drop for ControlsGuard {
    fn drop(&mut self) {
        self.session
            .inner
            .controls_locked
            .store(false, Ordering::Release);
        self.session.publish(ChatEvent::ControlsUnlocked);
    }
}

/// Thread-safe store for sessions.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

#[derive(Debug)]
struct SessionStoreInner {
    sessions: RwLock<HashMap<String, Session>>,
    welcome: String,
}

impl SessionStore {
    /// Create a store whose sessions open with `welcome`.
    #[must_use]
    pub fn new(welcome: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                sessions: RwLock::new(HashMap::new()),
                welcome: welcome.into(),
            }),
        }
    }

    /// Create a new session and return it.
    #[must_use]
    pub fn create(&self) -> Session {
        let id = Uuid::new_v4().to_string();
        let session = Session::new(id.clone(), &self.inner.welcome);
        self.sessions_mut().insert(id, session.clone());
        session
    }

    /// Get a session by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Session> {
        self.inner
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Get a session by ID or fail with [`ChatError::SessionNotFound`].
    pub fn require(&self, id: &str) -> Result<Session, ChatError> {
        self.get(id)
            .ok_or_else(|| ChatError::SessionNotFound(id.to_string()))
    }

    /// Remove a session and cancel whatever it is doing.
    pub fn remove(&self, id: &str) -> Option<Session> {
        let session = self.sessions_mut().remove(id)?;
        session.close();
        Some(session)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove sessions idle longer than `timeout`.
    ///
    /// Sessions mid-turn or with a connected page are kept. Returns the
    /// number of sessions removed.
    pub fn cleanup_expired_with_timeout(&self, timeout: Duration) -> usize {
        let mut guard = self.sessions_mut();
        let before = guard.len();
        guard.retain(|_, session| {
            let expired = !session.controls_locked()
                && !session.has_subscribers()
                && session.is_expired_with_timeout(timeout);
            if expired {
                session.close();
            }
            !expired
        });
        before - guard.len()
    }

    fn sessions_mut(&self) -> RwLockWriteGuard<'_, HashMap<String, Session>> {
        self.inner
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let store = SessionStore::new("hello");
        let session = store.create();

        assert_eq!(session.message_count(), 1);
        assert_eq!(session.messages()[0].content, "hello");

        session.append(MessageRole::User, "question", false);
        assert_eq!(session.message_count(), 2);
    }

    #[test]
    fn test_session_store() {
        let store = SessionStore::new("hi");
        assert!(store.is_empty());

        let session = store.create();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(session.id()).unwrap().id(), session.id());

        let removed = store.remove(session.id()).unwrap();
        assert!(removed.is_closed());
        assert!(store.is_empty());
        assert_eq!(
            store.require(session.id()).unwrap_err(),
            ChatError::SessionNotFound(session.id().to_string())
        );
    }

    #[test]
    fn test_controls_guard_releases_on_drop() {
        let store = SessionStore::new("hi");
        let session = store.create();

        let guard = session.lock_controls().unwrap();
        assert!(session.controls_locked());
        assert!(matches!(session.lock_controls(), Err(ChatError::Busy(_))));

        drop(guard);
        assert!(!session.controls_locked());
        assert!(session.lock_controls().is_ok());
    }

    #[test]
    fn test_events_follow_mutations() {
        let store = SessionStore::new("hi");
        let session = store.create();
        let mut rx = session.subscribe();

        let guard = session.lock_controls().unwrap();
        let reply = session.append(MessageRole::Assistant, "", true);
        session.update_content(reply.id, "par");
        session.finish_message(reply.id, None);
        session.set_thread_id("\"t\"");
        drop(guard);

        let names: Vec<&str> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| crate::events::event_name(&e))
            .collect();
        assert_eq!(
            names,
            vec![
                "controls.locked",
                "message.appended",
                "message.updated",
                "message.updated",
                "thread.updated",
                "controls.unlocked",
            ]
        );
    }

    #[test]
    fn test_cleanup_skips_busy_sessions() {
        let store = SessionStore::new("hi");
        let idle = store.create();
        let busy = store.create();
        let _guard = busy.lock_controls().unwrap();

        let removed = store.cleanup_expired_with_timeout(Duration::ZERO);
        assert_eq!(removed, 1);
        assert!(store.get(idle.id()).is_none());
        assert!(store.get(busy.id()).is_some());
    }

    #[test]
    fn test_cleanup_keeps_connected_sessions() {
        let store = SessionStore::new("hi");
        let connected = store.create();
        let rx = connected.subscribe();

        assert_eq!(store.cleanup_expired_with_timeout(Duration::ZERO), 0);

        drop(rx);
        assert_eq!(store.cleanup_expired_with_timeout(Duration::ZERO), 1);
        assert!(connected.is_closed());
    }
}
