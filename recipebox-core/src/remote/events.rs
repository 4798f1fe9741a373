//! Session-change notifications published by the auth capability.

use tokio::sync::broadcast;
use uuid::Uuid;

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A magic-link code was exchanged for a session.
    SignedIn { user_id: Uuid },
    /// A session was revoked.
    SignedOut,
}

/// Broadcast channel of [`AuthEvent`]s. Cloning shares the channel.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    sender: broadcast::Sender<AuthEvent>,
}

impl SessionEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Events with no subscribers are dropped.
    pub fn publish(&self, event: AuthEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("auth event dropped, no subscribers");
        }
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_published_events() {
        let events = SessionEvents::default();
        let mut rx = events.subscribe();
        let user_id = Uuid::new_v4();

        events.publish(AuthEvent::SignedIn { user_id });
        events.publish(AuthEvent::SignedOut);

        assert_eq!(rx.recv().await.unwrap(), AuthEvent::SignedIn { user_id });
        assert_eq!(rx.recv().await.unwrap(), AuthEvent::SignedOut);
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        SessionEvents::new(4).publish(AuthEvent::SignedOut);
    }
}
