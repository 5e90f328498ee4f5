//! Notification sinks.

use fd_core::notification::{Notification, NotificationLevel};
use fd_core::ports::NotificationPort;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Writes notifications to the log. Used by the headless binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl NotificationPort for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let Notification {
            title,
            message,
            level,
        } = notification;
        match level {
            NotificationLevel::Info | NotificationLevel::Success => {
                info!(%title, %message, "notification")
            }
            NotificationLevel::Warning => warn!(%title, %message, "notification"),
            NotificationLevel::Destructive => error!(%title, %message, "notification"),
        }
    }
}

/// Forwards notifications to a UI consumer over an unbounded channel.
#[derive(Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationPort for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if let Err(err) = self.tx.send(notification) {
            warn!(title = %err.0.title, "notification dropped, no receiver");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_notifier_delivers_in_order() {
        let (notifier, mut rx) = ChannelNotifier::channel();
        notifier.notify(Notification::new("a", "1", NotificationLevel::Info));
        notifier.notify(Notification::destructive("b", "2"));

        assert_eq!(rx.recv().await.unwrap().title, "a");
        let second = rx.recv().await.unwrap();
        assert_eq!(second.title, "b");
        assert_eq!(second.level, NotificationLevel::Destructive);
    }

    #[test]
    fn channel_notifier_without_receiver_does_not_panic() {
        let (notifier, rx) = ChannelNotifier::channel();
        drop(rx);
        notifier.notify(Notification::new("a", "1", NotificationLevel::Warning));
    }
}
