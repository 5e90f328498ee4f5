use crate::notification::Notification;

/// Sink for user-facing notifications (toasts).
///
/// Delivery is fire-and-forget: a sink that cannot deliver drops the
/// notification and logs, it never fails the caller.
pub trait NotificationPort: Send + Sync {
    fn notify(&self, notification: Notification);
}

