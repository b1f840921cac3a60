use tracing::info;

/// Modal-style user notifications, title plus message.
///
/// Every failure that reaches a screen ends up here naming the action that
/// failed; nothing propagates past a screen as a crash.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

/// Logs notifications instead of presenting a modal. Used by the headless
/// binary.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, title: &str, message: &str) {
        info!("[{}] {}", title, message);
    }
}
