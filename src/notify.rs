use crate::app::AppEvent;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_TOAST_LIFETIME: Duration = Duration::from_secs(10);
const MAX_VISIBLE_TOASTS: usize = 5;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Severity {
    Success,
    Error,
    Info,
    Warning,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
            Self::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub message: Option<String>,
}

impl Notification {
    pub fn new(severity: Severity, title: impl Into<String>, message: Option<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            message,
        }
    }
}

/// Handle for emitting user-facing messages onto the app event bus.
///
/// Cloned into every task that needs to report something; the controller
/// loop is the only consumer.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: UnboundedSender<AppEvent>,
}

impl Notifier {
    pub fn new(tx: UnboundedSender<AppEvent>) -> Self {
        Self { tx }
    }

    pub fn success(&self, title: impl Into<String>) {
        self.emit(Notification::new(Severity::Success, title, None));
    }

    pub fn info(&self, title: impl Into<String>, message: Option<String>) {
        self.emit(Notification::new(Severity::Info, title, message));
    }

    pub fn error(&self, title: impl Into<String>, message: Option<String>) {
        self.emit(Notification::new(Severity::Error, title, message));
    }

    pub fn emit(&self, notification: Notification) {
        if self.tx.send(AppEvent::Notify(notification)).is_err() {
            debug!("notification dropped, event bus closed");
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub notification: Notification,
    pub created_at: Instant,
    pub expires_at: Instant,
}

impl Toast {
    /// Fraction of lifetime left, 1.0 when fresh.
    pub fn remaining_ratio(&self, now: Instant) -> f64 {
        let lifetime = self.expires_at.saturating_duration_since(self.created_at);
        if lifetime.is_zero() {
            return 0.0;
        }
        let left = self.expires_at.saturating_duration_since(now);
        (left.as_secs_f64() / lifetime.as_secs_f64()).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
    lifetime: Duration,
}

impl ToastQueue {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            toasts: Vec::new(),
            lifetime,
        }
    }

    pub fn push(&mut self, notification: Notification, now: Instant) {
        self.toasts.push(Toast {
            notification,
            created_at: now,
            expires_at: now + self.lifetime,
        });
        if self.toasts.len() > MAX_VISIBLE_TOASTS {
            let overflow = self.toasts.len() - MAX_VISIBLE_TOASTS;
            self.toasts.drain(..overflow);
        }
    }

    pub fn prune(&mut self, now: Instant) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|toast| toast.expires_at > now);
        before != self.toasts.len()
    }

    pub fn dismiss_latest(&mut self) -> Option<Toast> {
        self.toasts.pop()
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_LIFETIME)
    }
}

#[cfg(test)]
mod tests {
    use super::{Notification, Notifier, Severity, ToastQueue};
    use crate::app::AppEvent;
    use tokio::sync::mpsc;
    use tokio::time::{Duration, Instant};

    fn note(title: &str) -> Notification {
        Notification::new(Severity::Info, title, None)
    }

    #[test]
    fn toasts_expire_after_lifetime() {
        let start = Instant::now();
        let mut queue = ToastQueue::new(Duration::from_secs(10));
        queue.push(note("first"), start);
        queue.push(note("second"), start + Duration::from_secs(5));

        assert!(!queue.prune(start + Duration::from_secs(9)));
        assert_eq!(queue.toasts().len(), 2);

        assert!(queue.prune(start + Duration::from_secs(10)));
        assert_eq!(queue.toasts().len(), 1);
        assert_eq!(queue.toasts()[0].notification.title, "second");
    }

    #[test]
    fn queue_keeps_newest_five() {
        let now = Instant::now();
        let mut queue = ToastQueue::default();
        for index in 0..7 {
            queue.push(note(&format!("toast-{index}")), now);
        }

        let titles = queue
            .toasts()
            .iter()
            .map(|toast| toast.notification.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            titles,
            vec!["toast-2", "toast-3", "toast-4", "toast-5", "toast-6"]
        );
        assert_eq!(
            queue
                .dismiss_latest()
                .map(|toast| toast.notification.title),
            Some("toast-6".to_string())
        );
    }

    #[test]
    fn remaining_ratio_counts_down() {
        let now = Instant::now();
        let mut queue = ToastQueue::new(Duration::from_secs(10));
        queue.push(note("x"), now);
        let toast = &queue.toasts()[0];
        assert_eq!(toast.remaining_ratio(now), 1.0);
        assert_eq!(toast.remaining_ratio(now + Duration::from_secs(5)), 0.5);
        assert_eq!(toast.remaining_ratio(now + Duration::from_secs(30)), 0.0);
    }

    #[test]
    fn notifier_publishes_on_event_bus() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let notifier = Notifier::new(tx);
        notifier.error("Refresh failed", Some("Please try again".to_string()));

        match rx.try_recv() {
            Ok(AppEvent::Notify(notification)) => {
                assert_eq!(notification.severity, Severity::Error);
                assert_eq!(notification.title, "Refresh failed");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
