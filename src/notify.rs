/// Urgency of a user notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

/// Fire-and-forget user notifications
///
/// Callers never learn whether a notification was seen.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str, priority: Priority);

    /// Shows a short badge; an empty string clears it
    fn set_badge(&self, text: &str);
}

/// Notifier that writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str, priority: Priority) {
        match priority {
            Priority::High => ::log::warn!("{}: {}", title, message),
            Priority::Normal => ::log::info!("{}: {}", title, message),
            Priority::Low => ::log::debug!("{}: {}", title, message),
        }
    }

    fn set_badge(&self, text: &str) {
        if text.is_empty() {
            ::log::debug!("Badge cleared");
        } else {
            ::log::info!("Badge: {}", text);
        }
    }
}
