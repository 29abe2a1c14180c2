//! User notifications
//!
//! The controller reports progress and outcomes through a `Notifier` that
//! the application root hands it. Notifications are fire-and-forget: a
//! notifier cannot fail and cannot affect the operation that raised it.

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Progress message ("generating...")
    Info,
    /// An operation finished
    Success,
    /// An operation failed
    Error,
}

/// A display surface for notifications
pub trait Notifier {
    /// Show a notification
    fn notify(&self, level: NoticeLevel, message: &str);
}

/// Prints notifications to the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier {
    /// Suppress `Info` progress lines
    pub quiet: bool,
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info if !self.quiet => println!("{}", message),
            NoticeLevel::Info => {}
            NoticeLevel::Success => println!("✓ {}", message),
            NoticeLevel::Error => eprintln!("✗ {}", message),
        }
    }
}

/// Keeps every notification; clones share the same list
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub(crate) struct RecordingNotifier(
    pub(crate) std::rc::Rc<std::cell::RefCell<Vec<(NoticeLevel, String)>>>,
);

#[cfg(test)]
impl Notifier for RecordingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.0.borrow_mut().push((level, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notifiers_accept_all_levels() {
        let notifiers: Vec<Box<dyn Notifier>> = vec![
            Box::new(ConsoleNotifier { quiet: true }),
            Box::new(ConsoleNotifier::default()),
        ];
        for notifier in &notifiers {
            notifier.notify(NoticeLevel::Info, "Generando documento...");
            notifier.notify(NoticeLevel::Success, "Cambios guardados");
            notifier.notify(NoticeLevel::Error, "Error al guardar");
        }
    }
}
