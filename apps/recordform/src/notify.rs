//! User-facing notifications raised by the form controller.

use tracing::info;

/// Receives success messages ("Patient has been added.").
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, message: &str) {
        info!(%message, "notification");
    }
}

/// Prints notifications to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn success(&self, message: &str) {
        println!("✓ {}", message);
    }
}
