//! Notification sink and refresh signal.
//!
//! Both are fire-and-forget side channels: the wizard never consumes a return
//! value from them. The CLI prints toasts to stdout; the UI server forwards
//! them to SSE clients.

use std::io::Write;

use tracing::debug;

use crate::core::types::NotificationKind;

/// User-visible toast feedback.
pub trait Notifier {
    fn notify(&self, kind: NotificationKind, message: &str);
}

/// Instruction to re-fetch externally displayed listing data.
pub trait RefreshSignal {
    fn request_refresh(&self);
}

/// Prints toasts to stdout, one per line, prefixed with the kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        let mut out = std::io::stdout().lock();
        // Toasts are best effort; a closed stdout must not fail the wizard.
        let _ = writeln!(out, "[{}] {}", kind, message);
    }
}

/// Refresh signal for contexts with nothing to refresh besides the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRefresh;

impl RefreshSignal for LogRefresh {
    fn request_refresh(&self) {
        debug!("listing refresh requested");
    }
}
