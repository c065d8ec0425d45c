//! Host-environment sinks. The authority reports auth failures through a
//! notifier and a navigator so it works the same behind a web page, a CLI,
//! or a test harness; the defaults only log.

use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// User-facing notification sink. Must be callable even when the host defines
/// no UI for it.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Navigation sink.
///
/// `redirect_to_entry_point` must be a no-op when the host is already at the
/// login entry point, so repeated auth failures cannot loop.
pub trait Navigator: Send + Sync {
    fn redirect_to_entry_point(&self);

    /// Re-evaluate any authenticated UI after the session ends.
    fn refresh(&self);
}

/// Default notifier: routes messages through `tracing`.
#[derive(Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info => info!("{message}"),
            Severity::Warning => warn!("{message}"),
            Severity::Error => error!("{message}"),
        }
    }
}

/// Default navigator for hosts with no navigation concept, such as the CLI.
#[derive(Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn redirect_to_entry_point(&self) {}

    fn refresh(&self) {}
}
