//! Log sinks for reconciliation passes.
//!
//! The reconciler never reaches for a global logger directly: it is handed a [`ReconcileLog`].
//! [`LogFacade`] forwards to the `log` crate, which is what applications normally want.

use std::cell::RefCell;
use std::fmt;

/// Severity of a reconciliation log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Fatal,
}

/// Where a pass reports progress
///
/// `fatal` is used once per failed pass, right before the error is returned. It does not
/// terminate anything.
pub trait ReconcileLog {
    fn debug(&self, _args: fmt::Arguments<'_>) {}

    fn info(&self, args: fmt::Arguments<'_>);

    fn warn(&self, args: fmt::Arguments<'_>);

    fn fatal(&self, args: fmt::Arguments<'_>);
}

/// Forwards to the `log` crate under the `schemaguard` target
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFacade;

impl ReconcileLog for LogFacade {
    fn debug(&self, args: fmt::Arguments<'_>) {
        log::debug!(target: "schemaguard", "{}", args);
    }

    fn info(&self, args: fmt::Arguments<'_>) {
        log::info!(target: "schemaguard", "{}", args);
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        log::warn!(target: "schemaguard", "{}", args);
    }

    fn fatal(&self, args: fmt::Arguments<'_>) {
        log::error!(target: "schemaguard", "{}", args);
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLog;

impl ReconcileLog for NullLog {
    fn info(&self, _args: fmt::Arguments<'_>) {}

    fn warn(&self, _args: fmt::Arguments<'_>) {}

    fn fatal(&self, _args: fmt::Arguments<'_>) {}
}

/// Keeps every entry in memory, for assertions and dry-run reports
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: RefCell<Vec<(LogLevel, String)>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries.borrow().clone()
    }

    /// Messages logged at exactly `level`
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    fn push(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        self.entries.borrow_mut().push((level, args.to_string()));
    }
}

impl ReconcileLog for MemoryLog {
    fn debug(&self, args: fmt::Arguments<'_>) {
        self.push(LogLevel::Debug, args);
    }

    fn info(&self, args: fmt::Arguments<'_>) {
        self.push(LogLevel::Info, args);
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        self.push(LogLevel::Warn, args);
    }

    fn fatal(&self, args: fmt::Arguments<'_>) {
        self.push(LogLevel::Fatal, args);
    }
}

impl<L: ReconcileLog + ?Sized> ReconcileLog for &L {
    fn debug(&self, args: fmt::Arguments<'_>) {
        (**self).debug(args);
    }

    fn info(&self, args: fmt::Arguments<'_>) {
        (**self).info(args);
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        (**self).warn(args);
    }

    fn fatal(&self, args: fmt::Arguments<'_>) {
        (**self).fatal(args);
    }
}
