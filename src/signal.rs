//! Signal handling for graceful shutdown.
//!
//! Installs a Ctrl+C handler that sets a shared `AtomicBool`. The hashing
//! pipeline checks the flag between files and the link installer checks it
//! between duplicates, so an interrupted run stops at the next safe point.
//! (Safety under a hard kill does not depend on this flag; the backup-rename
//! protocol already survives a kill between any two syscalls.)

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared shutdown flag for coordinated termination.
///
/// Clone freely; all clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with the flag initially unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Manually request a shutdown.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Get a clone of the underlying flag for worker threads.
    #[must_use]
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Reset the flag to unset. Useful when a handler is reused in tests.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C handler and return its shutdown handle.
///
/// The OS hook can only be registered once per process; repeated calls
/// (parallel tests, repeated `run_app` invocations) reuse the existing
/// handler with its flag reset. If registration fails because some other
/// component owns the hook, an unhooked handler is returned so the caller
/// can still drive shutdown manually.
pub fn install_handler() -> ShutdownHandler {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return handler.clone();
    }

    let handler = ShutdownHandler::new();
    let flag = handler.flag();

    let registered = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Finishing current operation...");
        let _ = std::io::stderr().flush();
    })
    .is_ok();

    if !registered {
        log::debug!("Ctrl+C handler already registered elsewhere, using unhooked handler");
    }

    let _ = GLOBAL_HANDLER.set(handler.clone());
    GLOBAL_HANDLER.get().cloned().unwrap_or(handler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_handler_is_unset() {
        let handler = ShutdownHandler::new();
        assert!(!handler.is_shutdown_requested());
    }

    #[test]
    fn test_request_and_reset() {
        let handler = ShutdownHandler::new();
        handler.request_shutdown();
        assert!(handler.is_shutdown_requested());
        handler.reset();
        assert!(!handler.is_shutdown_requested());
    }

    #[test]
    fn test_flag_shares_state() {
        let handler = ShutdownHandler::new();
        let flag = handler.flag();
        flag.store(true, Ordering::SeqCst);
        assert!(handler.is_shutdown_requested());
    }

    #[test]
    fn test_clone_shares_flag() {
        let handler = ShutdownHandler::new();
        let cloned = handler.clone();
        handler.request_shutdown();
        assert!(cloned.is_shutdown_requested());
    }

    #[test]
    fn test_install_handler_is_reusable() {
        let first = install_handler();
        first.request_shutdown();
        let second = install_handler();
        // Reinstallation resets the shared flag
        assert!(!second.is_shutdown_requested());
    }
}
