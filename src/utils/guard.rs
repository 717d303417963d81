//! Diagnostic tracking of explicit buffer release.

use tracing::warn;

/// Tracks whether a handle still owes an explicit release for its native
/// buffer reference.
///
/// The guard is armed whenever a handle becomes bound and disarmed when the
/// reference is released. A handle dropped while the guard is still armed
/// is a programming error on the caller's side; the guard surfaces it as a
/// warning-level diagnostic rather than a hard failure, since at that point
/// the resource can only be reclaimed by the drop path anyway.
#[derive(Debug, Default)]
pub(crate) struct ReleaseGuard {
    armed: bool,
}

impl ReleaseGuard {
    /// Note that the handle now holds a reference requiring release.
    pub(crate) fn arm(&mut self) {
        self.armed = true;
    }

    /// Note that the reference was released.
    pub(crate) fn disarm(&mut self) {
        self.armed = false;
    }

    /// Emit the leak diagnostic if the guard is still armed.
    pub(crate) fn warn_if_armed(&self, name: &str) {
        if self.armed {
            warn!(
                name = %name,
                "surface handle dropped while still bound to a buffer; release() was never called"
            );
        }
    }
}
