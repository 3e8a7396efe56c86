//! Plugins: collaborators that adjust host wiring once, at construction.

use crate::host::ServiceHost;

/// A construction-time hook.
///
/// `register` runs after the configuration has been validated and before
/// the stats job is scheduled, with mutable access to the host so a plugin
/// can add handlers or replace the exception handler.
pub trait Plugin: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// # Errors
    ///
    /// Any error aborts host construction and is returned to the caller
    /// unchanged.
    fn register(&self, host: &mut ServiceHost) -> anyhow::Result<()>;
}
