use std::sync::Arc;

use crate::error::{HookError, Result};
use crate::guard::RecursionGuard;
use crate::host::HookHost;
use crate::interceptor::build_interceptor;
use crate::registry::Registry;
use crate::sink::{LogSink, Severity};

/// Owns the registry and orchestrates install/restore against a host.
///
/// The host guarantees `on_load` runs at most once before any point fires
/// and `on_unload` only after it stops invoking points; both run under the
/// host's module-loading serialization, so no locking beyond the slots'
/// own is needed here.
pub struct HookModule {
    registry: Registry,
    sink: Arc<dyn LogSink>,
    guard: Arc<RecursionGuard>,
}

impl HookModule {
    pub fn new(registry: Registry, sink: Arc<dyn LogSink>) -> Self {
        Self {
            registry,
            sink,
            guard: Arc::new(RecursionGuard::new()),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn guard(&self) -> &RecursionGuard {
        &self.guard
    }

    /// Module load entry point.
    ///
    /// For each point in registry order: capture the host's active handler
    /// into the slot, then publish this module's interceptor. Capture
    /// strictly precedes publish for a point, so a sibling's install can
    /// never be mistaken for pre-existing state. A host refusal aborts the
    /// load; the host discards the module wholesale on load failure, so
    /// nothing is rolled back here.
    pub fn on_load(&self, host: &mut dyn HookHost) -> Result<()> {
        self.sink.emit(Severity::Warning, "hooktrace init");
        for desc in self.registry.enabled_points() {
            self.sink
                .emit(Severity::Warning, &format!("hooking: {}", desc.id));
            let prev = host.active_handler(desc.id);
            if !desc.slot().capture(prev) {
                return Err(HookError::InstallFailure {
                    point: desc.id,
                    reason: "slot already captured; module loaded twice".into(),
                });
            }
            let interceptor =
                build_interceptor(desc, Arc::clone(&self.sink), Arc::clone(&self.guard));
            host.set_handler(desc.id, Some(interceptor))
                .map_err(|reason| HookError::InstallFailure {
                    point: desc.id,
                    reason,
                })?;
        }
        Ok(())
    }

    /// Module unload entry point.
    ///
    /// Writes every captured previous handler back in registry order,
    /// unconditionally, including "empty" for points where the host default
    /// was active. Runs to completion and is idempotent because slots are
    /// never drained; a slot install never captured is left alone.
    pub fn on_unload(&self, host: &mut dyn HookHost) {
        for desc in self.registry.enabled_points() {
            if let Some(saved) = desc.slot().snapshot()
                && host.set_handler(desc.id, saved).is_err()
            {
                // Restore is plain assignment on the host side; a refusal
                // leaves nothing further to restore to.
                self.sink
                    .emit(Severity::Warning, &format!("unhook failed: {}", desc.id));
            }
        }
    }
}
