use std::sync::Arc;

use crate::capability::HostCapabilities;
use crate::error::Result;
use crate::point::{HookArgs, HookValue, PointId};

/// A handler registered at an extension point.
///
/// The host hands its default-behavior facade to whichever handler it
/// invokes, so a chained handler can reach built-in behavior without owning
/// the host.
pub type Handler = Arc<dyn Fn(&dyn HostDefaults, &HookArgs) -> Result<HookValue> + Send + Sync>;

/// The host's built-in behaviors, reachable from a running handler.
pub trait HostDefaults {
    /// Run the host's documented default behavior for a point with the given
    /// arguments, e.g. the standard planner.
    fn run_default(&self, point: PointId, args: &HookArgs) -> Result<HookValue>;

    /// The host lookup facility behind the index-name point's fallback.
    fn lookup_index_name(&self, index_id: u32) -> Option<String>;
}

/// Host surface the lifecycle manager installs against. The host owns the
/// active-handler table; this system only ever holds copies of previous
/// handlers.
pub trait HookHost: HostDefaults {
    fn capabilities(&self) -> HostCapabilities;

    /// Currently active handler for a point, if any party registered one.
    fn active_handler(&self, point: PointId) -> Option<Handler>;

    /// Replace the active handler for a point; `None` restores host default
    /// behavior. An `Err` is a registration refusal, fatal to module load.
    fn set_handler(
        &mut self,
        point: PointId,
        handler: Option<Handler>,
    ) -> std::result::Result<(), String>;
}
