use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use hooktrace_core::{
    Handler, HookArgs, HookError, HookHost, HookValue, HostCapabilities, HostDefaults, PointId,
    Result, Severity,
};

/// In-memory stand-in for the host process.
///
/// Owns the single active-handler-per-point table, deterministic default
/// behaviors, the catalog behind index-name lookups, and a server log
/// pipeline that routes every line through the active emit-log handler the
/// way the host's own log machinery does.
pub struct SimHost {
    version: u32,
    handlers: HashMap<PointId, Handler>,
    indexes: HashMap<u32, String>,
    refuse: HashSet<PointId>,
    index_lookups: AtomicU32,
}

impl SimHost {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            handlers: HashMap::new(),
            indexes: HashMap::new(),
            refuse: HashSet::new(),
            index_lookups: AtomicU32::new(0),
        }
    }

    pub fn with_index(mut self, index_id: u32, name: &str) -> Self {
        self.indexes.insert(index_id, name.to_string());
        self
    }

    /// Make handler registration at a point fail, to exercise load aborts.
    pub fn refuse_registration(&mut self, point: PointId) {
        self.refuse.insert(point);
    }

    /// How many times the index-name lookup facility ran.
    pub fn index_lookup_count(&self) -> u32 {
        self.index_lookups.load(Ordering::SeqCst)
    }

    /// Invoke whatever is active at a point, the way the host calls out at
    /// that point: the registered handler if any party installed one, the
    /// built-in behavior otherwise.
    pub fn fire(&self, point: PointId, args: &HookArgs) -> Result<HookValue> {
        match self.handlers.get(&point) {
            Some(handler) => {
                let handler = Arc::clone(handler);
                handler(self, args)
            }
            None => self.run_default(point, args),
        }
    }

    /// The host's own log pipeline: every server log line is offered to the
    /// active emit-log handler before delivery.
    pub fn emit_server_log(&self, severity: Severity, message: &str) -> Result<()> {
        let args = HookArgs::EmitLog {
            severity,
            message: message.to_string(),
        };
        self.fire(PointId::EmitLog, &args).map(|_| ())
    }
}

impl HostDefaults for SimHost {
    fn run_default(&self, point: PointId, args: &HookArgs) -> Result<HookValue> {
        if args.point() != point {
            return Err(HookError::Host(format!("malformed payload for {point}")));
        }
        match args {
            HookArgs::Planner {
                query,
                cursor_options,
            } => Ok(HookValue::Plan {
                summary: format!("seqscan[{cursor_options}] {query}"),
            }),
            HookArgs::NeedsFunctionHook { .. } | HookArgs::ExecutorCheckPerms { .. } => {
                Ok(HookValue::Allowed(true))
            }
            HookArgs::IndexName { index_id } => match self.lookup_index_name(*index_id) {
                Some(name) => Ok(HookValue::Name(name)),
                None => Err(HookError::Host(format!(
                    "cache lookup failed for index {index_id}"
                ))),
            },
            _ => Ok(HookValue::Unit),
        }
    }

    fn lookup_index_name(&self, index_id: u32) -> Option<String> {
        self.index_lookups.fetch_add(1, Ordering::SeqCst);
        self.indexes.get(&index_id).cloned()
    }
}

impl HookHost for SimHost {
    fn capabilities(&self) -> HostCapabilities {
        HostCapabilities::new(self.version)
    }

    fn active_handler(&self, point: PointId) -> Option<Handler> {
        self.handlers.get(&point).cloned()
    }

    fn set_handler(
        &mut self,
        point: PointId,
        handler: Option<Handler>,
    ) -> std::result::Result<(), String> {
        if self.refuse.contains(&point) {
            return Err(format!("registration refused for {point}"));
        }
        match handler {
            Some(handler) => {
                self.handlers.insert(point, handler);
            }
            None => {
                self.handlers.remove(&point);
            }
        }
        Ok(())
    }
}
