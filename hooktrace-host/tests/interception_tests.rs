use std::sync::{Arc, Mutex};

use hooktrace_core::{
    Handler, HookArgs, HookError, HookHost, HookModule, HookValue, LogSink, MemorySink, PointId,
    Registry, Severity,
};
use hooktrace_host::SimHost;

fn module_for(host: &SimHost) -> (HookModule, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let registry = Registry::for_host(&host.capabilities());
    let module = HookModule::new(registry, Arc::clone(&sink) as Arc<dyn LogSink>);
    (module, sink)
}

fn planner_args() -> HookArgs {
    HookArgs::Planner {
        query: "select * from users".into(),
        cursor_options: 0,
    }
}

#[test]
fn chaining_preserves_host_default_result() {
    let bare = SimHost::new(16);
    let expected = bare.fire(PointId::Planner, &planner_args()).unwrap();

    let mut host = SimHost::new(16);
    let (module, sink) = module_for(&host);
    module.on_load(&mut host).unwrap();

    let observed = host.fire(PointId::Planner, &planner_args()).unwrap();
    assert_eq!(observed, expected);
    assert_eq!(sink.count_containing("planner hook called"), 1);
}

#[test]
fn chaining_preserves_previous_handler_result() {
    let mut host = SimHost::new(16);
    let custom: Handler = Arc::new(|_, _| {
        Ok(HookValue::Plan {
            summary: "bitmap-heap".into(),
        })
    });
    host.set_handler(PointId::Planner, Some(custom)).unwrap();

    let (module, _sink) = module_for(&host);
    module.on_load(&mut host).unwrap();

    let observed = host.fire(PointId::Planner, &planner_args()).unwrap();
    assert_eq!(
        observed,
        HookValue::Plan {
            summary: "bitmap-heap".into()
        }
    );
}

#[test]
fn round_trip_restores_preinstall_table() {
    let mut host = SimHost::new(16);
    let prior: Handler = Arc::new(|_, _| {
        Ok(HookValue::Plan {
            summary: "prior".into(),
        })
    });
    host.set_handler(PointId::Planner, Some(Arc::clone(&prior)))
        .unwrap();

    let (module, _sink) = module_for(&host);
    module.on_load(&mut host).unwrap();
    module.on_unload(&mut host);

    // The prior handler is back, bit-for-bit the same allocation.
    let restored = host.active_handler(PointId::Planner).unwrap();
    assert!(Arc::ptr_eq(&restored, &prior));

    // Every other point is back to host default (no handler at all).
    for desc in module.registry().enabled_points() {
        if desc.id != PointId::Planner {
            assert!(
                host.active_handler(desc.id).is_none(),
                "{} not restored to host default",
                desc.id
            );
        }
    }
}

#[test]
fn teardown_is_idempotent() {
    let mut host = SimHost::new(16);
    let prior: Handler = Arc::new(|_, _| Ok(HookValue::Unit));
    host.set_handler(PointId::ExecutorEnd, Some(Arc::clone(&prior)))
        .unwrap();

    let (module, _sink) = module_for(&host);
    module.on_load(&mut host).unwrap();
    module.on_unload(&mut host);
    module.on_unload(&mut host);

    let restored = host.active_handler(PointId::ExecutorEnd).unwrap();
    assert!(Arc::ptr_eq(&restored, &prior));
    assert!(host.active_handler(PointId::Planner).is_none());
}

#[test]
fn invoking_one_point_never_touches_another() {
    let mut host = SimHost::new(16);
    let (module, _sink) = module_for(&host);
    module.on_load(&mut host).unwrap();

    let executor_end_before = host.active_handler(PointId::ExecutorEnd).unwrap();
    for _ in 0..10 {
        host.fire(PointId::Planner, &planner_args()).unwrap();
    }

    let executor_end_after = host.active_handler(PointId::ExecutorEnd).unwrap();
    assert!(Arc::ptr_eq(&executor_end_before, &executor_end_after));
    assert!(
        module
            .registry()
            .describe(PointId::ExecutorEnd)
            .unwrap()
            .slot()
            .previous()
            .is_none()
    );
}

#[test]
fn transform_fallback_runs_lookup_exactly_once() {
    let mut host = SimHost::new(16).with_index(7, "idx_users");
    let empty_delegate: Handler = Arc::new(|_, _| Ok(HookValue::MaybeName(None)));
    host.set_handler(PointId::IndexName, Some(empty_delegate))
        .unwrap();

    let (module, _sink) = module_for(&host);
    module.on_load(&mut host).unwrap();

    let value = host
        .fire(PointId::IndexName, &HookArgs::IndexName { index_id: 7 })
        .unwrap();
    assert_eq!(value, HookValue::Name("idx_users".into()));
    assert_eq!(host.index_lookup_count(), 1);
}

#[test]
fn transform_delegate_hit_skips_lookup() {
    let mut host = SimHost::new(16).with_index(7, "idx_users");
    let delegate: Handler = Arc::new(|_, _| Ok(HookValue::MaybeName(Some("idx_cached".into()))));
    host.set_handler(PointId::IndexName, Some(delegate)).unwrap();

    let (module, _sink) = module_for(&host);
    module.on_load(&mut host).unwrap();

    let value = host
        .fire(PointId::IndexName, &HookArgs::IndexName { index_id: 7 })
        .unwrap();
    assert_eq!(value, HookValue::Name("idx_cached".into()));
    assert_eq!(host.index_lookup_count(), 0);
}

#[test]
fn transform_not_found_when_both_paths_empty() {
    let mut host = SimHost::new(16);
    let (module, sink) = module_for(&host);
    module.on_load(&mut host).unwrap();

    let err = host
        .fire(PointId::IndexName, &HookArgs::IndexName { index_id: 404 })
        .unwrap_err();
    assert!(matches!(err, HookError::NotFound { index_id: 404 }));
    assert_eq!(sink.count_containing("resolved"), 0);
}

#[test]
fn veto_point_always_allows() {
    let mut host = SimHost::new(16);
    let denier: Handler = Arc::new(|_, _| Ok(HookValue::Allowed(false)));
    host.set_handler(PointId::ExecutorCheckPerms, Some(denier))
        .unwrap();

    let (module, _sink) = module_for(&host);
    module.on_load(&mut host).unwrap();

    let value = host
        .fire(
            PointId::ExecutorCheckPerms,
            &HookArgs::ExecutorCheckPerms {
                tables: vec!["accounts".into()],
            },
        )
        .unwrap();
    assert_eq!(value, HookValue::Allowed(true));
}

#[test]
fn install_failure_aborts_load() {
    let mut host = SimHost::new(16);
    host.refuse_registration(PointId::ExecutorRun);

    let (module, _sink) = module_for(&host);
    let err = module.on_load(&mut host).unwrap_err();
    assert!(matches!(
        err,
        HookError::InstallFailure {
            point: PointId::ExecutorRun,
            ..
        }
    ));
}

#[test]
fn gated_point_is_not_installed_on_old_host() {
    let mut host = SimHost::new(11);
    let (module, _sink) = module_for(&host);
    module.on_load(&mut host).unwrap();

    assert!(host.active_handler(PointId::IndexName).is_none());
    assert!(matches!(
        module.registry().describe(PointId::IndexName),
        Err(HookError::UnknownPoint(PointId::IndexName))
    ));
    // The ungated points are all hooked.
    assert!(host.active_handler(PointId::Planner).is_some());
    assert_eq!(module.registry().len(), 13);
}

/// Sink wired into the host's own log pipeline, so that emitting a line
/// re-enters the emit-log interceptor the way elog re-enters the hook.
#[derive(Default)]
struct PipelineSink {
    host: Mutex<Option<Arc<SimHost>>>,
    lines: Mutex<Vec<String>>,
}

impl PipelineSink {
    fn attach(&self, host: &Arc<SimHost>) {
        *self.host.lock().unwrap_or_else(|p| p.into_inner()) = Some(Arc::clone(host));
    }

    fn count_containing(&self, needle: &str) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .filter(|m| m.contains(needle))
            .count()
    }
}

impl LogSink for PipelineSink {
    fn emit(&self, severity: Severity, message: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(message.to_string());
        let host = self
            .host
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone();
        if let Some(host) = host {
            let _ = host.emit_server_log(severity, message);
        }
    }
}

#[test]
fn recursion_guard_marker_fires_once_through_log_pipeline() {
    let mut host = SimHost::new(16);
    let sink = Arc::new(PipelineSink::default());
    let registry = Registry::for_host(&host.capabilities());
    let module = HookModule::new(registry, Arc::clone(&sink) as Arc<dyn LogSink>);
    module.on_load(&mut host).unwrap();

    // Every server log line now loops back through the emit-log interceptor.
    let host = Arc::new(host);
    sink.attach(&host);

    host.emit_server_log(Severity::Warning, "checkpoint starting")
        .unwrap();
    host.emit_server_log(Severity::Warning, "checkpoint complete")
        .unwrap();
    // Firing another point also routes its log line through the pipeline.
    host.fire(PointId::Planner, &planner_args()).unwrap();

    assert_eq!(sink.count_containing("emit-log hook called"), 1);
    assert!(module.guard().is_latched());
}

// The reference scenario: planner delegate-or-default plus index-name
// transform, no previous handlers anywhere.
#[test]
fn reference_scenario_round_trip() {
    let bare = SimHost::new(16).with_index(3, "idx_orders");
    let default_plan = bare.fire(PointId::Planner, &planner_args()).unwrap();

    let mut host = SimHost::new(16).with_index(3, "idx_orders");
    let (module, sink) = module_for(&host);
    module.on_load(&mut host).unwrap();

    assert_eq!(
        host.fire(PointId::Planner, &planner_args()).unwrap(),
        default_plan
    );

    let name = host
        .fire(PointId::IndexName, &HookArgs::IndexName { index_id: 3 })
        .unwrap();
    assert_eq!(name, HookValue::Name("idx_orders".into()));
    assert_eq!(sink.count_containing("index-name hook resolved idx_orders"), 1);

    let err = host
        .fire(PointId::IndexName, &HookArgs::IndexName { index_id: 9 })
        .unwrap_err();
    assert!(matches!(err, HookError::NotFound { index_id: 9 }));

    module.on_unload(&mut host);
    for desc in module.registry().enabled_points() {
        assert!(host.active_handler(desc.id).is_none());
    }
}
