use std::sync::Arc;

use crate::error::{HookError, Result};
use crate::guard::RecursionGuard;
use crate::host::{Handler, HostDefaults};
use crate::point::{AuthStatus, ContractKind, HookArgs, HookValue, PointId};
use crate::registry::{PointDescriptor, Slot};
use crate::sink::{LogSink, Severity};

/// Build the handler published at one point.
///
/// The closure owns clones of the point's slot, the sink, and the recursion
/// guard; dispatch is shared across all points, so per-point variation is
/// reduced to the log line and the contract arm.
pub fn build_interceptor(
    desc: &PointDescriptor,
    sink: Arc<dyn LogSink>,
    guard: Arc<RecursionGuard>,
) -> Handler {
    let id = desc.id;
    let contract = desc.contract;
    let slot = desc.slot().clone();
    Arc::new(move |host, args| dispatch(id, contract, &slot, sink.as_ref(), &guard, host, args))
}

fn dispatch(
    id: PointId,
    contract: ContractKind,
    slot: &Slot,
    sink: &dyn LogSink,
    guard: &RecursionGuard,
    host: &dyn HostDefaults,
    args: &HookArgs,
) -> Result<HookValue> {
    // The emit-log point is re-entered by the host's own log pipeline, so
    // its marker is latched once per process instead of emitted per call.
    // The previous log handler is always forwarded to regardless.
    if id == PointId::EmitLog {
        if guard.latch() {
            sink.emit(Severity::Warning, "emit-log hook called");
        }
        return match slot.previous() {
            Some(prev) => prev(host, args),
            None => Ok(HookValue::Unit),
        };
    }

    match contract {
        ContractKind::DelegateOrDefault => {
            sink.emit(log_severity(id), &log_line(id, args));
            match slot.previous() {
                Some(prev) => prev(host, args),
                None => host.run_default(id, args),
            }
        }
        ContractKind::DelegateThenObserve => {
            // An earlier-registered observer may assume it sees the event
            // first; defer to it before logging.
            let value = match slot.previous() {
                Some(prev) => prev(host, args)?,
                None => HookValue::Unit,
            };
            sink.emit(log_severity(id), &log_line(id, args));
            Ok(value)
        }
        ContractKind::Veto => {
            sink.emit(log_severity(id), &log_line(id, args));
            Ok(HookValue::Allowed(true))
        }
        ContractKind::TransformResult => {
            let &HookArgs::IndexName { index_id } = args else {
                return Err(HookError::UnknownPoint(id));
            };
            let delegated = match slot.previous() {
                Some(prev) => match prev(host, args)? {
                    HookValue::Name(name) => Some(name),
                    HookValue::MaybeName(name) => name,
                    _ => None,
                },
                None => None,
            };
            let name = match delegated {
                Some(name) => name,
                None => host
                    .lookup_index_name(index_id)
                    .ok_or(HookError::NotFound { index_id })?,
            };
            sink.emit(Severity::Warning, &format!("index-name hook resolved {name}"));
            Ok(HookValue::Name(name))
        }
    }
}

fn log_severity(id: PointId) -> Severity {
    if id == PointId::ExecutorStart {
        Severity::Debug
    } else {
        Severity::Warning
    }
}

fn log_line(id: PointId, args: &HookArgs) -> String {
    match args {
        HookArgs::ClientAuth {
            status: AuthStatus::Ok,
            ..
        } => format!("{id} hook called OK"),
        HookArgs::ClientAuth {
            status: AuthStatus::Error,
            ..
        } => format!("{id} hook status KO"),
        _ => format!("{id} hook called"),
    }
}
