use std::sync::{Arc, RwLock};

use crate::capability::{
    CapabilityGate, EXECUTE_ONCE_SINCE, HostCapabilities, INDEX_NAME_SINCE, READ_ONLY_TREE_SINCE,
    SignatureRev,
};
use crate::error::{HookError, Result};
use crate::host::Handler;
use crate::point::{ContractKind, PointId};

#[derive(Clone, Default)]
enum SlotState {
    #[default]
    Vacant,
    Captured(Option<Handler>),
}

/// Shared per-point cell holding whatever handler was active immediately
/// before install ("empty" meaning the host default was active).
///
/// Write-once per install cycle, read-only on every invocation, and never
/// drained by teardown; teardown idempotency follows from that.
#[derive(Clone, Default)]
pub struct Slot {
    state: Arc<RwLock<SlotState>>,
}

impl Slot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the pre-install handler. Returns false if the slot was already
    /// captured in this process, which means a second install cycle ran.
    pub(crate) fn capture(&self, prev: Option<Handler>) -> bool {
        let mut state = match self.state.write() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        match *state {
            SlotState::Captured(_) => false,
            SlotState::Vacant => {
                *state = SlotState::Captured(prev);
                true
            }
        }
    }

    /// The previous handler to chain to, if one was captured.
    pub fn previous(&self) -> Option<Handler> {
        match &*self.read() {
            SlotState::Captured(prev) => prev.clone(),
            SlotState::Vacant => None,
        }
    }

    /// The captured value as teardown must write it back: `None` when
    /// install never captured this slot, `Some(captured)` otherwise.
    pub fn snapshot(&self) -> Option<Option<Handler>> {
        match &*self.read() {
            SlotState::Captured(prev) => Some(prev.clone()),
            SlotState::Vacant => None,
        }
    }

    pub fn is_captured(&self) -> bool {
        matches!(&*self.read(), SlotState::Captured(_))
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, SlotState> {
        match self.state.read() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Static description of one interceptable point plus its slot.
#[derive(Clone)]
pub struct PointDescriptor {
    pub id: PointId,
    pub contract: ContractKind,
    pub gate: CapabilityGate,
    pub signature: SignatureRev,
    slot: Slot,
}

impl PointDescriptor {
    pub fn slot(&self) -> &Slot {
        &self.slot
    }
}

/// Every point this build knows how to intercept, in install order.
fn catalog() -> Vec<(PointId, ContractKind, CapabilityGate)> {
    use CapabilityGate::{Always, MinVersion};
    use ContractKind::{DelegateOrDefault, DelegateThenObserve, TransformResult, Veto};

    vec![
        (PointId::ShmemStartup, DelegateThenObserve, Always),
        (PointId::Planner, DelegateOrDefault, Always),
        (PointId::ProcessUtility, DelegateOrDefault, Always),
        (PointId::ExecutorStart, DelegateOrDefault, Always),
        (PointId::ExecutorRun, DelegateOrDefault, Always),
        (PointId::ExecutorEnd, DelegateOrDefault, Always),
        (PointId::ExecutorCheckPerms, Veto, Always),
        (PointId::ExecutorFinish, DelegateOrDefault, Always),
        (PointId::NeedsFunctionHook, DelegateOrDefault, Always),
        (PointId::FunctionManager, DelegateOrDefault, Always),
        (PointId::CheckPassword, DelegateOrDefault, Always),
        (PointId::ClientAuth, DelegateThenObserve, Always),
        (PointId::EmitLog, DelegateThenObserve, Always),
        (
            PointId::IndexName,
            TransformResult,
            MinVersion(INDEX_NAME_SINCE),
        ),
    ]
}

fn resolve_signature(id: PointId, caps: &HostCapabilities) -> SignatureRev {
    match id {
        PointId::ExecutorRun if caps.version >= EXECUTE_ONCE_SINCE => SignatureRev::V2,
        PointId::ProcessUtility if caps.version >= READ_ONLY_TREE_SINCE => SignatureRev::V2,
        _ => SignatureRev::V1,
    }
}

/// Ordered set of points enabled for one host.
///
/// Built once at module load; read-only thereafter except for each point's
/// slot. Iteration order is catalog order, fixed for reproducible
/// diagnostics.
pub struct Registry {
    points: Vec<PointDescriptor>,
}

impl Registry {
    /// Build the registry for a host: apply each capability gate and resolve
    /// every version-split signature exactly once.
    pub fn for_host(caps: &HostCapabilities) -> Self {
        let points = catalog()
            .into_iter()
            .filter(|(_, _, gate)| gate.admits(caps))
            .map(|(id, contract, gate)| PointDescriptor {
                id,
                contract,
                gate,
                signature: resolve_signature(id, caps),
                slot: Slot::new(),
            })
            .collect();
        Self { points }
    }

    /// Static contract and capability information for one point.
    pub fn describe(&self, id: PointId) -> Result<&PointDescriptor> {
        self.points
            .iter()
            .find(|d| d.id == id)
            .ok_or(HookError::UnknownPoint(id))
    }

    /// Enabled points in fixed catalog order. Restartable.
    pub fn enabled_points(&self) -> impl Iterator<Item = &PointDescriptor> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
