pub mod capability;
pub mod error;
pub mod guard;
pub mod host;
pub mod interceptor;
pub mod lifecycle;
pub mod point;
pub mod registry;
pub mod sink;

// Re-export key types for convenience.
pub use capability::{CapabilityGate, HostCapabilities, HostVersion, SignatureRev};
pub use error::{HookError, Result};
pub use guard::RecursionGuard;
pub use host::{Handler, HookHost, HostDefaults};
pub use interceptor::build_interceptor;
pub use lifecycle::HookModule;
pub use point::{
    AuthStatus, ContractKind, FunctionEvent, HookArgs, HookValue, PasswordKind, PointId,
    ScanDirection,
};
pub use registry::{PointDescriptor, Registry, Slot};
pub use sink::{LogSink, MemorySink, Severity, TracingSink};
