use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sink::Severity;

/// Identity of an interceptable extension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PointId {
    ShmemStartup,
    Planner,
    ProcessUtility,
    ExecutorStart,
    ExecutorRun,
    ExecutorEnd,
    ExecutorCheckPerms,
    ExecutorFinish,
    NeedsFunctionHook,
    FunctionManager,
    CheckPassword,
    ClientAuth,
    EmitLog,
    IndexName,
}

impl PointId {
    /// Stable name used in log lines and on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ShmemStartup => "shmem-startup",
            Self::Planner => "planner",
            Self::ProcessUtility => "process-utility",
            Self::ExecutorStart => "executor-start",
            Self::ExecutorRun => "executor-run",
            Self::ExecutorEnd => "executor-end",
            Self::ExecutorCheckPerms => "executor-check-perms",
            Self::ExecutorFinish => "executor-finish",
            Self::NeedsFunctionHook => "needs-function-hook",
            Self::FunctionManager => "function-manager",
            Self::CheckPassword => "check-password",
            Self::ClientAuth => "client-auth",
            Self::EmitLog => "emit-log",
            Self::IndexName => "index-name",
        }
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Chaining contract an interceptor applies at a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    /// Forward to the previous handler, or to the host default when none.
    DelegateOrDefault,
    /// Previous handler runs first; this system only observes afterwards.
    DelegateThenObserve,
    /// May refuse an operation. The shipped behavior always allows.
    Veto,
    /// Resolves a value via delegate, then host lookup, or fails.
    TransformResult,
}

/// Direction the executor scans in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanDirection {
    Backward,
    NoMovement,
    Forward,
}

/// Phase reported to the function-manager point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionEvent {
    Start,
    End,
    Abort,
}

/// Outcome the host reports to the client-auth point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    Ok,
    Error,
}

/// Encoding of the credential handed to the check-password point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordKind {
    Plaintext,
    Md5,
    ScramSha256,
}

/// Point-specific callback payloads, one variant per host ABI signature.
///
/// Version-split signatures appear as distinct variants (`ExecutorRun` vs
/// `ExecutorRunOnce`, `ProcessUtility` vs `ProcessUtilityReadOnly`); the
/// registry resolves which one a host speaks when it is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookArgs {
    ShmemStartup,
    Planner {
        query: String,
        cursor_options: i32,
    },
    ProcessUtility {
        statement: String,
    },
    ProcessUtilityReadOnly {
        statement: String,
        read_only_tree: bool,
    },
    ExecutorStart {
        query: String,
        flags: i32,
    },
    ExecutorRun {
        query: String,
        direction: ScanDirection,
        count: u64,
    },
    ExecutorRunOnce {
        query: String,
        direction: ScanDirection,
        count: u64,
        execute_once: bool,
    },
    ExecutorEnd {
        query: String,
    },
    ExecutorCheckPerms {
        tables: Vec<String>,
    },
    ExecutorFinish {
        query: String,
    },
    NeedsFunctionHook {
        function_id: u32,
    },
    FunctionManager {
        event: FunctionEvent,
        function_id: u32,
    },
    CheckPassword {
        username: String,
        shadow_pass: String,
        password_kind: PasswordKind,
        valid_until: Option<String>,
    },
    ClientAuth {
        user: String,
        status: AuthStatus,
    },
    EmitLog {
        severity: Severity,
        message: String,
    },
    IndexName {
        index_id: u32,
    },
}

impl HookArgs {
    /// The point this payload belongs to.
    pub fn point(&self) -> PointId {
        match self {
            Self::ShmemStartup => PointId::ShmemStartup,
            Self::Planner { .. } => PointId::Planner,
            Self::ProcessUtility { .. } | Self::ProcessUtilityReadOnly { .. } => {
                PointId::ProcessUtility
            }
            Self::ExecutorStart { .. } => PointId::ExecutorStart,
            Self::ExecutorRun { .. } | Self::ExecutorRunOnce { .. } => PointId::ExecutorRun,
            Self::ExecutorEnd { .. } => PointId::ExecutorEnd,
            Self::ExecutorCheckPerms { .. } => PointId::ExecutorCheckPerms,
            Self::ExecutorFinish { .. } => PointId::ExecutorFinish,
            Self::NeedsFunctionHook { .. } => PointId::NeedsFunctionHook,
            Self::FunctionManager { .. } => PointId::FunctionManager,
            Self::CheckPassword { .. } => PointId::CheckPassword,
            Self::ClientAuth { .. } => PointId::ClientAuth,
            Self::EmitLog { .. } => PointId::EmitLog,
            Self::IndexName { .. } => PointId::IndexName,
        }
    }
}

/// Point-specific return shapes flowing back to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookValue {
    /// Points the host calls for effect only.
    Unit,
    /// A planning result the host consumes.
    Plan { summary: String },
    /// Boolean verdict (permission checks, needs-function-hook).
    Allowed(bool),
    /// A resolved name, e.g. the final answer of the index-name point.
    Name(String),
    /// A possibly-empty name as produced by a chained delegate.
    MaybeName(Option<String>),
}
