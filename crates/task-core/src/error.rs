use std::fmt;

/// Machine-readable error codes for scripts and agents driving the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    CorruptStore,
    StoreReadFailed,
    StoreWriteFailed,
    LockContention,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::CorruptStore => "E3001",
            Self::StoreReadFailed => "E5001",
            Self::StoreWriteFailed => "E5002",
            Self::LockContention => "E5003",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::CorruptStore => "Task file could not be parsed",
            Self::StoreReadFailed => "Task file read failed",
            Self::StoreWriteFailed => "Task file write failed",
            Self::LockContention => "Lock contention",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to users and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => {
                Some("Fix syntax in the task-cli config.toml (or unset TASK_CLI_CONFIG) and retry.")
            }
            Self::CorruptStore => {
                Some("The unreadable contents were copied to <file>.corrupt; repair or remove it.")
            }
            Self::StoreReadFailed | Self::StoreWriteFailed => {
                Some("Check the task file path, disk space, and permissions.")
            }
            Self::LockContention => Some("Retry after the other `task-cli` process releases its lock."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
