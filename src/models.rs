// src/models.rs

use std::borrow::Cow;
use std::process::Stdio;

// --- INVOCATION MODELS ---
// These are the value types shared between the resolver, the option merge
// engine and the executor.

/// Payload written to the child's stdin.
///
/// The variant also drives text/binary inference: a `Text` payload forces
/// text mode for the whole invocation, a `Bytes` payload forces binary mode,
/// regardless of any `text` option set elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Text(String),
    Bytes(Vec<u8>),
}

impl Input {
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(s) => s.as_bytes(),
            Self::Bytes(b) => b,
        }
    }
}

impl From<&str> for Input {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Input {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for Input {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<&[u8]> for Input {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

/// The requested shell interpreter for an invocation.
///
/// `Default` selects the fixed default interpreter, `Program` names one
/// verbatim, and `Argv` names an interpreter plus fixed leading flags
/// (e.g. `["/bin/bash", "-O", "extglob"]`). `Off` clears any instance-level
/// selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ShellSpec {
    #[default]
    Off,
    Default,
    Program(String),
    Argv(Vec<String>),
}

/// Explicit wiring for one of the child's standard streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdioSpec {
    #[default]
    Inherit,
    Piped,
    Null,
}

impl StdioSpec {
    pub(crate) fn to_stdio(self) -> Stdio {
        match self {
            Self::Inherit => Stdio::inherit(),
            Self::Piped => Stdio::piped(),
            Self::Null => Stdio::null(),
        }
    }
}

/// The output of command resolution: a logical command name plus the final
/// argument vector (alias replacement already applied). Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInvocation {
    /// The logical command name the resolver settled on.
    pub command: String,
    /// The full argument vector, program first.
    pub argv: Vec<String>,
    /// Whether an alias replaced the command; aliased commands bypass the
    /// executable index in the unknown-command guard.
    pub alias_applied: bool,
}

/// The outcome of one completed invocation, owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    /// The argument vector that was actually launched, after any shell
    /// interpreter splice.
    pub argv: Vec<String>,
    /// The child's exit code. `None` if it was terminated by a signal.
    pub code: Option<i32>,
    /// Captured stdout. Empty unless output capture was requested.
    pub stdout: Vec<u8>,
    /// Captured stderr. Empty unless output capture was requested.
    pub stderr: Vec<u8>,
    /// Whether the invocation ran in text mode.
    pub text: bool,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn stdout_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    pub fn stderr_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }
}
