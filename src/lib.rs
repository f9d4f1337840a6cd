//! Invoke external executables as fluent method chains, resolved against the
//! real search path.
//!
//! The entry point is [`Session`]: it scans `PATH` once, carries instance
//! defaults and aliases, and hands out [`Invocation`] builders whose segment
//! chains resolve to real executable names (`["mkfs", "ext4"]` finds
//! `mkfs.ext4`). Per-call options layer over instance defaults through an
//! explicit three-state [`OptionValue`], and invocations finish as a
//! completed result, a detached child or an interactive pty session.

pub mod constants;
pub mod core;
pub mod models;
pub mod session;
pub mod system;

pub use crate::core::options::{
    CallOptions, ConfigError, EffectiveOptions, OptionKey, OptionValue, SessionDefaults,
};
pub use crate::core::path_index::PathIndex;
pub use crate::core::quoting::QuoteError;
pub use crate::core::resolver::ResolveError;
pub use crate::models::{ExecResult, Input, ResolvedInvocation, ShellSpec, StdioSpec};
pub use crate::session::{ExecOutcome, Invocation, Session, SessionError};
pub use crate::system::executor::ExecError;
pub use crate::system::expect::{ExpectError, InteractiveSession};
