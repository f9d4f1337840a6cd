// src/session.rs

use crate::core::options::{
    self, CallOptions, ConfigError, EffectiveOptions, OptionKey, OptionValue, SessionDefaults,
};
use crate::core::path_index::PathIndex;
use crate::core::resolver::{self, ResolveError};
use crate::models::{ExecResult, Input, ResolvedInvocation, ShellSpec, StdioSpec};
use crate::system::executor::{self, ExecError};
use crate::system::expect::{self, ExpectError, InteractiveSession};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::process::Child;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Command resolution failed: {0}")]
    Resolve(#[from] ResolveError),
    #[error("Invalid option combination: {0}")]
    Config(#[from] ConfigError),
    #[error("Execution failed: {0}")]
    Exec(#[from] ExecError),
    #[error("Interactive session failed: {0}")]
    Expect(#[from] ExpectError),
}

/// The façade that ties the index, the alias table and the instance-level
/// option defaults together.
///
/// A session is built once (scanning the search path is the expensive part)
/// and then hands out [`Invocation`] builders:
///
/// ```no_run
/// use shellkit::Session;
///
/// let sh = Session::new();
/// let result = sh.command(["mkfs", "ext4"]).arg("/dev/sdb1").run();
/// ```
///
/// Sessions are single-threaded by design: each invocation builder owns its
/// own chain and options, so nothing leaks between calls, but the session
/// itself is not synchronized.
#[derive(Debug, Clone)]
pub struct Session {
    index: PathIndex,
    aliases: HashMap<String, Vec<String>>,
    defaults: SessionDefaults,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Creates a session, scanning the search path for executables.
    pub fn new() -> Self {
        Self::with_index(PathIndex::scan())
    }

    /// Creates a session around a prebuilt index. This is how callers reuse
    /// one scan across sessions, or pin the resolvable command set.
    pub fn with_index(index: PathIndex) -> Self {
        Self {
            index,
            aliases: HashMap::new(),
            defaults: SessionDefaults::default(),
        }
    }

    /// Replaces the instance-level option defaults.
    pub fn with_defaults(mut self, defaults: SessionDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Replaces the whole alias table.
    pub fn with_aliases(mut self, aliases: HashMap<String, Vec<String>>) -> Self {
        self.aliases = aliases;
        self
    }

    /// Registers (or replaces) one alias: whenever resolution lands on
    /// `command`, `replacement` substitutes for it as the leading argument
    /// vector and call arguments append after it.
    pub fn set_alias<S, I, A>(&mut self, command: S, replacement: I)
    where
        S: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.aliases.insert(
            command.into(),
            replacement.into_iter().map(Into::into).collect(),
        );
    }

    pub fn index(&self) -> &PathIndex {
        &self.index
    }

    pub fn defaults(&self) -> &SessionDefaults {
        &self.defaults
    }

    /// Starts an invocation from a command path: one segment per property
    /// access the caller would have written (`["mkfs", "ext4"]`). The
    /// returned builder owns the chain; dropping it without a finisher
    /// abandons the invocation with no effect on the session.
    pub fn command<I, S>(&self, segments: I) -> Invocation<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Invocation {
            session: self,
            chain: segments.into_iter().map(Into::into).collect(),
            args: Vec::new(),
            opts: CallOptions::default(),
        }
    }

    /// The direct-run path: no chain, the first element of `argv` is the
    /// command name.
    pub fn run<I, S>(&self, argv: I) -> Result<ExecResult, SessionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command(std::iter::empty::<String>()).args(argv).run()
    }
}

/// One invocation in the making: the recorded command path, the positional
/// arguments and the call-time option layer. Consumed by exactly one
/// finisher.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    session: &'a Session,
    chain: Vec<String>,
    args: Vec<String>,
    opts: CallOptions,
}

/// What a [`Invocation::dispatch`] call produced, depending on the merged
/// expect/popen flags.
pub enum ExecOutcome {
    Completed(ExecResult),
    Spawned(Child),
    Interactive(InteractiveSession),
}

impl fmt::Debug for ExecOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed(result) => f.debug_tuple("Completed").field(result).finish(),
            Self::Spawned(child) => f.debug_tuple("Spawned").field(child).finish(),
            Self::Interactive(_) => f.debug_tuple("Interactive").finish(),
        }
    }
}

impl Invocation<'_> {
    // --- Arguments ---

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    // --- Options ---

    pub fn input<V: Into<Input>>(mut self, input: V) -> Self {
        self.opts.input = OptionValue::Value(input.into());
        self
    }

    pub fn capture_output(mut self, capture: bool) -> Self {
        self.opts.capture_output = OptionValue::Value(capture);
        self
    }

    pub fn check(mut self, check: bool) -> Self {
        self.opts.check = OptionValue::Value(check);
        self
    }

    pub fn logfile<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.opts.logfile = OptionValue::Value(path.into());
        self
    }

    pub fn timeout(mut self, limit: Duration) -> Self {
        self.opts.timeout = OptionValue::Value(limit);
        self
    }

    pub fn expect(mut self, expect: bool) -> Self {
        self.opts.expect = OptionValue::Value(expect);
        self
    }

    pub fn popen(mut self, popen: bool) -> Self {
        self.opts.popen = OptionValue::Value(popen);
        self
    }

    pub fn shell(mut self, spec: ShellSpec) -> Self {
        self.opts.shell = OptionValue::Value(spec);
        self
    }

    pub fn text(mut self, text: bool) -> Self {
        self.opts.text = OptionValue::Value(text);
        self
    }

    pub fn stdin(mut self, spec: StdioSpec) -> Self {
        self.opts.stdin = OptionValue::Value(spec);
        self
    }

    pub fn stdout(mut self, spec: StdioSpec) -> Self {
        self.opts.stdout = OptionValue::Value(spec);
        self
    }

    pub fn stderr(mut self, spec: StdioSpec) -> Self {
        self.opts.stderr = OptionValue::Value(spec);
        self
    }

    pub fn env<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.opts.env.push((key.into(), value.into()));
        self
    }

    pub fn cwd<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.opts.cwd = Some(dir.into());
        self
    }

    /// The explicit "reset to built-in default" sentinel for one option:
    /// the merged value ignores the instance-level default for this call.
    pub fn use_builtin_default(mut self, key: OptionKey) -> Self {
        self.opts.reset_to_builtin(key);
        self
    }

    // --- Finishers ---

    /// Resolves, merges and runs the invocation to completion.
    pub fn run(mut self) -> Result<ExecResult, SessionError> {
        self.opts.expect = OptionValue::Value(false);
        self.opts.popen = OptionValue::Value(false);
        let (resolved, opts) = self.prepare()?;
        Ok(executor::execute(&resolved, &opts, &self.session.index)?)
    }

    /// Launches the invocation and returns the live child without waiting.
    pub fn spawn(mut self) -> Result<Child, SessionError> {
        self.opts.popen = OptionValue::Value(true);
        self.opts.expect = OptionValue::Value(false);
        let (resolved, opts) = self.prepare()?;
        Ok(executor::spawn_detached(&resolved, &opts, &self.session.index)?)
    }

    /// Starts the invocation on a pseudo-terminal and returns the
    /// interactive session handle.
    pub fn interact(mut self) -> Result<InteractiveSession, SessionError> {
        self.opts.expect = OptionValue::Value(true);
        self.opts.popen = OptionValue::Value(false);
        let (resolved, opts) = self.prepare()?;
        executor::ensure_resolvable(&resolved, &opts, &self.session.index)?;
        Ok(expect::spawn_interactive(&resolved)?)
    }

    /// Routes on the merged expect/popen flags, for sessions whose defaults
    /// select a mode. `run`/`spawn`/`interact` are the typed shortcuts; this
    /// is the dynamic one.
    pub fn dispatch(self) -> Result<ExecOutcome, SessionError> {
        let (resolved, opts) = self.prepare()?;
        let index = &self.session.index;
        if opts.expect {
            executor::ensure_resolvable(&resolved, &opts, index)?;
            Ok(ExecOutcome::Interactive(expect::spawn_interactive(&resolved)?))
        } else if opts.popen {
            Ok(ExecOutcome::Spawned(executor::spawn_detached(&resolved, &opts, index)?))
        } else {
            Ok(ExecOutcome::Completed(executor::execute(&resolved, &opts, index)?))
        }
    }

    /// Resolution + option merge + alias expansion, shared by every finisher.
    fn prepare(&self) -> Result<(ResolvedInvocation, EffectiveOptions), SessionError> {
        let (name, args) = resolver::resolve(&self.chain, &self.args, &self.session.index)?;
        let opts = options::merge(self.opts.clone(), &self.session.defaults)?;

        let (argv, alias_applied) = match self.session.aliases.get(&name) {
            Some(replacement) => {
                log::trace!("Alias '{}' expands to {:?}.", name, replacement);
                (
                    replacement.iter().cloned().chain(args).collect(),
                    true,
                )
            }
            None => (std::iter::once(name.clone()).chain(args).collect(), false),
        };

        Ok((
            ResolvedInvocation {
                command: name,
                argv,
                alias_applied,
            },
            opts,
        ))
    }
}
