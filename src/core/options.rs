// src/core/options.rs

use crate::constants::DEFAULT_SHELL;
use crate::models::{Input, ShellSpec, StdioSpec};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("stdin and input may not both be used.")]
    InputWithStdin,
    #[error("stdout and stderr may not be used with capture_output.")]
    CaptureWithStreams,
    #[error("logfile may not be used with capture_output.")]
    CaptureWithLogfile,
    #[error("expect and popen may not be used together.")]
    ExpectWithPopen,
    #[error("expect and shell may not be used together.")]
    ExpectWithShell,
}

/// One option field as supplied at call time.
///
/// `Unset` falls back to the instance-level default, `UseDefault` is the
/// explicit opt-out that resolves to the built-in default no matter what the
/// instance says, and `Value` wins outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionValue<T> {
    Unset,
    UseDefault,
    Value(T),
}

// Manual impl: the derive would demand `T: Default` even though `Unset`
// carries no value.
impl<T> Default for OptionValue<T> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<T: Clone> OptionValue<T> {
    /// Resolves against an instance default whose built-in default is "absent".
    fn resolve(self, instance: &Option<T>) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            Self::UseDefault => None,
            Self::Unset => instance.clone(),
        }
    }

    /// Resolves against an instance default with an explicit built-in default.
    fn resolve_or(self, instance: &T, builtin: T) -> T {
        match self {
            Self::Value(v) => v,
            Self::UseDefault => builtin,
            Self::Unset => instance.clone(),
        }
    }
}

/// Names one recognized option, for the "reset to built-in default" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKey {
    Input,
    CaptureOutput,
    Check,
    Logfile,
    Timeout,
    Expect,
    Popen,
    Shell,
    Text,
    Stdin,
    Stdout,
    Stderr,
}

/// The per-call option layer, all fields three-state.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub input: OptionValue<Input>,
    pub capture_output: OptionValue<bool>,
    pub check: OptionValue<bool>,
    pub logfile: OptionValue<PathBuf>,
    pub timeout: OptionValue<Duration>,
    pub expect: OptionValue<bool>,
    pub popen: OptionValue<bool>,
    pub shell: OptionValue<ShellSpec>,
    pub text: OptionValue<bool>,
    pub stdin: OptionValue<StdioSpec>,
    pub stdout: OptionValue<StdioSpec>,
    pub stderr: OptionValue<StdioSpec>,
    // Pass-through extras, appended over the instance-level ones.
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
}

impl CallOptions {
    /// Applies the sentinel to one named option: the merged value becomes the
    /// built-in default for that option, ignoring any instance-level setting.
    pub fn reset_to_builtin(&mut self, key: OptionKey) {
        match key {
            OptionKey::Input => self.input = OptionValue::UseDefault,
            OptionKey::CaptureOutput => self.capture_output = OptionValue::UseDefault,
            OptionKey::Check => self.check = OptionValue::UseDefault,
            OptionKey::Logfile => self.logfile = OptionValue::UseDefault,
            OptionKey::Timeout => self.timeout = OptionValue::UseDefault,
            OptionKey::Expect => self.expect = OptionValue::UseDefault,
            OptionKey::Popen => self.popen = OptionValue::UseDefault,
            OptionKey::Shell => self.shell = OptionValue::UseDefault,
            OptionKey::Text => self.text = OptionValue::UseDefault,
            OptionKey::Stdin => self.stdin = OptionValue::UseDefault,
            OptionKey::Stdout => self.stdout = OptionValue::UseDefault,
            OptionKey::Stderr => self.stderr = OptionValue::UseDefault,
        }
    }
}

/// The instance-level option layer, set once on the session.
#[derive(Debug, Clone, Default)]
pub struct SessionDefaults {
    pub input: Option<Input>,
    pub capture_output: bool,
    pub check: bool,
    pub logfile: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub expect: bool,
    pub popen: bool,
    pub shell: ShellSpec,
    pub text: bool,
    pub stdin: Option<StdioSpec>,
    pub stdout: Option<StdioSpec>,
    pub stderr: Option<StdioSpec>,
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
}

/// The merged option set for one invocation. Transient: rebuilt fresh for
/// every call, never persisted.
#[derive(Debug, Clone, Default)]
pub struct EffectiveOptions {
    pub input: Option<Input>,
    pub capture_output: bool,
    pub check: bool,
    pub logfile: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub expect: bool,
    pub popen: bool,
    /// The resolved interpreter argv, `None` when no shell is requested.
    pub shell: Option<Vec<String>>,
    pub text: bool,
    pub stdin: StdioSpec,
    pub stdout: StdioSpec,
    pub stderr: StdioSpec,
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
}

/// Merges the call-time layer over the instance layer and validates the
/// result. Every mutual-exclusion violation is raised here, before any
/// process is launched.
pub fn merge(call: CallOptions, defaults: &SessionDefaults) -> Result<EffectiveOptions, ConfigError> {
    let input = call.input.resolve(&defaults.input);
    let capture_output = call.capture_output.resolve_or(&defaults.capture_output, false);
    let check = call.check.resolve_or(&defaults.check, false);
    let logfile = call.logfile.resolve(&defaults.logfile);
    let timeout = call.timeout.resolve(&defaults.timeout);
    let expect = call.expect.resolve_or(&defaults.expect, false);
    let popen = call.popen.resolve_or(&defaults.popen, false);
    let shell_spec = call.shell.resolve_or(&defaults.shell, ShellSpec::Off);
    let mut text = call.text.resolve_or(&defaults.text, false);
    let stdin = call.stdin.resolve(&defaults.stdin);
    let stdout = call.stdout.resolve(&defaults.stdout);
    let stderr = call.stderr.resolve(&defaults.stderr);

    if input.is_some() && stdin.is_some() {
        return Err(ConfigError::InputWithStdin);
    }
    if capture_output && (stdout.is_some() || stderr.is_some()) {
        return Err(ConfigError::CaptureWithStreams);
    }
    if capture_output && logfile.is_some() {
        return Err(ConfigError::CaptureWithLogfile);
    }
    if expect && popen {
        return Err(ConfigError::ExpectWithPopen);
    }
    let shell = resolve_shell(shell_spec);
    if expect && shell.is_some() {
        return Err(ConfigError::ExpectWithShell);
    }

    // The payload type always decides text/binary mode when input is present.
    if let Some(payload) = &input {
        text = payload.is_text();
    }

    let mut env = defaults.env.clone();
    env.extend(call.env);
    let cwd = call.cwd.or_else(|| defaults.cwd.clone());

    Ok(EffectiveOptions {
        input,
        capture_output,
        check,
        logfile,
        timeout,
        expect,
        popen,
        shell,
        text,
        stdin: stdin.unwrap_or_default(),
        stdout: stdout.unwrap_or_default(),
        stderr: stderr.unwrap_or_default(),
        env,
        cwd,
    })
}

fn resolve_shell(spec: ShellSpec) -> Option<Vec<String>> {
    match spec {
        ShellSpec::Off => None,
        ShellSpec::Default => Some(vec![DEFAULT_SHELL.to_string()]),
        ShellSpec::Program(program) => Some(vec![program]),
        ShellSpec::Argv(argv) => Some(argv),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults_with_capture() -> SessionDefaults {
        SessionDefaults {
            capture_output: true,
            check: true,
            timeout: Some(Duration::from_secs(30)),
            ..Default::default()
        }
    }

    // --- Layering ---

    #[test]
    fn test_all_unset_returns_instance_defaults() {
        let merged = merge(CallOptions::default(), &defaults_with_capture()).unwrap();
        assert!(merged.capture_output);
        assert!(merged.check);
        assert_eq!(merged.timeout, Some(Duration::from_secs(30)));
        assert!(merged.shell.is_none());
    }

    #[test]
    fn test_sentinel_overrides_instance_default() {
        let mut call = CallOptions::default();
        call.reset_to_builtin(OptionKey::CaptureOutput);
        call.reset_to_builtin(OptionKey::Timeout);

        let merged = merge(call, &defaults_with_capture()).unwrap();
        assert!(!merged.capture_output);
        assert_eq!(merged.timeout, None);
        // Untouched fields still follow the instance.
        assert!(merged.check);
    }

    #[test]
    fn test_call_value_wins_outright() {
        let call = CallOptions {
            check: OptionValue::Value(false),
            timeout: OptionValue::Value(Duration::from_secs(1)),
            ..Default::default()
        };
        let merged = merge(call, &defaults_with_capture()).unwrap();
        assert!(!merged.check);
        assert_eq!(merged.timeout, Some(Duration::from_secs(1)));
    }

    // --- Mutual exclusions ---

    #[test]
    fn test_input_and_stdin_conflict() {
        let call = CallOptions {
            input: OptionValue::Value(Input::from("data")),
            stdin: OptionValue::Value(StdioSpec::Null),
            ..Default::default()
        };
        let err = merge(call, &SessionDefaults::default()).unwrap_err();
        assert_eq!(err, ConfigError::InputWithStdin);
    }

    #[test]
    fn test_capture_and_explicit_streams_conflict() {
        let call = CallOptions {
            capture_output: OptionValue::Value(true),
            stdout: OptionValue::Value(StdioSpec::Null),
            ..Default::default()
        };
        let err = merge(call, &SessionDefaults::default()).unwrap_err();
        assert_eq!(err, ConfigError::CaptureWithStreams);
    }

    #[test]
    fn test_capture_and_logfile_conflict() {
        let call = CallOptions {
            capture_output: OptionValue::Value(true),
            logfile: OptionValue::Value(PathBuf::from("/tmp/out.log")),
            ..Default::default()
        };
        let err = merge(call, &SessionDefaults::default()).unwrap_err();
        assert_eq!(err, ConfigError::CaptureWithLogfile);
    }

    #[test]
    fn test_expect_and_popen_conflict() {
        let call = CallOptions {
            expect: OptionValue::Value(true),
            popen: OptionValue::Value(true),
            ..Default::default()
        };
        let err = merge(call, &SessionDefaults::default()).unwrap_err();
        assert_eq!(err, ConfigError::ExpectWithPopen);
    }

    #[test]
    fn test_expect_and_shell_conflict() {
        let call = CallOptions {
            expect: OptionValue::Value(true),
            shell: OptionValue::Value(ShellSpec::Default),
            ..Default::default()
        };
        let err = merge(call, &SessionDefaults::default()).unwrap_err();
        assert_eq!(err, ConfigError::ExpectWithShell);
    }

    #[test]
    fn test_conflict_can_come_from_instance_layer() {
        // A call-time input over an instance-wired stdin must still be caught.
        let defaults = SessionDefaults {
            stdin: Some(StdioSpec::Piped),
            ..Default::default()
        };
        let call = CallOptions {
            input: OptionValue::Value(Input::from("data")),
            ..Default::default()
        };
        assert_eq!(merge(call, &defaults).unwrap_err(), ConfigError::InputWithStdin);
    }

    // --- Inference and shell resolution ---

    #[test]
    fn test_text_input_forces_text_mode() {
        let call = CallOptions {
            input: OptionValue::Value(Input::from("hello")),
            text: OptionValue::Value(false),
            ..Default::default()
        };
        let merged = merge(call, &SessionDefaults::default()).unwrap();
        assert!(merged.text);
    }

    #[test]
    fn test_bytes_input_forces_binary_mode() {
        let call = CallOptions {
            input: OptionValue::Value(Input::from(vec![0xde, 0xad])),
            text: OptionValue::Value(true),
            ..Default::default()
        };
        let merged = merge(call, &SessionDefaults::default()).unwrap();
        assert!(!merged.text);
    }

    #[test]
    fn test_shell_default_selects_fixed_interpreter() {
        let call = CallOptions {
            shell: OptionValue::Value(ShellSpec::Default),
            ..Default::default()
        };
        let merged = merge(call, &SessionDefaults::default()).unwrap();
        assert_eq!(merged.shell, Some(vec![DEFAULT_SHELL.to_string()]));
    }

    #[test]
    fn test_shell_off_clears_instance_selection() {
        let defaults = SessionDefaults {
            shell: ShellSpec::Program("/bin/dash".to_string()),
            ..Default::default()
        };
        let call = CallOptions {
            shell: OptionValue::Value(ShellSpec::Off),
            ..Default::default()
        };
        let merged = merge(call, &defaults).unwrap();
        assert!(merged.shell.is_none());
    }

    #[test]
    fn test_shell_argv_is_used_verbatim() {
        let argv = vec!["/bin/bash".to_string(), "-O".to_string(), "extglob".to_string()];
        let call = CallOptions {
            shell: OptionValue::Value(ShellSpec::Argv(argv.clone())),
            ..Default::default()
        };
        let merged = merge(call, &SessionDefaults::default()).unwrap();
        assert_eq!(merged.shell, Some(argv));
    }

    #[test]
    fn test_env_layers_append_and_cwd_overrides() {
        let defaults = SessionDefaults {
            env: vec![("A".to_string(), "1".to_string())],
            cwd: Some(PathBuf::from("/var")),
            ..Default::default()
        };
        let call = CallOptions {
            env: vec![("B".to_string(), "2".to_string())],
            cwd: Some(PathBuf::from("/tmp")),
            ..Default::default()
        };
        let merged = merge(call, &defaults).unwrap();
        assert_eq!(merged.env.len(), 2);
        assert_eq!(merged.cwd, Some(PathBuf::from("/tmp")));
    }
}
