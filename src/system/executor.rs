// src/system/executor.rs

use crate::constants::{SHELL_COMMAND_FLAG, WAIT_POLL_INTERVAL};
use crate::core::options::EffectiveOptions;
use crate::core::path_index::PathIndex;
use crate::core::quoting::{self, QuoteError};
use crate::models::{ExecResult, ResolvedInvocation};
use scopeguard::{ScopeGuard, guard};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("Command '{0}' does not exist on the search path.")]
    CommandNotFound(String),
    #[error("Command '{command}' could not be executed: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Command '{command}' exited with a non-zero error code.")]
    NonZeroExit {
        command: String,
        code: Option<i32>,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    },
    #[error("Command '{command}' did not finish within {limit:?}.")]
    Timeout {
        command: String,
        limit: Duration,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    },
    #[error("Command could not be quoted for the shell: {0}")]
    Quote(#[from] QuoteError),
    #[error("I/O error while running command: {0}")]
    Io(#[from] std::io::Error),
}

/// The unknown-command guard: when no shell is requested, a command that is
/// neither on the search path nor alias-expanded must fail fast, before any
/// launch is attempted. Shell mode passes everything through and lets the
/// interpreter decide.
pub fn ensure_resolvable(
    resolved: &ResolvedInvocation,
    opts: &EffectiveOptions,
    index: &PathIndex,
) -> Result<(), ExecError> {
    if opts.shell.is_none() && !resolved.alias_applied && !index.contains(&resolved.command) {
        return Err(ExecError::CommandNotFound(resolved.command.clone()));
    }
    Ok(())
}

/// Runs the resolved invocation to completion and collects its outcome.
///
/// Fails with `Timeout` when the deadline elapses (the child is killed first
/// and any output it already produced is attached), with `NonZeroExit` when
/// checking is enabled and the child fails, and with `Launch` when the OS
/// refuses to start the program at all.
pub fn execute(
    resolved: &ResolvedInvocation,
    opts: &EffectiveOptions,
    index: &PathIndex,
) -> Result<ExecResult, ExecError> {
    ensure_resolvable(resolved, opts, index)?;
    let argv = final_argv(resolved, opts)?;
    let mut command = build_command(&argv, resolved, opts)?;

    log::debug!("Spawning '{}': {:?}", resolved.command, argv);
    let child = command.spawn().map_err(|e| ExecError::Launch {
        command: resolved.command.clone(),
        source: e,
    })?;
    communicate(child, resolved, opts, argv)
}

/// Launches the resolved invocation and hands the live child back to the
/// caller without waiting (the detached mode). Stdio wiring, the shell
/// splice and the unknown-command guard all apply; timeouts and checking do
/// not, since the caller owns the child from here on.
pub fn spawn_detached(
    resolved: &ResolvedInvocation,
    opts: &EffectiveOptions,
    index: &PathIndex,
) -> Result<Child, ExecError> {
    ensure_resolvable(resolved, opts, index)?;
    let argv = final_argv(resolved, opts)?;
    let mut command = build_command(&argv, resolved, opts)?;

    log::debug!("Spawning detached '{}': {:?}", resolved.command, argv);
    command.spawn().map_err(|e| ExecError::Launch {
        command: resolved.command.clone(),
        source: e,
    })
}

/// Produces the argument vector that actually reaches the OS.
///
/// In shell mode the interpreter argv (one element, or interpreter plus
/// fixed leading flags) is spliced in front, followed by `-c` and the quoted
/// command string; the reported program becomes the first element of the
/// interpreter argv. Without a shell the resolved argv passes through.
fn final_argv(
    resolved: &ResolvedInvocation,
    opts: &EffectiveOptions,
) -> Result<Vec<String>, ExecError> {
    match &opts.shell {
        Some(interpreter) => {
            let line = quoting::join_for_shell(&resolved.argv)?;
            let mut argv = interpreter.clone();
            argv.push(SHELL_COMMAND_FLAG.to_string());
            argv.push(line);
            Ok(argv)
        }
        None => Ok(resolved.argv.clone()),
    }
}

fn build_command(
    argv: &[String],
    resolved: &ResolvedInvocation,
    opts: &EffectiveOptions,
) -> Result<Command, ExecError> {
    let Some((program, args)) = argv.split_first() else {
        return Err(ExecError::CommandNotFound(resolved.command.clone()));
    };

    let mut command = Command::new(program);
    command.args(args);
    command.envs(opts.env.iter().map(|(k, v)| (k, v)));
    if let Some(dir) = &opts.cwd {
        command.current_dir(dir);
    }

    if opts.input.is_some() {
        command.stdin(Stdio::piped());
    } else {
        command.stdin(opts.stdin.to_stdio());
    }

    if let Some(path) = &opts.logfile {
        // Scoped acquisition: the handles are duplicated into the child and
        // the parent's copies close when `command` is dropped, on every path.
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        command.stdout(Stdio::from(file.try_clone()?));
        command.stderr(Stdio::from(file));
    } else if opts.capture_output {
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
    } else {
        command.stdout(opts.stdout.to_stdio());
        command.stderr(opts.stderr.to_stdio());
    }

    Ok(command)
}

/// Streams stdin to the child and stdout/stderr back, racing the timeout.
fn communicate(
    child: Child,
    resolved: &ResolvedInvocation,
    opts: &EffectiveOptions,
    argv: Vec<String>,
) -> Result<ExecResult, ExecError> {
    // The guard reaps the child on any early exit so no orphan survives an
    // error or unwind; the normal and timeout paths defuse it after reaping
    // the child themselves.
    let mut child = guard(child, |mut child| {
        if let Err(e) = child.kill() {
            log::warn!("Failed to kill child process {}: {}", child.id(), e);
        }
        child.wait().ok();
    });

    let writer = match (child.stdin.take(), &opts.input) {
        (Some(mut sink), Some(payload)) => {
            let bytes = payload.as_bytes().to_vec();
            Some(thread::spawn(move || {
                if let Err(e) = sink.write_all(&bytes) {
                    // A child that exits without draining its stdin is normal.
                    if e.kind() != ErrorKind::BrokenPipe {
                        log::debug!("Writing to child stdin failed: {}", e);
                    }
                }
            }))
        }
        _ => None,
    };
    let stdout_reader = child.stdout.take().map(spawn_reader);
    let stderr_reader = child.stderr.take().map(spawn_reader);

    let deadline = opts.timeout.map(|limit| Instant::now() + limit);
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if let (Some(deadline), Some(limit)) = (deadline, opts.timeout) {
                    if Instant::now() >= deadline {
                        if let Err(e) = child.kill() {
                            log::warn!("Failed to kill child process {}: {}", child.id(), e);
                        }
                        child.wait().ok();
                        let _ = ScopeGuard::into_inner(child);
                        if let Some(handle) = writer {
                            handle.join().ok();
                        }
                        // Killing the child closed its pipes; drain whatever
                        // it managed to produce before surfacing the timeout.
                        let stdout = join_reader(stdout_reader);
                        let stderr = join_reader(stderr_reader);
                        return Err(ExecError::Timeout {
                            command: resolved.command.clone(),
                            limit,
                            stdout,
                            stderr,
                        });
                    }
                }
                thread::sleep(WAIT_POLL_INTERVAL);
            }
            Err(e) => return Err(ExecError::Io(e)),
        }
    };
    let _ = ScopeGuard::into_inner(child);

    if let Some(handle) = writer {
        handle.join().ok();
    }
    let stdout = join_reader(stdout_reader);
    let stderr = join_reader(stderr_reader);

    let code = status.code();
    if opts.check && !status.success() {
        return Err(ExecError::NonZeroExit {
            command: resolved.command.clone(),
            code,
            stdout,
            stderr,
        });
    }

    Ok(ExecResult {
        argv,
        code,
        stdout,
        stderr,
        text: opts.text,
    })
}

fn spawn_reader<R: Read + Send + 'static>(mut stream: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer).ok();
        buffer
    })
}

fn join_reader(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .map(|h| h.join().unwrap_or_default())
        .unwrap_or_default()
}
