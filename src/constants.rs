// src/constants.rs

use std::time::Duration;

/// Interpreter used when a shell is requested without naming one.
pub const DEFAULT_SHELL: &str = "/bin/bash";

/// Flag that makes the interpreter evaluate the next argument as a command string.
pub const SHELL_COMMAND_FLAG: &str = "-c";

/// How often the executor polls a running child while racing a timeout.
pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(25);
