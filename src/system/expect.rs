// src/system/expect.rs

use crate::models::ResolvedInvocation;
use thiserror::Error;

/// The live pseudo-terminal session handed back to the caller in interactive
/// mode, supporting read/send against the child.
pub use expectrl::Session as InteractiveSession;

#[derive(Error, Debug)]
pub enum ExpectError {
    #[error("Could not start interactive session for '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: expectrl::Error,
    },
}

/// Spawns the resolved command on a pseudo-terminal.
///
/// The pty driver consumes a literal command string, so the resolved argv is
/// rendered space-joined. Only reachable when interaction was explicitly
/// requested and no shell was requested alongside it.
pub fn spawn_interactive(resolved: &ResolvedInvocation) -> Result<InteractiveSession, ExpectError> {
    let command_line = resolved.argv.join(" ");
    log::debug!("Starting interactive session: {}", command_line);
    expectrl::spawn(&command_line).map_err(|source| ExpectError::Spawn {
        command: resolved.command.clone(),
        source,
    })
}
