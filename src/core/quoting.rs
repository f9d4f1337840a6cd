// src/core/quoting.rs

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum QuoteError {
    #[error("Argument contains a NUL byte and cannot be quoted for the shell.")]
    Nul,
}

/// Serializes an argument vector into a single shell command string.
///
/// Every word is quoted so that the interpreter's word-splitting reproduces
/// it exactly: whitespace, quotes, newlines and globbing metacharacters all
/// pass through as authored. The joined string is what gets handed to the
/// interpreter as the sole operand of its `-c` flag.
///
/// The one thing no POSIX quoting can carry is a NUL byte; that is the only
/// failure mode.
pub fn join_for_shell<S: AsRef<str>>(words: &[S]) -> Result<String, QuoteError> {
    let mut quoted = Vec::with_capacity(words.len());
    for word in words {
        let q = shlex::try_quote(word.as_ref()).map_err(|_| QuoteError::Nul)?;
        quoted.push(q.into_owned());
    }
    Ok(quoted.join(" "))
}
