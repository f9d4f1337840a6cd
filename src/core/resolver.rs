// src/core/resolver.rs

use crate::core::path_index::PathIndex;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No command specified to run.")]
    EmptyCommand,
}

/// Resolves a recorded segment chain plus positional call arguments into a
/// command name and its residual argument list.
///
/// The rules, in order:
/// 1. An empty chain promotes the first positional argument to the command
///    name (the direct-run path). No arguments either is an error.
/// 2. A single segment, with underscores normalized to dashes, is the
///    command name.
/// 3. A longer chain is matched against the index from the longest prefix
///    down: for each prefix length the dot-joined candidate is tried first,
///    then the dash-joined one (`["mkfs", "ext4"]` finds either `mkfs.ext4`
///    or `mkfs-ext4`). The first hit wins, and the unmatched trailing
///    segments become leading arguments in their original order. A chain
///    with no matching prefix degrades to "first segment is the command,
///    the rest are arguments" (the same shape as rule 2), and any failure
///    is left to the executor's unknown-command guard.
pub fn resolve(
    chain: &[String],
    args: &[String],
    index: &PathIndex,
) -> Result<(String, Vec<String>), ResolveError> {
    if chain.is_empty() {
        let mut rest = args.iter().cloned();
        let name = rest.next().ok_or(ResolveError::EmptyCommand)?;
        return Ok((name, rest.collect()));
    }

    let normalized: Vec<String> = chain.iter().map(|s| s.replace('_', "-")).collect();

    if normalized.len() > 1 {
        for keep in (2..=normalized.len()).rev() {
            let (head, tail) = normalized.split_at(keep);
            let dotted = head.join(".");
            if index.contains(&dotted) {
                log::trace!("Resolved chain to '{}' ({} trailing args).", dotted, tail.len());
                let rest = tail.iter().chain(args.iter()).cloned().collect();
                return Ok((dotted, rest));
            }
            let dashed = head.join("-");
            if index.contains(&dashed) {
                log::trace!("Resolved chain to '{}' ({} trailing args).", dashed, tail.len());
                let rest = tail.iter().chain(args.iter()).cloned().collect();
                return Ok((dashed, rest));
            }
        }
    }

    // Single segment, or no prefix matched: the first segment is the command
    // and everything else trails into the arguments.
    let name = normalized.first().cloned().unwrap_or_default();
    let rest = normalized
        .iter()
        .skip(1)
        .chain(args.iter())
        .cloned()
        .collect();
    Ok((name, rest))
}
