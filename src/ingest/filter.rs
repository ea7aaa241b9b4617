use std::collections::HashSet;

/// Device membership gate.
///
/// Exact string equality against the known identifiers: no case folding and
/// no phone-number canonicalization.
#[must_use]
pub fn is_in_scope(sender: &str, known: &HashSet<String>) -> bool {
    known.contains(sender)
}
