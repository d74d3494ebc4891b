//! Failure-text classification against the dependency rule table.

use crate::core::rules::DEPENDENCY_RULES;

/// Map a failure trace to the package that provides the missing tool.
///
/// Scans [`DEPENDENCY_RULES`] in declared order and returns the first
/// package whose fragment occurs in `text`. Each fragment is also tried
/// with `not found` widened to `command not found`, which is how some
/// shells report an absent binary.
///
/// Returns `None` when no rule matches; the failure is then not a known
/// missing dependency and cannot be healed.
pub fn classify(text: &str) -> Option<&'static str> {
    for rule in DEPENDENCY_RULES {
        if text.contains(rule.fragment) {
            return Some(rule.package);
        }
        let widened = rule.fragment.replace("not found", "command not found");
        if text.contains(&widened) {
            return Some(rule.package);
        }
    }
    None
}
