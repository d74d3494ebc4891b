//! Known dependency-error fragments and the packages that resolve them.

use serde::Serialize;

/// One recognizable error fragment and the package that fixes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DependencyRule {
    /// Substring to look for in a failed command's output.
    pub fragment: &'static str,
    /// Package to install when the fragment matches.
    pub package: &'static str,
}

/// Ordered rule table, scanned top to bottom.
///
/// Order is part of the contract: when a failure trace contains more than
/// one fragment, the first rule listed here wins. Package names are valid
/// for both apt and Homebrew.
pub const DEPENDENCY_RULES: &[DependencyRule] = &[
    DependencyRule {
        fragment: "autoconf: not found",
        package: "autoconf",
    },
    DependencyRule {
        fragment: "msgfmt: not found",
        package: "gettext",
    },
    DependencyRule {
        fragment: "missing fswatch",
        package: "fswatch",
    },
    DependencyRule {
        fragment: "missing inotifywait",
        package: "inotify-tools",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    /// Every fragment maps to exactly one package; duplicates in the table
    /// would make later rules unreachable.
    #[test]
    fn fragments_are_unique() {
        for (index, rule) in DEPENDENCY_RULES.iter().enumerate() {
            for other in &DEPENDENCY_RULES[index + 1..] {
                assert_ne!(rule.fragment, other.fragment);
            }
        }
    }

    /// Rules serialize with stable field names (the `rules --json` contract).
    #[test]
    fn rules_serialize_with_stable_fields() {
        let json = serde_json::to_value(DEPENDENCY_RULES).unwrap();
        assert_eq!(json[0]["fragment"], "autoconf: not found");
        assert_eq!(json[0]["package"], "autoconf");
    }
}
