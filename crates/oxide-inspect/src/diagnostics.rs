//! Severity-tagged findings accumulated while inspecting one statement.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static BRACKETED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(error|warn|notice|normal|osc)\]").expect("valid severity tag regex")
});

/// Severity of a finding. Ordered from harmless to blocking.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Nothing to report.
    #[default]
    Normal,
    /// Advisory.
    Notice,
    /// Should be looked at before execution.
    Warn,
    /// Blocks execution.
    Error,
}

impl Severity {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Notice => "notice",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "notice" => Ok(Self::Notice),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

/// One finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,
    /// Message, possibly already carrying a `[tag]` prefix.
    pub message: String,
}

/// Ordered findings for one statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends a finding. Empty messages are ignored.
    pub fn add(&mut self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        if message.is_empty() {
            return;
        }
        self.entries.push(Diagnostic { severity, message });
    }

    /// Appends every finding of `other`.
    pub fn extend(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    /// Worst severity, `Normal` when empty.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.entries
            .iter()
            .map(|d| d.severity)
            .max()
            .unwrap_or_default()
    }

    /// All messages joined by newlines, each tagged with its severity
    /// unless it already starts with a bracketed tag.
    #[must_use]
    pub fn message(&self) -> String {
        self.entries
            .iter()
            .map(|d| {
                if BRACKETED.is_match(&d.message) {
                    d.message.clone()
                } else {
                    format!("[{}]{}", d.severity, d.message)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Returns true when nothing was reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The findings in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Returns true when any message contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|d| d.message.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(Severity::Normal < Severity::Notice);
        assert!(Severity::Notice < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
        assert_eq!("WARN".parse::<Severity>().unwrap(), Severity::Warn);
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn test_empty() {
        let d = Diagnostics::new();
        assert!(d.is_empty());
        assert_eq!(d.severity(), Severity::Normal);
        assert_eq!(d.message(), "");
    }

    #[test]
    fn test_worst_severity_wins() {
        let mut d = Diagnostics::new();
        d.add(Severity::Notice, "table exist_tb_1 is missing a comment");
        d.add(Severity::Error, "column v3 not exist");
        d.add(Severity::Warn, "table t exist");
        assert_eq!(d.severity(), Severity::Error);
        assert_eq!(
            d.message(),
            "[notice]table exist_tb_1 is missing a comment\n[error]column v3 not exist\n[warn]table t exist"
        );
    }

    #[test]
    fn test_pretagged_message_kept() {
        let mut d = Diagnostics::new();
        d.add(
            Severity::Notice,
            "[osc]table size is 20 MB, consider an online schema change tool",
        );
        d.add(Severity::Notice, "[error]already tagged");
        assert_eq!(
            d.message(),
            "[osc]table size is 20 MB, consider an online schema change tool\n[error]already tagged"
        );
    }

    #[test]
    fn test_empty_message_ignored() {
        let mut d = Diagnostics::new();
        d.add(Severity::Error, "");
        assert!(d.is_empty());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Severity::Notice).unwrap();
        assert_eq!(json, "\"notice\"");
    }
}
