//! User-friendly diagnostic messages.
//!
//! Every reported problem carries its root cause, the units or files
//! involved, and a suggested fix where one exists.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Common suggestion messages for consistent reporting.
pub mod suggestions {
    /// Suggestion when a dependency cycle blocks ordering.
    pub const BREAK_CYCLE: &str =
        "Break the cycle by removing a contract-call? or a depends_on entry";

    /// Suggestion when two units share an id.
    pub const RENAME_UNIT: &str = "Rename one of the files so every unit id is unique";

    /// Suggestion when an interface is declared twice.
    pub const DEDUPE_INTERFACE: &str = "Remove or rename the duplicate define-trait";

    /// Suggestion when a conformance claim names an unknown interface.
    pub const DEFINE_INTERFACE: &str =
        "Define the trait in the interface registry or fix the reference";

    /// Suggestion when an impl-trait uses a full path instead of an alias.
    pub const USE_ALIAS: &str = "Import the trait with (use-trait <alias> <path>) and implement the alias";

    /// Suggestion when a unit is not listed in any manifest.
    pub const LIST_UNIT: &str = "Add an entry for the unit to a deployment manifest";

    /// Suggestion when no configuration file exists.
    pub const NO_CONFIG: &str = "help: Create a Berth.toml to override the default layout";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Note,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
    /// Line within `location`, 1-based
    pub line: Option<usize>,
}

impl Diagnostic {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
            line: None,
        }
    }

    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Create a new note diagnostic.
    pub fn note(message: impl Into<String>) -> Self {
        Self::new(Severity::Note, message)
    }

    /// Change the severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Add a line number within the location.
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = if color {
            match self.severity {
                Severity::Error => "\x1b[1;31merror\x1b[0m",
                Severity::Warning => "\x1b[1;33mwarning\x1b[0m",
                Severity::Note => "\x1b[1;36mnote\x1b[0m",
            }
        } else {
            match self.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
                Severity::Note => "note",
            }
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref path) = self.location {
            match self.line {
                Some(line) => output.push_str(&format!("  --> {}:{}\n", path.display(), line)),
                None => output.push_str(&format!("  --> {}\n", path.display())),
            }
        }

        for ctx in &self.context {
            output.push_str(&format!("  = {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            if self.suggestions.len() == 1 {
                output.push_str(&format!("{}: {}\n", help_prefix, self.suggestions[0]));
            } else {
                output.push_str(&format!("{}: consider:\n", help_prefix));
                for (i, suggestion) in self.suggestions.iter().enumerate() {
                    output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
                }
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
