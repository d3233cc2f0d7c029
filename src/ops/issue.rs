//! Findings reported by `berth check`.

use std::fmt;
use std::path::PathBuf;

use crate::source::IndexIssue;
use crate::util::diagnostic::{suggestions, Diagnostic, Severity};

/// What was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    DuplicateUnit {
        id: String,
        paths: Vec<PathBuf>,
    },
    SourceUnreadable {
        id: String,
        error: String,
    },
    DuplicateInterface {
        name: String,
    },
    UnresolvedInterface {
        unit: String,
        interface: String,
    },
    ExternalInterface {
        unit: String,
        reference: String,
    },
    MissingFunction {
        unit: String,
        interface: String,
        function: String,
    },
    ArityMismatch {
        unit: String,
        interface: String,
        function: String,
        expected: usize,
        found: usize,
    },
    /// Conformance claimed without a `use-trait` alias
    AliasRequired {
        unit: String,
        reference: String,
    },
    /// A `use-trait` alias that points outside the registry
    AliasOutsideRegistry {
        unit: String,
        alias: String,
        reference: String,
    },
    DynamicCall {
        unit: String,
        target: String,
    },
    /// A unit no manifest lists
    UnlistedUnit {
        unit: String,
    },
    /// A manifest entry whose source path does not exist
    MissingSource {
        entry: String,
        path: String,
    },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::DuplicateUnit { id, paths } => {
                write!(f, "unit id `{}` is defined by {} files", id, paths.len())
            }
            Finding::SourceUnreadable { id, error } => {
                write!(f, "could not read unit `{}`: {}", id, error)
            }
            Finding::DuplicateInterface { name } => {
                write!(f, "interface `{}` is declared more than once", name)
            }
            Finding::UnresolvedInterface { unit, interface } => write!(
                f,
                "`{}` implements `{}`, which the interface registry does not declare",
                unit, interface
            ),
            Finding::ExternalInterface { unit, reference } => write!(
                f,
                "`{}` implements external interface `{}`; not checked locally",
                unit, reference
            ),
            Finding::MissingFunction {
                unit,
                interface,
                function,
            } => write!(
                f,
                "`{}` implements `{}` but does not define `{}`",
                unit, interface, function
            ),
            Finding::ArityMismatch {
                unit,
                interface,
                function,
                expected,
                found,
            } => write!(
                f,
                "`{}` defines `{}` with {} parameter(s); `{}` expects {}",
                unit, function, found, interface, expected
            ),
            Finding::AliasRequired { unit, reference } => write!(
                f,
                "`{}` implements `{}` without a use-trait alias",
                unit, reference
            ),
            Finding::AliasOutsideRegistry {
                unit,
                alias,
                reference,
            } => write!(
                f,
                "`{}` binds alias `{}` to `{}`, outside the interface registry",
                unit, alias, reference
            ),
            Finding::DynamicCall { unit, target } => {
                write!(f, "`{}` calls a dynamic target `{}`", unit, target)
            }
            Finding::UnlistedUnit { unit } => {
                write!(f, "unit `{}` is not listed in any manifest", unit)
            }
            Finding::MissingSource { entry, path } => {
                write!(f, "manifest entry `{}` points at missing file `{}`", entry, path)
            }
        }
    }
}

/// A finding with its severity and location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub finding: Finding,
    pub severity: Severity,
    pub location: Option<PathBuf>,
    pub line: Option<usize>,
}

impl Issue {
    pub fn new(finding: Finding, severity: Severity) -> Self {
        Issue {
            finding,
            severity,
            location: None,
            line: None,
        }
    }

    pub fn error(finding: Finding) -> Self {
        Self::new(finding, Severity::Error)
    }

    pub fn warning(finding: Finding) -> Self {
        Self::new(finding, Severity::Warning)
    }

    pub fn note(finding: Finding) -> Self {
        Self::new(finding, Severity::Note)
    }

    pub fn at(mut self, path: impl Into<PathBuf>, line: Option<usize>) -> Self {
        self.location = Some(path.into());
        self.line = line;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.finding.to_string()).with_severity(self.severity);
        if let Some(path) = &self.location {
            diag = diag.with_location(path);
        }
        if let Some(line) = self.line {
            diag = diag.with_line(line);
        }

        match &self.finding {
            Finding::DuplicateUnit { paths, .. } => {
                for path in paths {
                    diag = diag.with_context(format!("defined in {}", path.display()));
                }
                diag.with_suggestion(suggestions::RENAME_UNIT)
            }
            Finding::DuplicateInterface { .. } => diag.with_suggestion(suggestions::DEDUPE_INTERFACE),
            Finding::UnresolvedInterface { .. } => diag.with_suggestion(suggestions::DEFINE_INTERFACE),
            Finding::AliasRequired { .. } => diag.with_suggestion(suggestions::USE_ALIAS),
            Finding::UnlistedUnit { .. } => diag.with_suggestion(suggestions::LIST_UNIT),
            _ => diag,
        }
    }
}

impl From<&IndexIssue> for Issue {
    fn from(issue: &IndexIssue) -> Self {
        match issue {
            IndexIssue::DuplicateUnit { id, paths } => Issue::error(Finding::DuplicateUnit {
                id: id.clone(),
                paths: paths.clone(),
            }),
            IndexIssue::SourceUnreadable { id, path, error } => Issue::warning(Finding::SourceUnreadable {
                id: id.clone(),
                error: error.clone(),
            })
            .at(path, None),
        }
    }
}

/// Count errors and warnings.
pub fn tally(issues: &[Issue]) -> (usize, usize) {
    issues.iter().fold((0, 0), |(errors, warnings), issue| match issue.severity {
        Severity::Error => (errors + 1, warnings),
        Severity::Warning => (errors, warnings + 1),
        Severity::Note => (errors, warnings),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_carries_location_and_suggestion() {
        let issue = Issue::error(Finding::UnresolvedInterface {
            unit: "X".into(),
            interface: "foo".into(),
        })
        .at("contracts/X.clar", Some(3));

        let diag = issue.to_diagnostic();
        assert!(diag.is_error());
        assert!(diag.message.contains("`X`"));
        assert!(diag.message.contains("`foo`"));
        assert_eq!(diag.line, Some(3));
        assert_eq!(diag.suggestions, vec![suggestions::DEFINE_INTERFACE]);
    }

    #[test]
    fn test_tally() {
        let issues = vec![
            Issue::error(Finding::DuplicateInterface { name: "a".into() }),
            Issue::warning(Finding::UnlistedUnit { unit: "b".into() }),
            Issue::note(Finding::ExternalInterface {
                unit: "c".into(),
                reference: "'SP.x".into(),
            }),
        ];
        assert_eq!(tally(&issues), (1, 1));
    }

    #[test]
    fn test_from_index_issue() {
        let issue = Issue::from(&IndexIssue::DuplicateUnit {
            id: "token".into(),
            paths: vec!["a/token.clar".into(), "b/token.clar".into()],
        });
        assert!(issue.is_error());
        assert_eq!(issue.to_diagnostic().context.len(), 2);
    }
}
