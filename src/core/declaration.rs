//! Declaration records extracted from unit sources.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::core::interface::InterfaceDefinition;

static STANDARD_PRINCIPAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^S[PTMN][0-9A-Z]{24,41}(\.[A-Za-z][A-Za-z0-9_-]*)*$").expect("valid principal regex")
});

/// Check whether text is a principal-qualified reference (`'SP...` or an
/// unquoted standard principal with optional `.name` segments).
pub fn is_principal(text: &str) -> bool {
    text.starts_with('\'') || STANDARD_PRINCIPAL.is_match(text)
}

/// The target of a cross-unit invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "lowercase")]
pub enum InvokeTarget {
    /// A relative reference (`.unit`) naming a unit in this tree
    Local(String),
    /// A principal-qualified reference to a unit deployed elsewhere
    External(String),
    /// A non-literal expression, never resolved
    Dynamic(String),
}

impl InvokeTarget {
    /// The raw reference text as written in the source.
    pub fn raw(&self) -> String {
        match self {
            InvokeTarget::Local(name) => format!(".{}", name),
            InvokeTarget::External(text) | InvokeTarget::Dynamic(text) => text.clone(),
        }
    }
}

impl fmt::Display for InvokeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw())
    }
}

/// A normalized interface reference as written in a use or implements
/// declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceRef {
    /// A bare name; may be an alias bound in the same unit
    Name(String),
    /// A dotted path into a unit of this tree (`.unit.name` or `unit.name`)
    Local { unit: Option<String>, name: String },
    /// A principal-qualified path, kept whole
    External(String),
}

impl InterfaceRef {
    /// Classify reference text.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if is_principal(text) {
            return InterfaceRef::External(text.to_string());
        }

        let path = text.strip_prefix('.').unwrap_or(text);
        let mut segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
        match segments.len() {
            0 => InterfaceRef::Name(text.to_string()),
            1 if !text.starts_with('.') => InterfaceRef::Name(segments[0].to_string()),
            1 => InterfaceRef::Local {
                unit: None,
                name: segments[0].to_string(),
            },
            _ => {
                let name = segments.pop().unwrap_or_default().to_string();
                InterfaceRef::Local {
                    unit: segments.first().map(|s| s.to_string()),
                    name,
                }
            }
        }
    }

    /// The interface name this reference points at.
    ///
    /// External references keep their full text.
    pub fn name(&self) -> &str {
        match self {
            InterfaceRef::Name(name) | InterfaceRef::Local { name, .. } => name,
            InterfaceRef::External(text) => text,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, InterfaceRef::External(_))
    }
}

/// A single declarative statement recognized in a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DeclarationRecord {
    /// An interface declaration (`define-trait`)
    DeclareInterface(InterfaceDefinition),

    /// A local alias bound to an interface (`use-trait`)
    UseInterface { alias: String, interface_ref: String },

    /// A conformance claim (`impl-trait`); the reference may be an alias
    ImplementsInterface { reference: String },

    /// A cross-unit call (`contract-call?`)
    Invokes {
        target: InvokeTarget,
        function: Option<String>,
    },
}

/// A declaration record with its source line (1-based).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub record: DeclarationRecord,
    pub line: usize,
}

impl Declaration {
    pub fn new(record: DeclarationRecord, line: usize) -> Self {
        Declaration { record, line }
    }
}

/// A public or read-only function defined by a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDef {
    pub name: String,
    pub arity: usize,
    pub read_only: bool,
    pub line: usize,
}
