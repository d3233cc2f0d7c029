//! Interface (trait) definitions and the registry that holds them.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// The signature of a single interface function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signature {
    /// Parameter types, rendered as source text
    pub params: Vec<String>,
    /// Return type, rendered as source text
    pub returns: String,
}

impl Signature {
    /// Number of parameters the function takes.
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) -> {}", self.params.join(" "), self.returns)
    }
}

/// A named set of function signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceDefinition {
    pub name: String,
    pub functions: BTreeMap<String, Signature>,
}

impl InterfaceDefinition {
    /// Create an interface with no functions.
    pub fn new(name: impl Into<String>) -> Self {
        InterfaceDefinition {
            name: name.into(),
            functions: BTreeMap::new(),
        }
    }

    /// Add a function signature.
    pub fn with_function(mut self, name: impl Into<String>, signature: Signature) -> Self {
        self.functions.insert(name.into(), signature);
        self
    }
}

/// All interfaces declared in the canonical registry unit.
#[derive(Debug, Clone, Default)]
pub struct InterfaceRegistry {
    /// Id of the registry unit, if one was found
    unit: Option<String>,
    interfaces: BTreeMap<String, InterfaceDefinition>,
    duplicates: Vec<String>,
}

impl InterfaceRegistry {
    /// Create an empty registry owned by the given unit.
    pub fn new(unit: Option<String>) -> Self {
        InterfaceRegistry {
            unit,
            interfaces: BTreeMap::new(),
            duplicates: Vec::new(),
        }
    }

    /// Build a registry from definitions in declaration order.
    ///
    /// The first definition of a name is kept; later ones are recorded as
    /// duplicates.
    pub fn from_definitions(
        unit: Option<String>,
        definitions: impl IntoIterator<Item = InterfaceDefinition>,
    ) -> Self {
        let mut registry = InterfaceRegistry::new(unit);
        for def in definitions {
            registry.insert(def);
        }
        registry
    }

    /// Insert a definition, returning false if the name was already defined.
    pub fn insert(&mut self, def: InterfaceDefinition) -> bool {
        if self.interfaces.contains_key(&def.name) {
            tracing::debug!("duplicate interface definition: {}", def.name);
            self.duplicates.push(def.name);
            return false;
        }
        self.interfaces.insert(def.name.clone(), def);
        true
    }

    /// Get the registry unit id.
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    /// Look up an interface by name.
    pub fn get(&self, name: &str) -> Option<&InterfaceDefinition> {
        self.interfaces.get(name)
    }

    /// Check if an interface is defined.
    pub fn contains(&self, name: &str) -> bool {
        self.interfaces.contains_key(name)
    }

    /// Iterate over interfaces in name order.
    pub fn iter(&self) -> impl Iterator<Item = &InterfaceDefinition> {
        self.interfaces.values()
    }

    /// Names that were declared more than once, in declaration order.
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }
}
