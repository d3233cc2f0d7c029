//! Source tree indexing.
//!
//! Walks the contracts tree and the tests tree, assigns each source file a
//! unit id, and reads every unit in parallel: comments are stripped and the
//! declarative statements extracted. The interface registry unit is parsed
//! into an [`InterfaceRegistry`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use rayon::prelude::*;

use crate::core::declaration::{Declaration, FunctionDef};
use crate::core::interface::InterfaceRegistry;
use crate::core::unit::{Unit, UnitKind};
use crate::source::extract::{extract, extract_functions, interface_definitions};
use crate::source::strip::strip_comments;
use crate::util::fs::files_with_extensions;
use crate::util::GlobalContext;

/// Where to look for unit sources.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub contracts_dir: PathBuf,
    pub tests_dir: PathBuf,
    pub registry_path: PathBuf,
    pub extensions: Vec<String>,
}

impl IndexOptions {
    /// Options derived from the project configuration.
    pub fn from_context(ctx: &GlobalContext) -> Self {
        IndexOptions {
            contracts_dir: ctx.contracts_dir(),
            tests_dir: ctx.tests_dir(),
            registry_path: ctx.registry_path(),
            extensions: ctx.config().sources.extensions.clone(),
        }
    }
}

/// A problem found while indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexIssue {
    /// Two or more files share a unit id; the first path is used
    DuplicateUnit { id: String, paths: Vec<PathBuf> },
    /// A unit's source could not be read; it contributes no declarations
    SourceUnreadable {
        id: String,
        path: PathBuf,
        error: String,
    },
}

/// A unit together with what was extracted from its source.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub unit: Unit,
    pub declarations: Vec<Declaration>,
    pub functions: Vec<FunctionDef>,
}

impl SourceUnit {
    /// Read and extract from source text.
    pub fn from_text(unit: Unit, text: &str) -> Self {
        let stripped = strip_comments(text);
        SourceUnit {
            unit,
            declarations: extract(&stripped),
            functions: extract_functions(&stripped),
        }
    }

    /// A unit whose source yielded nothing.
    pub fn empty(unit: Unit) -> Self {
        SourceUnit {
            unit,
            declarations: Vec::new(),
            functions: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        self.unit.id()
    }
}

/// All units of a project, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct SourceIndex {
    units: BTreeMap<String, SourceUnit>,
    registry: InterfaceRegistry,
    issues: Vec<IndexIssue>,
}

impl SourceIndex {
    /// Index the project described by `opts`.
    pub fn build(opts: &IndexOptions) -> Self {
        let mut candidates: Vec<(PathBuf, UnitKind)> = Vec::new();
        for path in files_with_extensions(&opts.contracts_dir, &opts.extensions) {
            candidates.push((path, UnitKind::Contract));
        }
        for path in files_with_extensions(&opts.tests_dir, &opts.extensions) {
            // The tests tree may be nested in the contracts tree.
            if !candidates.iter().any(|(p, _)| *p == path) {
                candidates.push((path, UnitKind::Test));
            }
        }

        let registry_path = &opts.registry_path;
        match candidates.iter_mut().find(|(p, _)| p == registry_path) {
            Some(entry) => entry.1 = UnitKind::Interface,
            None if registry_path.is_file() => {
                candidates.push((registry_path.clone(), UnitKind::Interface))
            }
            None => tracing::debug!("no interface registry at {}", registry_path.display()),
        }

        let (units, mut issues) = assign_ids(candidates);
        tracing::debug!("indexing {} units", units.len());

        let results: Vec<(SourceUnit, Option<IndexIssue>)> = units
            .into_par_iter()
            .map(read_unit)
            .collect();

        let mut index = SourceIndex::default();
        for (source, issue) in results {
            issues.extend(issue);
            index.units.insert(source.id().to_string(), source);
        }
        index.issues = issues;
        index.registry = index.registry_from_units();
        index
    }

    /// Build an index from in-memory sources.
    ///
    /// Later units with an id already present are reported as duplicates.
    pub fn from_sources<'a>(sources: impl IntoIterator<Item = (Unit, &'a str)>) -> Self {
        let mut index = SourceIndex::default();
        for (unit, text) in sources {
            if let Some(existing) = index.units.get(unit.id()) {
                index.issues.push(IndexIssue::DuplicateUnit {
                    id: unit.id().to_string(),
                    paths: vec![
                        existing.unit.source_path().to_path_buf(),
                        unit.source_path().to_path_buf(),
                    ],
                });
                continue;
            }
            index
                .units
                .insert(unit.id().to_string(), SourceUnit::from_text(unit, text));
        }
        index.registry = index.registry_from_units();
        index
    }

    fn registry_from_units(&self) -> InterfaceRegistry {
        let Some(source) = self
            .units
            .values()
            .find(|s| s.unit.kind() == UnitKind::Interface)
        else {
            return InterfaceRegistry::default();
        };

        let registry = InterfaceRegistry::from_definitions(
            Some(source.id().to_string()),
            interface_definitions(&source.declarations),
        );
        tracing::debug!(
            "registry `{}` declares {} interfaces",
            source.id(),
            registry.len()
        );
        registry
    }

    /// Units in id order.
    pub fn units(&self) -> impl Iterator<Item = &SourceUnit> {
        self.units.values()
    }

    /// Look up a unit by id.
    pub fn get(&self, id: &str) -> Option<&SourceUnit> {
        self.units.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.units.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// The interface registry.
    pub fn registry(&self) -> &InterfaceRegistry {
        &self.registry
    }

    /// Problems found while indexing.
    pub fn issues(&self) -> &[IndexIssue] {
        &self.issues
    }
}

/// Give each candidate file a unit id, flagging collisions.
fn assign_ids(candidates: Vec<(PathBuf, UnitKind)>) -> (Vec<Unit>, Vec<IndexIssue>) {
    let mut by_id: BTreeMap<String, Vec<(PathBuf, UnitKind)>> = BTreeMap::new();
    for (path, kind) in candidates {
        match Unit::id_for_path(&path) {
            Some(id) => by_id.entry(id).or_default().push((path, kind)),
            None => tracing::warn!("skipping source without a file stem: {}", path.display()),
        }
    }

    let mut units = Vec::with_capacity(by_id.len());
    let mut issues = Vec::new();
    for (id, mut found) in by_id {
        if found.len() > 1 {
            tracing::warn!("unit id `{}` is used by {} files", id, found.len());
            issues.push(IndexIssue::DuplicateUnit {
                id: id.clone(),
                paths: found.iter().map(|(p, _)| p.clone()).collect(),
            });
        }
        let (path, kind) = found.swap_remove(0);
        units.push(Unit::new(id, kind, path));
    }
    (units, issues)
}

fn read_unit(unit: Unit) -> (SourceUnit, Option<IndexIssue>) {
    match std::fs::read_to_string(unit.source_path()) {
        Ok(text) => {
            let source = SourceUnit::from_text(unit, &text);
            tracing::debug!(
                "{}: {} declarations, {} functions",
                source.id(),
                source.declarations.len(),
                source.functions.len()
            );
            (source, None)
        }
        Err(e) => {
            tracing::warn!("failed to read {}: {}", unit.source_path().display(), e);
            let issue = IndexIssue::SourceUnreadable {
                id: unit.id().to_string(),
                path: unit.source_path().to_path_buf(),
                error: e.to_string(),
            };
            (SourceUnit::empty(unit), Some(issue))
        }
    }
}
