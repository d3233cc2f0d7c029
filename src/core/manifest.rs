//! Deployment manifest parsing and in-place editing.
//!
//! A deployment manifest is a TOML file with an active section (default
//! `[contracts.<name>]`) and an optional disabled section (default
//! `[disabled.<name>]`). Each entry carries at least a `path`, optionally an
//! `address` and a `depends_on` list, plus arbitrary extra keys.
//!
//! The document is kept as a `toml_edit` tree. Entries are only ever moved,
//! never rebuilt, so every byte of an entry survives a rewrite.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use toml_edit::{Array, DocumentMut, Item, Table, Value};

/// Errors loading a deployment manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read manifest: {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest: {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml_edit::TomlError,
    },

    #[error("section `{section}` in {} is not a table", path.display())]
    InvalidSection { path: PathBuf, section: String },

    #[error(
        "cannot move inline entry `{name}` after a `[{section}.*]` table in {}",
        path.display()
    )]
    MixedLayout {
        path: PathBuf,
        section: String,
        name: String,
    },
}

/// Names of the active and disabled sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ManifestSections {
    pub active_section: String,
    pub disabled_section: String,
}

impl Default for ManifestSections {
    fn default() -> Self {
        ManifestSections {
            active_section: "contracts".to_string(),
            disabled_section: "disabled".to_string(),
        }
    }
}

/// Which partition of a manifest an entry lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Active,
    Disabled,
}

/// A unit listing in a manifest.
///
/// This is a read-only view; the entry's payload stays in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub name: String,
    pub disabled: bool,
    pub depends_on: Vec<String>,
    pub path: Option<String>,
    pub address: Option<String>,
}

impl ManifestEntry {
    pub fn partition(&self) -> Partition {
        if self.disabled {
            Partition::Disabled
        } else {
            Partition::Active
        }
    }
}

/// A deployment manifest loaded from disk.
#[derive(Debug, Clone)]
pub struct DeploymentManifest {
    path: PathBuf,
    doc: DocumentMut,
    sections: ManifestSections,
    entries: Vec<ManifestEntry>,
}

impl DeploymentManifest {
    /// Load a manifest from a file path.
    pub fn load(path: &Path, sections: &ManifestSections) -> Result<Self, ManifestError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ManifestError::NotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(source) => {
                return Err(ManifestError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        Self::parse(&content, path, sections)
    }

    /// Parse manifest content.
    pub fn parse(
        content: &str,
        path: &Path,
        sections: &ManifestSections,
    ) -> Result<Self, ManifestError> {
        let doc: DocumentMut = content.parse().map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let entries = read_entries(&doc, sections, path)?;

        Ok(DeploymentManifest {
            path: path.to_path_buf(),
            doc,
            sections: sections.clone(),
            entries,
        })
    }

    /// Get the manifest's file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries, active section first, each in file order.
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Entries of one partition in file order.
    pub fn partition(&self, partition: Partition) -> impl Iterator<Item = &ManifestEntry> {
        self.entries
            .iter()
            .filter(move |e| e.partition() == partition)
    }

    /// Look up an entry by name (active section first).
    pub fn get(&self, name: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Check if the disabled section is present in the document.
    pub fn has_disabled_section(&self) -> bool {
        self.doc.contains_key(&self.sections.disabled_section)
    }

    fn section_name(&self, partition: Partition) -> &str {
        match partition {
            Partition::Active => &self.sections.active_section,
            Partition::Disabled => &self.sections.disabled_section,
        }
    }

    /// Reorder the entries of one partition by rank.
    ///
    /// Names are ranked by their index in `ordered`; names missing from it
    /// keep their relative order after all ranked names. Returns true if the
    /// document changed.
    ///
    /// Inline entries always render under the section header, ahead of any
    /// entry with its own header. An order that would put an inline entry
    /// after such an entry is rejected and the document is left untouched.
    pub fn reorder(&mut self, partition: Partition, ordered: &[String]) -> Result<bool, ManifestError> {
        let section = self.section_name(partition).to_string();
        let rank: HashMap<&str, usize> = ordered
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        let rank_of = |key: &str| rank.get(key).copied().unwrap_or(usize::MAX);

        let Some(layout) = rendered_entries(&self.doc, &section) else {
            return Ok(false);
        };
        let current: Vec<&str> = layout.iter().map(|(name, _)| name.as_str()).collect();
        let mut desired = current.clone();
        desired.sort_by_key(|k| rank_of(k));
        if desired == current {
            return Ok(false);
        }

        let has_header: HashMap<&str, bool> = layout
            .iter()
            .map(|(name, header)| (name.as_str(), *header))
            .collect();
        if let Some(first) = desired.iter().position(|name| has_header[name]) {
            if let Some(name) = desired[first..].iter().find(|name| !has_header[*name]) {
                return Err(ManifestError::MixedLayout {
                    path: self.path.clone(),
                    section,
                    name: name.to_string(),
                });
            }
        }
        let desired: Vec<String> = desired.into_iter().map(str::to_string).collect();

        match self.doc.get_mut(&section) {
            Some(Item::Table(table)) => {
                table.sort_values_by(|k1, _, k2, _| rank_of(k1.get()).cmp(&rank_of(k2.get())));
            }
            Some(Item::Value(Value::InlineTable(table))) => {
                table.sort_values_by(|k1, _, k2, _| rank_of(k1.get()).cmp(&rank_of(k2.get())));
            }
            _ => return Ok(false),
        }

        renumber_positions(&mut self.doc, &section, &desired);
        self.refresh();
        Ok(true)
    }

    /// Remove the disabled section if it has no entries.
    ///
    /// Returns true if the section was removed.
    pub fn remove_empty_disabled_section(&mut self) -> bool {
        let section = self.sections.disabled_section.clone();
        let empty = self
            .doc
            .get(&section)
            .and_then(Item::as_table_like)
            .map(|t| t.is_empty())
            .unwrap_or(false);

        if empty {
            self.doc.remove(&section);
            self.refresh();
        }
        empty
    }

    /// Get a mutable handle to an entry's `depends_on` array.
    pub fn depends_on_mut(&mut self, partition: Partition, name: &str) -> Option<&mut Array> {
        let section = self.section_name(partition).to_string();
        self.doc
            .get_mut(&section)?
            .as_table_like_mut()?
            .get_mut(name)?
            .as_table_like_mut()?
            .get_mut("depends_on")?
            .as_array_mut()
    }

    /// Remove an entry's `depends_on` key entirely.
    pub fn remove_depends_on(&mut self, partition: Partition, name: &str) -> bool {
        let section = self.section_name(partition).to_string();
        let removed = self
            .doc
            .get_mut(&section)
            .and_then(Item::as_table_like_mut)
            .and_then(|t| t.get_mut(name))
            .and_then(Item::as_table_like_mut)
            .and_then(|entry| entry.remove("depends_on"))
            .is_some();
        if removed {
            self.refresh();
        }
        removed
    }

    /// Re-derive the entry views after the document was edited.
    pub fn refresh(&mut self) {
        match read_entries(&self.doc, &self.sections, &self.path) {
            Ok(entries) => self.entries = entries,
            Err(e) => tracing::warn!("failed to refresh manifest entries: {}", e),
        }
    }

    /// Render the document.
    pub fn render(&self) -> String {
        self.doc.to_string()
    }
}

fn read_entries(
    doc: &DocumentMut,
    sections: &ManifestSections,
    path: &Path,
) -> Result<Vec<ManifestEntry>, ManifestError> {
    let mut entries = Vec::new();

    for (section, disabled) in [
        (&sections.active_section, false),
        (&sections.disabled_section, true),
    ] {
        let Some(item) = doc.get(section) else {
            continue;
        };
        let table = item
            .as_table_like()
            .ok_or_else(|| ManifestError::InvalidSection {
                path: path.to_path_buf(),
                section: section.clone(),
            })?;

        for (name, value) in table.iter() {
            let attrs = value.as_table_like();
            let string_attr = |key: &str| {
                attrs
                    .and_then(|t| t.get(key))
                    .and_then(Item::as_str)
                    .map(str::to_string)
            };
            let depends_on = attrs
                .and_then(|t| t.get("depends_on"))
                .and_then(Item::as_array)
                .map(|arr| arr.iter().filter_map(|v| v.as_str()).map(str::to_string).collect())
                .unwrap_or_default();

            if attrs.is_none() {
                tracing::debug!("entry `{}` in {} has no attributes", name, path.display());
            }

            entries.push(ManifestEntry {
                name: name.to_string(),
                disabled,
                depends_on,
                path: string_attr("path"),
                address: string_attr("address"),
            });
        }
    }

    Ok(entries)
}

/// The position of the first header an item renders, if it has one.
fn header_position(item: &Item) -> Option<usize> {
    match item {
        Item::Table(table) if table.is_dotted() => None,
        Item::Table(table) if table.is_implicit() => table
            .iter()
            .filter_map(|(_, child)| header_position(child))
            .min(),
        Item::Table(table) => table.position(),
        Item::ArrayOfTables(array) => array.iter().filter_map(Table::position).min(),
        _ => None,
    }
}

/// Entries of `section` in the order they render, each with whether it
/// has a header of its own.
fn rendered_entries(doc: &DocumentMut, section: &str) -> Option<Vec<(String, bool)>> {
    match doc.get(section)? {
        Item::Table(table) => {
            let body = table.position().unwrap_or(0);
            let mut keyed: Vec<_> = table
                .iter()
                .enumerate()
                .map(|(i, (key, item))| {
                    let header = header_position(item);
                    ((header.unwrap_or(body), header.is_some(), i), key.to_string())
                })
                .collect();
            keyed.sort_by_key(|(sort_key, _)| *sort_key);
            Some(
                keyed
                    .into_iter()
                    .map(|((_, header, _), name)| (name, header))
                    .collect(),
            )
        }
        Item::Value(Value::InlineTable(table)) => {
            Some(table.iter().map(|(key, _)| (key.to_string(), false)).collect())
        }
        _ => None,
    }
}

/// One step of a key path; the index selects an element of an array of
/// tables.
type Segment = (String, Option<usize>);

/// A header table in the document and its key path.
struct PositionedTable {
    position: usize,
    path: Vec<Segment>,
}

fn collect_tables(table: &Table, path: &mut Vec<Segment>, out: &mut Vec<PositionedTable>) {
    for (key, item) in table.iter() {
        match item {
            Item::Table(child) => {
                path.push((key.to_string(), None));
                if !child.is_implicit() && !child.is_dotted() {
                    if let Some(position) = child.position() {
                        out.push(PositionedTable {
                            position,
                            path: path.clone(),
                        });
                    }
                }
                collect_tables(child, path, out);
                path.pop();
            }
            Item::ArrayOfTables(array) => {
                for (index, child) in array.iter().enumerate() {
                    path.push((key.to_string(), Some(index)));
                    if let Some(position) = child.position() {
                        out.push(PositionedTable {
                            position,
                            path: path.clone(),
                        });
                    }
                    collect_tables(child, path, out);
                    path.pop();
                }
            }
            _ => {}
        }
    }
}

fn table_at_mut<'a>(root: &'a mut Table, path: &[Segment]) -> Option<&'a mut Table> {
    let mut table = root;
    for (key, index) in path {
        let item = table.get_mut(key)?;
        table = match index {
            None => item.as_table_mut()?,
            Some(i) => item.as_array_of_tables_mut()?.get_mut(*i)?,
        };
    }
    Some(table)
}

/// Permute header positions so that the entries of `section` render in
/// `desired` order.
///
/// Each entry occupies the slot of its first header (its own or, for an
/// implicit entry table, its first child's). All headers an entry owns move
/// together. Every other header, `[[array]]` elements included, keeps its
/// slot.
fn renumber_positions(doc: &mut DocumentMut, section: &str, desired: &[String]) {
    let mut tables = Vec::new();
    collect_tables(doc.as_table(), &mut Vec::new(), &mut tables);
    if tables.is_empty() {
        return;
    }
    tables.sort_by_key(|t| t.position);
    let base = tables[0].position;

    let owner = |t: &PositionedTable| -> Option<String> {
        (t.path.len() >= 2 && t.path[0].0 == section).then(|| t.path[1].0.clone())
    };

    let mut owned: HashMap<String, Vec<Vec<Segment>>> = HashMap::new();
    for t in &tables {
        if let Some(entry) = owner(t) {
            owned.entry(entry).or_default().push(t.path.clone());
        }
    }
    let mut blocks = desired.iter().filter_map(|name| owned.get(name));

    let mut sequence: Vec<Vec<Segment>> = Vec::with_capacity(tables.len());
    let mut seen_owners: Vec<String> = Vec::new();
    for t in &tables {
        match owner(t) {
            None => sequence.push(t.path.clone()),
            Some(entry) => {
                if seen_owners.contains(&entry) {
                    continue;
                }
                seen_owners.push(entry);
                if let Some(block) = blocks.next() {
                    sequence.extend(block.iter().cloned());
                }
            }
        }
    }

    let root = doc.as_table_mut();
    for (offset, path) in sequence.iter().enumerate() {
        if let Some(table) = table_at_mut(root, path) {
            table.set_position(base + offset);
        }
    }
}
