//! Implementation of `berth align`.
//!
//! Rewrites deployment manifests so their listings follow the deployment
//! order. Entries stay in their partition and keep every byte of their
//! payload; only their position changes.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::manifest::{DeploymentManifest, ManifestError, ManifestSections, Partition};
use crate::ops::order::load_manifests;
use crate::order::DeploymentOrder;
use crate::util::fs::write_atomic;

/// Options for align command.
#[derive(Debug, Clone, Default)]
pub struct AlignOptions {
    /// Compute the new listing without writing
    pub dry_run: bool,
}

/// What happened to one manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlignOutcome {
    /// The listing was reordered (and written, unless a dry run)
    Aligned {
        path: PathBuf,
        order: Vec<String>,
        written: bool,
    },
    /// Already in order; the file was not touched
    Unchanged { path: PathBuf },
    /// The manifest does not exist
    Skipped { path: PathBuf },
    /// The manifest could not be read, parsed or written
    Failed { path: PathBuf, error: String },
}

impl AlignOutcome {
    pub fn path(&self) -> &Path {
        match self {
            AlignOutcome::Aligned { path, .. }
            | AlignOutcome::Unchanged { path }
            | AlignOutcome::Skipped { path }
            | AlignOutcome::Failed { path, .. } => path,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, AlignOutcome::Failed { .. })
    }
}

impl fmt::Display for AlignOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignOutcome::Aligned { path, order, .. } => {
                write!(f, "{} ({} entries)", path.display(), order.len())
            }
            AlignOutcome::Unchanged { path } => write!(f, "{} (already aligned)", path.display()),
            AlignOutcome::Skipped { path } => write!(f, "{} (not found)", path.display()),
            AlignOutcome::Failed { path, error } => write!(f, "{}: {}", path.display(), error),
        }
    }
}

fn reorder_partitions(
    manifest: &mut DeploymentManifest,
    order: &DeploymentOrder,
) -> Result<bool, ManifestError> {
    let active = manifest.reorder(Partition::Active, order.names())?;
    let disabled = manifest.reorder(Partition::Disabled, order.names())?;
    Ok(active || disabled)
}

/// Reorder one manifest to follow `order`.
pub fn align_manifest(
    manifest: &mut DeploymentManifest,
    order: &DeploymentOrder,
    opts: &AlignOptions,
) -> AlignOutcome {
    let path = manifest.path().to_path_buf();

    let reordered = match reorder_partitions(manifest, order) {
        Ok(reordered) => reordered,
        Err(e) => {
            tracing::warn!("{}", e);
            return AlignOutcome::Failed {
                path,
                error: e.to_string(),
            };
        }
    };
    let removed = manifest.remove_empty_disabled_section();

    if !(reordered || removed) {
        tracing::debug!("{} already aligned", path.display());
        return AlignOutcome::Unchanged { path };
    }

    let new_order: Vec<String> = manifest.entries().iter().map(|e| e.name.clone()).collect();

    if opts.dry_run {
        return AlignOutcome::Aligned {
            path,
            order: new_order,
            written: false,
        };
    }

    match write_atomic(&path, &manifest.render()) {
        Ok(()) => {
            tracing::info!("aligned {}", path.display());
            AlignOutcome::Aligned {
                path,
                order: new_order,
                written: true,
            }
        }
        Err(e) => {
            tracing::warn!("failed to write {}: {:#}", path.display(), e);
            AlignOutcome::Failed {
                path,
                error: format!("{:#}", e),
            }
        }
    }
}

/// Align each manifest in turn. A failure affects only its own manifest.
pub fn align_manifests(
    paths: &[PathBuf],
    sections: &ManifestSections,
    order: &DeploymentOrder,
    opts: &AlignOptions,
) -> Vec<AlignOutcome> {
    load_manifests(paths, sections)
        .into_iter()
        .map(|(path, loaded)| match loaded {
            Ok(mut manifest) => align_manifest(&mut manifest, order, opts),
            Err(ManifestError::NotFound { .. }) => AlignOutcome::Skipped { path },
            Err(e) => AlignOutcome::Failed {
                path,
                error: e.to_string(),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ProjectFixture;

    const UNORDERED: &str = r#"[project]
name = "protocol"

# deployed last
[contracts.N]
path = "contracts/N.clar"
clarity_version = 2
depends_on = ["O"]

[contracts.M]
path = "contracts/M.clar"   # base
epoch = 2.1

[contracts.O]
path = "contracts/O.clar"
depends_on = ["M"]

[disabled.Z]
path = "contracts/Z.clar"

[disabled.Y]
path = "contracts/Y.clar"
"#;

    fn order(names: &[&str]) -> DeploymentOrder {
        DeploymentOrder::new(names.iter().map(|s| s.to_string()).collect())
    }

    // A header and its body, up to the next blank line.
    fn block<'a>(text: &'a str, header: &str) -> &'a str {
        let start = text.find(header).unwrap();
        let rest = &text[start..];
        let end = rest.find("\n\n").unwrap_or(rest.len());
        &rest[..end]
    }

    #[test]
    fn test_align_preserves_payload_and_partition() {
        let project = ProjectFixture::new().manifest("Clarinet.toml", UNORDERED);
        let path = project.path("Clarinet.toml");
        let outcomes = align_manifests(
            &[path],
            &ManifestSections::default(),
            &order(&["M", "O", "N", "Y", "Z"]),
            &AlignOptions::default(),
        );

        assert!(matches!(
            &outcomes[0],
            AlignOutcome::Aligned { order, written: true, .. } if order == &["M", "O", "N", "Y", "Z"]
        ));

        let aligned = project.read("Clarinet.toml");
        let m = aligned.find("[contracts.M]").unwrap();
        let o = aligned.find("[contracts.O]").unwrap();
        let n = aligned.find("[contracts.N]").unwrap();
        let y = aligned.find("[disabled.Y]").unwrap();
        let z = aligned.find("[disabled.Z]").unwrap();
        assert!(m < o && o < n && n < y && y < z);
        assert!(aligned.starts_with("[project]\nname = \"protocol\"\n"));

        for header in ["[contracts.M]", "[contracts.N]", "[contracts.O]"] {
            assert_eq!(
                block(UNORDERED, header),
                block(&aligned, header),
                "payload of {} changed",
                header
            );
        }
        assert!(aligned.contains("# deployed last\n[contracts.N]"));
    }

    #[test]
    fn test_align_is_idempotent() {
        let project = ProjectFixture::new().manifest("Clarinet.toml", UNORDERED);
        let path = project.path("Clarinet.toml");
        let o = order(&["M", "O", "N", "Y", "Z"]);
        let sections = ManifestSections::default();

        align_manifests(std::slice::from_ref(&path), &sections, &o, &AlignOptions::default());
        let first = project.read("Clarinet.toml");

        let outcomes = align_manifests(std::slice::from_ref(&path), &sections, &o, &AlignOptions::default());
        assert!(matches!(outcomes[0], AlignOutcome::Unchanged { .. }));
        assert_eq!(project.read("Clarinet.toml"), first);
    }

    #[test]
    fn test_dry_run_does_not_write() {
        let project = ProjectFixture::new().manifest("Clarinet.toml", UNORDERED);
        let outcomes = align_manifests(
            &[project.path("Clarinet.toml")],
            &ManifestSections::default(),
            &order(&["M", "O", "N"]),
            &AlignOptions { dry_run: true },
        );
        assert!(matches!(&outcomes[0], AlignOutcome::Aligned { written: false, .. }));
        assert_eq!(project.read("Clarinet.toml"), UNORDERED);
    }

    #[test]
    fn test_names_outside_order_keep_relative_position() {
        let content = "[contracts.c]\npath = \"c\"\n\n[contracts.x]\npath = \"x\"\n\n[contracts.a]\npath = \"a\"\n\n[contracts.w]\npath = \"w\"\n";
        let mut manifest = DeploymentManifest::parse(
            content,
            Path::new("Clarinet.toml"),
            &ManifestSections::default(),
        )
        .unwrap();
        let outcome = align_manifest(&mut manifest, &order(&["a", "c"]), &AlignOptions { dry_run: true });
        assert!(matches!(
            outcome,
            AlignOutcome::Aligned { ref order, .. } if order == &["a", "c", "x", "w"]
        ));
    }

    #[test]
    fn test_empty_disabled_section_removed() {
        let project = ProjectFixture::new().manifest(
            "Clarinet.toml",
            "[contracts.a]\npath = \"a\"\n\n[disabled]\n",
        );
        let outcomes = align_manifests(
            &[project.path("Clarinet.toml")],
            &ManifestSections::default(),
            &order(&["a"]),
            &AlignOptions::default(),
        );
        assert!(matches!(outcomes[0], AlignOutcome::Aligned { .. }));
        assert!(!project.read("Clarinet.toml").contains("[disabled]"));
    }

    #[test]
    fn test_write_failure_is_per_manifest() {
        let project = ProjectFixture::new()
            .file("blocked/keep.txt", "untouched")
            .manifest("Clarinet.toml", "[contracts.b]\npath = \"b\"\n\n[contracts.a]\npath = \"a\"\n");
        let sections = ManifestSections::default();
        let o = order(&["a", "b"]);

        // A directory sits where the manifest is written, so the final rename fails.
        let mut blocked = DeploymentManifest::parse(
            "[contracts.b]\npath = \"b\"\n\n[contracts.a]\npath = \"a\"\n",
            &project.path("blocked"),
            &sections,
        )
        .unwrap();
        let failed = align_manifest(&mut blocked, &o, &AlignOptions::default());
        assert!(failed.is_failure(), "{:?}", failed);
        assert!(project.path("blocked").is_dir());
        assert_eq!(project.read("blocked/keep.txt"), "untouched");

        let outcomes = align_manifests(&[project.path("Clarinet.toml")], &sections, &o, &AlignOptions::default());
        assert!(matches!(outcomes[0], AlignOutcome::Aligned { written: true, .. }));

        let mut names: Vec<_> = std::fs::read_dir(project.root())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["Clarinet.toml", "blocked"]);
    }

    #[test]
    fn test_unexpressible_order_fails_without_writing() {
        let content = "[contracts]\na = { path = \"a\" }\n\n[contracts.b]\npath = \"b\"\n";
        let project = ProjectFixture::new().manifest("Clarinet.toml", content);
        let outcomes = align_manifests(
            &[project.path("Clarinet.toml")],
            &ManifestSections::default(),
            &order(&["b", "a"]),
            &AlignOptions::default(),
        );
        assert!(matches!(&outcomes[0], AlignOutcome::Failed { error, .. } if error.contains("`a`")));
        assert_eq!(project.read("Clarinet.toml"), content);
    }

    #[test]
    fn test_missing_and_invalid_manifests() {
        let project = ProjectFixture::new()
            .manifest("broken.toml", "[contracts.a\npath = ")
            .manifest("Clarinet.toml", "[contracts.b]\npath = \"b\"\n\n[contracts.a]\npath = \"a\"\n");
        let paths = vec![
            project.path("missing.toml"),
            project.path("broken.toml"),
            project.path("Clarinet.toml"),
        ];
        let outcomes = align_manifests(
            &paths,
            &ManifestSections::default(),
            &order(&["a", "b"]),
            &AlignOptions::default(),
        );
        assert!(matches!(outcomes[0], AlignOutcome::Skipped { .. }));
        assert!(outcomes[1].is_failure());
        assert!(matches!(outcomes[2], AlignOutcome::Aligned { .. }));
        assert!(project
            .read("Clarinet.toml")
            .trim_start()
            .starts_with("[contracts.a]"));
    }
}
