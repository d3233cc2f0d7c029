//! Interface conformance and declaration lints.

use std::collections::HashMap;

use crate::core::declaration::{DeclarationRecord, InterfaceRef, InvokeTarget};
use crate::core::interface::{InterfaceDefinition, InterfaceRegistry};
use crate::graph::builder::{resolve_interface, unit_aliases};
use crate::ops::issue::{Finding, Issue};
use crate::source::{SourceIndex, SourceUnit};
use crate::util::config::{CheckConfig, LintLevel};

/// Check every unit of the index.
///
/// Issues come out grouped by unit in id order, each unit's in appearance
/// order. Registry duplicates are reported first.
pub fn check_conformance(index: &SourceIndex, config: &CheckConfig) -> Vec<Issue> {
    let registry = index.registry();
    let mut issues = Vec::new();

    for name in registry.duplicates() {
        let mut issue = Issue::error(Finding::DuplicateInterface { name: name.clone() });
        if let Some(source) = registry.unit().and_then(|id| index.get(id)) {
            issue = issue.at(source.unit.source_path(), None);
        }
        issues.push(issue);
    }

    for source in index.units() {
        check_unit(source, registry, config, &mut issues);
    }

    tracing::debug!("conformance: {} issues", issues.len());
    issues
}

fn check_unit(
    source: &SourceUnit,
    registry: &InterfaceRegistry,
    config: &CheckConfig,
    issues: &mut Vec<Issue>,
) {
    let unit = source.id();
    let path = source.unit.source_path();
    let aliases = unit_aliases(source);

    for decl in &source.declarations {
        let at = |issue: Issue| issue.at(path, Some(decl.line));

        match &decl.record {
            DeclarationRecord::ImplementsInterface { reference } => {
                if config.require_aliases && !is_alias(reference, &aliases) {
                    issues.push(at(Issue::error(Finding::AliasRequired {
                        unit: unit.to_string(),
                        reference: reference.clone(),
                    })));
                }

                let resolved = resolve_interface(reference, &aliases);
                if resolved.is_external() {
                    issues.push(at(Issue::note(Finding::ExternalInterface {
                        unit: unit.to_string(),
                        reference: resolved.name().to_string(),
                    })));
                    continue;
                }

                match registry.get(resolved.name()) {
                    Some(def) if config.functions => {
                        for issue in check_functions(source, def) {
                            issues.push(at(issue));
                        }
                    }
                    Some(_) => {}
                    None => issues.push(at(Issue::error(Finding::UnresolvedInterface {
                        unit: unit.to_string(),
                        interface: resolved.name().to_string(),
                    }))),
                }
            }
            DeclarationRecord::UseInterface {
                alias,
                interface_ref,
            } if config.require_registry => {
                let in_registry = match InterfaceRef::parse(interface_ref) {
                    InterfaceRef::Local {
                        unit: Some(owner), ..
                    } => registry.unit() == Some(owner.as_str()),
                    _ => false,
                };
                if !in_registry {
                    issues.push(at(Issue::error(Finding::AliasOutsideRegistry {
                        unit: unit.to_string(),
                        alias: alias.clone(),
                        reference: interface_ref.clone(),
                    })));
                }
            }
            DeclarationRecord::Invokes {
                target: InvokeTarget::Dynamic(text),
                ..
            } if !source.unit.is_test() => {
                let finding = Finding::DynamicCall {
                    unit: unit.to_string(),
                    target: text.clone(),
                };
                match config.dynamic_calls {
                    LintLevel::Allow => {}
                    LintLevel::Warn => issues.push(at(Issue::warning(finding))),
                    LintLevel::Deny => issues.push(at(Issue::error(finding))),
                }
            }
            _ => {}
        }
    }
}

fn is_alias(reference: &str, aliases: &HashMap<String, InterfaceRef>) -> bool {
    matches!(InterfaceRef::parse(reference), InterfaceRef::Name(name) if aliases.contains_key(&name))
}

/// Every interface function must be defined, with the same parameter count.
fn check_functions(source: &SourceUnit, def: &InterfaceDefinition) -> Vec<Issue> {
    let defined: HashMap<&str, usize> = source
        .functions
        .iter()
        .map(|f| (f.name.as_str(), f.arity))
        .collect();

    let mut issues = Vec::new();
    for (function, signature) in &def.functions {
        match defined.get(function.as_str()) {
            None => issues.push(Issue::error(Finding::MissingFunction {
                unit: source.id().to_string(),
                interface: def.name.clone(),
                function: function.clone(),
            })),
            Some(&found) if found != signature.arity() => {
                issues.push(Issue::error(Finding::ArityMismatch {
                    unit: source.id().to_string(),
                    interface: def.name.clone(),
                    function: function.clone(),
                    expected: signature.arity(),
                    found,
                }))
            }
            Some(_) => {}
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::unit::{Unit, UnitKind};
    use crate::ops::analyze::analyze;
    use crate::test_support::{sources, ProjectFixture};
    use crate::util::diagnostic::Severity;

    const REGISTRY: &str = r#"
(define-trait vault-trait
  ((deposit (uint) (response bool uint))
   (get-balance (principal) (response uint uint))))
(define-trait vault-trait ())
"#;

    fn index(units: &[(&str, UnitKind, &str)]) -> SourceIndex {
        let mut sources = vec![(
            Unit::new("registry", UnitKind::Interface, "contracts/registry.clar"),
            REGISTRY,
        )];
        sources.extend(units.iter().map(|(id, kind, text)| {
            (Unit::new(*id, *kind, format!("contracts/{}.clar", id)), *text)
        }));
        SourceIndex::from_sources(sources)
    }

    fn findings(issues: &[Issue]) -> Vec<&Finding> {
        issues
            .iter()
            .filter(|i| !matches!(i.finding, Finding::DuplicateInterface { .. }))
            .map(|i| &i.finding)
            .collect()
    }

    const VAULT_IMPL: &str = r#"
(define-public (deposit (amount uint)) (ok true))
(define-read-only (get-balance (who principal)) (ok u0))
"#;

    #[test]
    fn test_unresolved_interface_reported_once() {
        let idx = index(&[("X", UnitKind::Contract, "(impl-trait registry.foo)")]);
        let issues = check_conformance(&idx, &CheckConfig::default());
        let errors: Vec<_> = issues
            .iter()
            .filter(|i| i.is_error() && !matches!(i.finding, Finding::DuplicateInterface { .. }))
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].finding,
            Finding::UnresolvedInterface {
                unit: "X".into(),
                interface: "foo".into()
            }
        );
        assert_eq!(errors[0].line, Some(1));
    }

    #[test]
    fn test_conforming_project_on_disk() {
        let project = ProjectFixture::new()
            .registry(sources::registry())
            .contract("token", sources::token())
            .contract("wallet", &sources::caller("token"));
        let analysis = analyze(&project.context());

        let issues = check_conformance(&analysis.index, &CheckConfig::default());
        assert!(issues.is_empty(), "{:?}", issues);
        assert!(analysis.index.registry().get("sip-010-trait").is_some());
    }

    #[test]
    fn test_duplicate_interface_reported() {
        let idx = index(&[]);
        let issues = check_conformance(&idx, &CheckConfig::default());
        assert_eq!(
            issues[0].finding,
            Finding::DuplicateInterface {
                name: "vault-trait".into()
            }
        );
    }

    #[test]
    fn test_alias_resolution_and_functions() {
        let text = format!("(use-trait vt .registry.vault-trait)\n(impl-trait vt)\n{}", VAULT_IMPL);
        let idx = index(&[("vault", UnitKind::Contract, text.as_str())]);
        let issues = check_conformance(&idx, &CheckConfig::default());
        assert!(findings(&issues).is_empty(), "{:?}", issues);
    }

    #[test]
    fn test_missing_function_and_arity() {
        let text = "(impl-trait .registry.vault-trait)\n(define-public (deposit (a uint) (b uint)) (ok true))";
        let idx = index(&[("vault", UnitKind::Contract, text)]);
        let issues = check_conformance(&idx, &CheckConfig::default());
        assert_eq!(
            findings(&issues),
            vec![
                &Finding::ArityMismatch {
                    unit: "vault".into(),
                    interface: "vault-trait".into(),
                    function: "deposit".into(),
                    expected: 1,
                    found: 2,
                },
                &Finding::MissingFunction {
                    unit: "vault".into(),
                    interface: "vault-trait".into(),
                    function: "get-balance".into(),
                },
            ]
        );

        let lenient = CheckConfig {
            functions: false,
            ..CheckConfig::default()
        };
        assert!(findings(&check_conformance(&idx, &lenient)).is_empty());
    }

    #[test]
    fn test_external_interface_is_a_note() {
        let idx = index(&[(
            "token",
            UnitKind::Contract,
            "(impl-trait 'SP3FBR2AGK5H9QBDH3EEN6DF8EK8JY7RX8QJ5SVTE.sip-010-trait-ft-standard.sip-010-trait)",
        )]);
        let issues = check_conformance(&idx, &CheckConfig::default());
        let found = findings(&issues);
        assert_eq!(found.len(), 1);
        assert!(matches!(found[0], Finding::ExternalInterface { .. }));
        assert!(issues.iter().any(|i| i.severity == Severity::Note));
    }

    #[test]
    fn test_policy_lints() {
        let text = format!(
            "(use-trait vt .other.vault-trait)\n(impl-trait .registry.vault-trait)\n{}",
            VAULT_IMPL
        );
        let idx = index(&[("vault", UnitKind::Contract, text.as_str())]);
        let strict = CheckConfig {
            require_aliases: true,
            require_registry: true,
            ..CheckConfig::default()
        };
        let issues = check_conformance(&idx, &strict);
        let found = findings(&issues);
        assert_eq!(found.len(), 2);
        assert!(matches!(found[0], Finding::AliasOutsideRegistry { alias, .. } if alias == "vt"));
        assert!(matches!(found[1], Finding::AliasRequired { .. }));
    }

    #[test]
    fn test_dynamic_call_lint_skips_tests() {
        let call = "(contract-call? token transfer)";
        let idx = index(&[
            ("router", UnitKind::Contract, call),
            ("router_test", UnitKind::Test, call),
        ]);

        let warn = check_conformance(&idx, &CheckConfig::default());
        let found: Vec<_> = warn
            .iter()
            .filter(|i| matches!(i.finding, Finding::DynamicCall { .. }))
            .collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Warning);

        let deny = CheckConfig {
            dynamic_calls: LintLevel::Deny,
            ..CheckConfig::default()
        };
        assert!(check_conformance(&idx, &deny)
            .iter()
            .any(|i| i.is_error() && matches!(i.finding, Finding::DynamicCall { .. })));

        let allow = CheckConfig {
            dynamic_calls: LintLevel::Allow,
            ..CheckConfig::default()
        };
        assert!(findings(&check_conformance(&idx, &allow)).is_empty());
    }
}
