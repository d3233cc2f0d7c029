//! Declaration extraction.
//!
//! Recognizes the four declarative statement shapes and public function
//! definitions. Anything else in the source is ignored.

use crate::core::declaration::{is_principal, Declaration, DeclarationRecord, FunctionDef, InvokeTarget};
use crate::core::interface::{InterfaceDefinition, Signature};
use crate::source::lexer::{self, Form};

const DEFINE_TRAIT: &str = "define-trait";
const USE_TRAIT: &str = "use-trait";
const IMPL_TRAIT: &str = "impl-trait";
const CONTRACT_CALL: &str = "contract-call?";
const DEFINE_PUBLIC: &str = "define-public";
const DEFINE_READ_ONLY: &str = "define-read-only";

/// Extract declaration records from comment-stripped source text.
///
/// Records are returned in appearance order.
pub fn extract(text: &str) -> Vec<Declaration> {
    let forms = lexer::parse(text);
    let mut out = Vec::new();

    lexer::walk_lists(&forms, |form| {
        let Some(items) = form.as_list() else {
            return;
        };
        let record = match form.head() {
            Some(DEFINE_TRAIT) => declare_interface(items),
            Some(USE_TRAIT) => use_interface(items),
            Some(IMPL_TRAIT) => implements_interface(items),
            Some(CONTRACT_CALL) => invokes(items),
            _ => None,
        };
        if let Some(record) = record {
            out.push(Declaration::new(record, form.line()));
        }
    });

    out
}

/// Extract public and read-only function definitions.
pub fn extract_functions(text: &str) -> Vec<FunctionDef> {
    let forms = lexer::parse(text);
    let mut out = Vec::new();

    lexer::walk_lists(&forms, |form| {
        let read_only = match form.head() {
            Some(DEFINE_PUBLIC) => false,
            Some(DEFINE_READ_ONLY) => true,
            _ => return,
        };
        let Some(header) = form.as_list().and_then(|items| items.get(1)).and_then(Form::as_list) else {
            return;
        };
        let Some(name) = header.first().and_then(Form::as_atom) else {
            return;
        };
        out.push(FunctionDef {
            name: name.to_string(),
            arity: header.len() - 1,
            read_only,
            line: form.line(),
        });
    });

    out
}

/// Collect interface definitions from extracted declarations.
pub fn interface_definitions(decls: &[Declaration]) -> impl Iterator<Item = InterfaceDefinition> + '_ {
    decls.iter().filter_map(|d| match &d.record {
        DeclarationRecord::DeclareInterface(def) => Some(def.clone()),
        _ => None,
    })
}

/// Reference text of an atom or string literal.
fn reference_text(form: &Form<'_>) -> Option<String> {
    match form {
        Form::Atom { text, .. } | Form::Str { text, .. } if !text.is_empty() => Some(text.to_string()),
        _ => None,
    }
}

// (define-trait name ((fn (param-types...) return-type) ...))
fn declare_interface(items: &[Form<'_>]) -> Option<DeclarationRecord> {
    let name = items.get(1)?.as_atom()?;
    let mut def = InterfaceDefinition::new(name);

    if let Some(sigs) = items.get(2).and_then(Form::as_list) {
        for sig in sigs {
            let Some(parts) = sig.as_list() else {
                continue;
            };
            let Some(fn_name) = parts.first().and_then(Form::as_atom) else {
                continue;
            };
            let params = parts
                .get(1)
                .and_then(Form::as_list)
                .map(|ps| ps.iter().map(ToString::to_string).collect())
                .unwrap_or_default();
            let returns = parts.get(2).map(ToString::to_string).unwrap_or_default();
            def.functions
                .entry(fn_name.to_string())
                .or_insert(Signature { params, returns });
        }
    }

    Some(DeclarationRecord::DeclareInterface(def))
}

// (use-trait alias reference)
fn use_interface(items: &[Form<'_>]) -> Option<DeclarationRecord> {
    let alias = items.get(1)?.as_atom()?;
    let interface_ref = reference_text(items.get(2)?)?;
    Some(DeclarationRecord::UseInterface {
        alias: alias.to_string(),
        interface_ref,
    })
}

// (impl-trait reference)
fn implements_interface(items: &[Form<'_>]) -> Option<DeclarationRecord> {
    let reference = reference_text(items.get(1)?)?;
    Some(DeclarationRecord::ImplementsInterface { reference })
}

// (contract-call? target function args...)
fn invokes(items: &[Form<'_>]) -> Option<DeclarationRecord> {
    let target = classify_target(items.get(1)?);
    let function = items.get(2).and_then(Form::as_atom).map(str::to_string);
    Some(DeclarationRecord::Invokes { target, function })
}

/// Classify an invocation target.
pub fn classify_target(form: &Form<'_>) -> InvokeTarget {
    if let Some(atom) = form.as_atom() {
        if let Some(path) = atom.strip_prefix('.') {
            if let Some(name) = path.split('.').next().filter(|n| !n.is_empty()) {
                return InvokeTarget::Local(name.to_string());
            }
        } else if is_principal(atom) {
            return InvokeTarget::External(atom.to_string());
        }
    }
    InvokeTarget::Dynamic(form.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(text: &str) -> Vec<DeclarationRecord> {
        extract(text).into_iter().map(|d| d.record).collect()
    }

    #[test]
    fn test_extract_use_and_impl() {
        let text = r#"
(use-trait ft .all-traits.sip-010-trait)
(impl-trait .all-traits.vault-trait)
"#;
        assert_eq!(
            records(text),
            vec![
                DeclarationRecord::UseInterface {
                    alias: "ft".into(),
                    interface_ref: ".all-traits.sip-010-trait".into(),
                },
                DeclarationRecord::ImplementsInterface {
                    reference: ".all-traits.vault-trait".into(),
                },
            ]
        );
    }

    #[test]
    fn test_extract_define_trait_signatures() {
        let text = r#"
(define-trait sip-010-trait
  (
    (transfer (uint principal principal (optional (buff 34))) (response bool uint))
    (get-balance (principal) (response uint uint))
  )
)
"#;
        let decls = extract(text);
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].line, 2);
        let DeclarationRecord::DeclareInterface(def) = &decls[0].record else {
            panic!("expected interface declaration");
        };
        assert_eq!(def.name, "sip-010-trait");
        assert_eq!(def.functions["transfer"].arity(), 4);
        assert_eq!(def.functions["transfer"].params[3], "(optional (buff 34))");
        assert_eq!(def.functions["get-balance"].returns, "(response uint uint)");
    }

    #[test]
    fn test_extract_nested_calls_split_across_lines() {
        let text = r#"
(define-public (swap (amount uint))
  (begin
    (try! (contract-call?
            .token-a
            transfer amount tx-sender (as-contract tx-sender) none))
    (contract-call? .vault deposit amount)))
"#;
        let decls = extract(text);
        assert_eq!(decls.len(), 2);
        assert_eq!(
            decls[0].record,
            DeclarationRecord::Invokes {
                target: InvokeTarget::Local("token-a".into()),
                function: Some("transfer".into()),
            }
        );
        assert_eq!(decls[0].line, 4);
        assert_eq!(decls[1].line, 7);
    }

    #[test]
    fn test_classify_targets() {
        let text = r#"
(contract-call? 'SP3FBR2AGK5H9QBDH3EEN6DF8EK8JY7RX8QJ5SVTE.token transfer)
(contract-call? SP3FBR2AGK5H9QBDH3EEN6DF8EK8JY7RX8QJ5SVTE.token transfer)
(contract-call? token-trait transfer)
(contract-call? (unwrap-panic (get token pool)) transfer)
"#;
        let targets: Vec<_> = records(text)
            .into_iter()
            .map(|r| match r {
                DeclarationRecord::Invokes { target, .. } => target,
                other => panic!("unexpected record {:?}", other),
            })
            .collect();
        assert!(matches!(targets[0], InvokeTarget::External(_)));
        assert!(matches!(targets[1], InvokeTarget::External(_)));
        assert_eq!(targets[2], InvokeTarget::Dynamic("token-trait".into()));
        assert_eq!(
            targets[3],
            InvokeTarget::Dynamic("(unwrap-panic (get token pool))".into())
        );
    }

    #[test]
    fn test_strings_never_declare() {
        let text = r#"(print "(contract-call? .vault x) (impl-trait .t.x)")"#;
        assert!(extract(text).is_empty());
    }

    #[test]
    fn test_unicode_whitespace_between_forms() {
        assert_eq!(
            records("(contract-call?\u{3000}.vault deposit u1)"),
            vec![DeclarationRecord::Invokes {
                target: InvokeTarget::Local("vault".into()),
                function: Some("deposit".into()),
            }]
        );

        let fns = extract_functions("(define-public (f)\u{2003}(ok true))");
        assert_eq!(fns.len(), 1);
        assert_eq!(fns[0].name, "f");
        assert_eq!(fns[0].arity, 0);
    }

    #[test]
    fn test_extract_functions() {
        let text = r#"
(define-public (transfer (amount uint) (sender principal) (recipient principal) (memo (optional (buff 34))))
  (ok true))
(define-read-only (get-balance (who principal)) (ok u0))
(define-private (helper) true)
"#;
        let fns = extract_functions(text);
        assert_eq!(fns.len(), 2);
        assert_eq!(fns[0].name, "transfer");
        assert_eq!(fns[0].arity, 4);
        assert!(!fns[0].read_only);
        assert_eq!(fns[1].name, "get-balance");
        assert_eq!(fns[1].arity, 1);
        assert!(fns[1].read_only);
    }
}
