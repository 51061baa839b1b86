//! Attribute-set normalization.
//!
//! The parser collects raw bindings (direct assignments, dotted paths, and
//! both `inherit` forms) in source order; this module merges them into one
//! `AttrSet` node through a prefix tree keyed by path segments. All four
//! binding categories populate the same tree, so duplicate detection is
//! uniform across them.
//!
//! `rec` only ever makes direct and dotted bindings self-referential.
//! Names copied with `inherit a;` always resolve to the enclosing lexical
//! scope, even inside `rec { }`; the resulting bindings carry the
//! `inherited` flag so the evaluator binds them outside the set's own scope.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::ast::{AstNode, Binding, Expr, Span};
use crate::errors::{to_source_span, ErrorKind, ErrorReporting, SableError, SourceContext};

/// A raw binding as written in the source, before normalization.
#[derive(Debug, Clone)]
pub enum RawBinding {
    /// `a = e;` or `a.b.c = e;` - the path is nonempty.
    Direct {
        path: Vec<(String, Span)>,
        value: AstNode,
        span: Span,
    },
    /// `inherit a b;` - copy names from the enclosing lexical scope.
    InheritScope {
        names: Vec<(String, Span)>,
        span: Span,
    },
    /// `inherit (src) a b;` - select names from `src`, which is evaluated
    /// once and shared across the generated selections.
    InheritExpr {
        source: AstNode,
        names: Vec<(String, Span)>,
        span: Span,
    },
}

enum Entry {
    Leaf {
        value: AstNode,
        inherited: bool,
        span: Span,
    },
    Node {
        children: BTreeMap<String, Entry>,
        span: Span,
    },
}

impl Entry {
    fn span(&self) -> Span {
        match self {
            Entry::Leaf { span, .. } | Entry::Node { span, .. } => *span,
        }
    }
}

/// Merges raw bindings into a single `AttrSet` expression, or fails with a
/// `DuplicateAttribute` error carrying both definition positions.
pub fn normalize(
    bindings: Vec<RawBinding>,
    recursive: bool,
    span: Span,
    ctx: &SourceContext,
) -> Result<Expr, SableError> {
    let mut root: BTreeMap<String, Entry> = BTreeMap::new();

    for binding in bindings {
        match binding {
            RawBinding::Direct { path, value, .. } => {
                insert(&mut root, &path, value, false, ctx)?;
            }
            RawBinding::InheritScope { names, .. } => {
                for (name, name_span) in names {
                    let var = Arc::new(Expr::Var(name.clone(), name_span));
                    insert(&mut root, &[(name, name_span)], var, true, ctx)?;
                }
            }
            RawBinding::InheritExpr { source, names, .. } => {
                for (name, name_span) in names {
                    let select = Arc::new(Expr::Select {
                        base: source.clone(),
                        attr: name.clone(),
                        span: name_span,
                    });
                    insert(&mut root, &[(name, name_span)], select, false, ctx)?;
                }
            }
        }
    }

    Ok(materialize(root, recursive, span))
}

fn insert(
    children: &mut BTreeMap<String, Entry>,
    path: &[(String, Span)],
    value: AstNode,
    inherited: bool,
    ctx: &SourceContext,
) -> Result<(), SableError> {
    let (name, name_span) = &path[0];

    if path.len() == 1 {
        if let Some(existing) = children.get(name) {
            return Err(duplicate(ctx, name, existing.span(), *name_span));
        }
        children.insert(
            name.clone(),
            Entry::Leaf {
                value,
                inherited,
                span: *name_span,
            },
        );
        return Ok(());
    }

    let entry = children.entry(name.clone()).or_insert_with(|| Entry::Node {
        children: BTreeMap::new(),
        span: *name_span,
    });
    match entry {
        Entry::Node { children, .. } => insert(children, &path[1..], value, inherited, ctx),
        Entry::Leaf { span, .. } => Err(duplicate(ctx, name, *span, *name_span)),
    }
}

fn duplicate(ctx: &SourceContext, name: &str, original: Span, new: Span) -> SableError {
    ctx.report(
        ErrorKind::DuplicateAttribute {
            name: name.to_string(),
            original: to_source_span(original),
        },
        to_source_span(new),
    )
}

/// Turns the prefix tree into nested `AttrSet` nodes. Only the outermost
/// literal's `rec` flag survives; intermediate sets created by dotted paths
/// are never recursive.
fn materialize(children: BTreeMap<String, Entry>, recursive: bool, span: Span) -> Expr {
    let bindings = children
        .into_iter()
        .map(|(name, entry)| match entry {
            Entry::Leaf {
                value,
                inherited,
                span,
            } => Binding {
                name,
                value,
                inherited,
                span,
            },
            Entry::Node { children, span } => Binding {
                name,
                value: Arc::new(materialize(children, false, span)),
                inherited: false,
                span,
            },
        })
        .collect();

    Expr::AttrSet {
        recursive,
        bindings,
        span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> SourceContext {
        SourceContext::new("test.sbl", "{}")
    }

    fn int(n: i64) -> AstNode {
        Arc::new(Expr::Int(n, Span::default()))
    }

    fn direct(path: &[&str], value: AstNode) -> RawBinding {
        RawBinding::Direct {
            path: path
                .iter()
                .map(|s| (s.to_string(), Span::default()))
                .collect(),
            value,
            span: Span::default(),
        }
    }

    #[test]
    fn dotted_paths_nest_without_rec() {
        let set = normalize(
            vec![direct(&["a", "b"], int(1)), direct(&["a", "c"], int(2))],
            true,
            Span::default(),
            &ctx(),
        )
        .unwrap();

        let Expr::AttrSet {
            recursive,
            bindings,
            ..
        } = &set
        else {
            panic!("expected an attrset");
        };
        assert!(*recursive);
        assert_eq!(bindings.len(), 1);
        let Expr::AttrSet {
            recursive: inner_rec,
            bindings: inner,
            ..
        } = &*bindings[0].value
        else {
            panic!("expected a nested attrset");
        };
        assert!(!inner_rec, "inner sets from dotted paths are never rec");
        assert_eq!(inner.len(), 2);
    }

    #[test]
    fn leaf_over_leaf_is_a_duplicate() {
        let err = normalize(
            vec![direct(&["a"], int(1)), direct(&["a"], int(2))],
            false,
            Span::default(),
            &ctx(),
        )
        .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::DuplicateAttribute { .. }));
    }

    #[test]
    fn leaf_over_node_is_a_duplicate() {
        let err = normalize(
            vec![direct(&["a", "b"], int(1)), direct(&["a"], int(2))],
            false,
            Span::default(),
            &ctx(),
        )
        .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::DuplicateAttribute { .. }));
    }

    #[test]
    fn path_through_leaf_is_a_duplicate() {
        let err = normalize(
            vec![direct(&["a"], int(1)), direct(&["a", "b"], int(2))],
            false,
            Span::default(),
            &ctx(),
        )
        .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::DuplicateAttribute { .. }));
    }

    #[test]
    fn inherit_collides_with_direct() {
        let err = normalize(
            vec![
                direct(&["a"], int(1)),
                RawBinding::InheritScope {
                    names: vec![("a".into(), Span::default())],
                    span: Span::default(),
                },
            ],
            false,
            Span::default(),
            &ctx(),
        )
        .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::DuplicateAttribute { .. }));
    }

    #[test]
    fn inherit_scope_is_flagged_inherited() {
        let set = normalize(
            vec![RawBinding::InheritScope {
                names: vec![("a".into(), Span::default())],
                span: Span::default(),
            }],
            true,
            Span::default(),
            &ctx(),
        )
        .unwrap();
        let Expr::AttrSet { bindings, .. } = &set else {
            panic!("expected an attrset");
        };
        assert!(bindings[0].inherited);
        assert!(matches!(&*bindings[0].value, Expr::Var(name, _) if name == "a"));
    }

    #[test]
    fn inherit_expr_shares_one_source() {
        let source = Arc::new(Expr::Var("src".into(), Span::default()));
        let set = normalize(
            vec![RawBinding::InheritExpr {
                source: source.clone(),
                names: vec![
                    ("a".into(), Span::default()),
                    ("b".into(), Span::default()),
                ],
                span: Span::default(),
            }],
            false,
            Span::default(),
            &ctx(),
        )
        .unwrap();
        let Expr::AttrSet { bindings, .. } = &set else {
            panic!("expected an attrset");
        };
        for binding in bindings {
            let Expr::Select { base, .. } = &*binding.value else {
                panic!("expected a selection");
            };
            assert!(Arc::ptr_eq(base, &source));
        }
    }
}
