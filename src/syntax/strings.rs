//! Indentation stripping for indented (`'' ... ''`) string literals.
//!
//! Two passes over the literal's parts. The first measures the minimum
//! indentation across all lines that carry content; the second drops that
//! many leading spaces from every line. Interpolated parts are never
//! touched, but an interpolation sitting at the start of a line counts as
//! that line's content when measuring.

use std::sync::Arc;

use crate::ast::{AstNode, BinOp, Expr, Span, StrPart};

/// Strips the common indentation from an indented string's parts and folds
/// the result into a single expression.
pub fn strip_indentation(parts: Vec<StrPart>, span: Span) -> AstNode {
    let min_indent = measure(&parts);
    let mut rewritten = rewrite(parts, min_indent);
    truncate_trailing_blank_line(&mut rewritten);
    fold(rewritten, span)
}

/// Phase 1: the minimum indentation over all non-empty lines. Lines holding
/// only a newline contribute no candidate, so blank lines never lower the
/// minimum.
fn measure(parts: &[StrPart]) -> usize {
    let mut min_indent = usize::MAX;
    let mut at_line_start = true;
    let mut indent = 0usize;

    for part in parts {
        match part {
            StrPart::Interp(_) => {
                if at_line_start {
                    min_indent = min_indent.min(indent);
                    at_line_start = false;
                }
            }
            StrPart::Literal(text) => {
                for ch in text.chars() {
                    if at_line_start {
                        match ch {
                            ' ' => indent += 1,
                            '\n' => indent = 0,
                            _ => {
                                min_indent = min_indent.min(indent);
                                at_line_start = false;
                            }
                        }
                    } else if ch == '\n' {
                        at_line_start = true;
                        indent = 0;
                    }
                }
            }
        }
    }

    if min_indent == usize::MAX {
        0
    } else {
        min_indent
    }
}

/// Phase 2: drop up to `min_indent` leading spaces per line, stopping early
/// at the first non-space character. Interpolated parts pass through
/// untouched.
fn rewrite(parts: Vec<StrPart>, min_indent: usize) -> Vec<StrPart> {
    let mut out = Vec::with_capacity(parts.len());
    let mut at_line_start = true;
    let mut dropped = 0usize;

    for part in parts {
        match part {
            StrPart::Interp(expr) => {
                at_line_start = false;
                dropped = 0;
                out.push(StrPart::Interp(expr));
            }
            StrPart::Literal(text) => {
                let mut rewritten = String::with_capacity(text.len());
                for ch in text.chars() {
                    if at_line_start {
                        match ch {
                            ' ' if dropped < min_indent => {
                                dropped += 1;
                                continue;
                            }
                            '\n' => {
                                rewritten.push(ch);
                                dropped = 0;
                                continue;
                            }
                            ' ' => rewritten.push(ch),
                            _ => {
                                at_line_start = false;
                                dropped = 0;
                                rewritten.push(ch);
                            }
                        }
                    } else {
                        if ch == '\n' {
                            at_line_start = true;
                            dropped = 0;
                        }
                        rewritten.push(ch);
                    }
                }
                if !rewritten.is_empty() {
                    out.push(StrPart::Literal(rewritten));
                }
            }
        }
    }
    out
}

/// A final line consisting solely of spaces before the closing delimiter is
/// truncated to just its newline.
fn truncate_trailing_blank_line(parts: &mut [StrPart]) {
    let Some(StrPart::Literal(last)) = parts.last_mut() else {
        return;
    };
    let Some(newline) = last.rfind('\n') else {
        return;
    };
    let tail = &last[newline + 1..];
    if !tail.is_empty() && tail.chars().all(|c| c == ' ') {
        last.truncate(newline + 1);
    }
}

/// Folds the remaining parts into one expression: zero parts become the
/// empty string, a lone literal becomes a plain string, a lone interpolation
/// is promoted to the embedded expression itself, and anything longer
/// becomes a chain of string concatenations in source order.
fn fold(parts: Vec<StrPart>, span: Span) -> AstNode {
    match parts.len() {
        0 => Arc::new(Expr::Str(Vec::new(), span)),
        1 => match parts.into_iter().next().expect("length checked") {
            StrPart::Literal(text) => {
                Arc::new(Expr::Str(vec![StrPart::Literal(text)], span))
            }
            StrPart::Interp(expr) => expr,
        },
        _ => {
            let mut exprs: Vec<AstNode> = parts
                .into_iter()
                .map(|part| match part {
                    StrPart::Literal(text) => {
                        Arc::new(Expr::Str(vec![StrPart::Literal(text)], span))
                    }
                    StrPart::Interp(expr) => expr,
                })
                .collect();

            let mut acc = exprs.pop().expect("at least two parts");
            while let Some(lhs) = exprs.pop() {
                acc = Arc::new(Expr::BinaryOp {
                    op: BinOp::ConcatStrings,
                    lhs,
                    rhs: acc,
                    span,
                });
            }
            acc
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(text: &str) -> StrPart {
        StrPart::Literal(text.to_string())
    }

    fn interp(name: &str) -> StrPart {
        StrPart::Interp(Arc::new(Expr::Var(name.to_string(), Span::default())))
    }

    fn stripped_literal(parts: Vec<StrPart>) -> String {
        match &*strip_indentation(parts, Span::default()) {
            Expr::Str(parts, _) => match parts.as_slice() {
                [] => String::new(),
                [StrPart::Literal(text)] => text.clone(),
                other => panic!("unexpected parts: {:?}", other),
            },
            other => panic!("expected a string literal, got {}", other.type_name()),
        }
    }

    #[test]
    fn uniform_indent_is_removed() {
        let text = stripped_literal(vec![lit("\n  foo\n  bar\n")]);
        assert_eq!(text, "\nfoo\nbar\n");
    }

    #[test]
    fn minimum_wins_across_lines() {
        let text = stripped_literal(vec![lit("\n    foo\n  bar\n")]);
        assert_eq!(text, "\n  foo\nbar\n");
    }

    #[test]
    fn blank_lines_do_not_affect_the_minimum() {
        let text = stripped_literal(vec![lit("\n  foo\n\n  bar\n")]);
        assert_eq!(text, "\nfoo\n\nbar\n");
    }

    #[test]
    fn trailing_space_only_line_is_truncated() {
        let text = stripped_literal(vec![lit("\n  foo\n  ")]);
        assert_eq!(text, "\nfoo\n");
    }

    #[test]
    fn interpolation_at_line_start_counts_for_measuring() {
        // The second line starts with two spaces then an interpolation, so
        // the minimum is two even though the first line has four.
        let result = strip_indentation(
            vec![lit("\n    foo\n  "), interp("x"), lit("\n")],
            Span::default(),
        );
        let Expr::BinaryOp {
            op: BinOp::ConcatStrings,
            lhs,
            ..
        } = &*result
        else {
            panic!("expected a concatenation");
        };
        let Expr::Str(parts, _) = &**lhs else {
            panic!("expected a literal prefix");
        };
        assert_eq!(parts, &[lit("\n  foo\n")]);
    }

    #[test]
    fn lone_interpolation_is_promoted() {
        let result = strip_indentation(vec![interp("x")], Span::default());
        assert!(matches!(&*result, Expr::Var(name, _) if name == "x"));
    }

    #[test]
    fn empty_literal_stays_empty() {
        assert_eq!(stripped_literal(vec![]), "");
    }
}
