//! Core AST types for Sable expressions with source location tracking.
//!
//! Every node carries a byte span into the source it was parsed from, and
//! child nodes are shared through `Arc` so the normalizer can reuse a single
//! `inherit (src)` source expression across its generated selections.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Represents a span in the source code.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Joins two spans into one covering both.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end,
        }
    }
}

/// Canonical AST node type with shared ownership.
pub type AstNode = Arc<Expr>;

/// Binary operator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Eq,
    NEq,
    And,
    Or,
    Impl,
    Update,
    ConcatStrings,
    ConcatLists,
    SubPath,
}

impl BinOp {
    /// The operator's surface syntax, for pretty-printing and diagnostics.
    pub const fn token(self) -> &'static str {
        match self {
            BinOp::Eq => "==",
            BinOp::NEq => "!=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::Impl => "->",
            BinOp::Update => "//",
            BinOp::ConcatStrings => "+",
            BinOp::ConcatLists => "++",
            BinOp::SubPath => "~",
        }
    }
}

/// One piece of a (possibly interpolated) string literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StrPart {
    Literal(String),
    Interp(AstNode),
}

/// A single formal argument in an attribute-pattern lambda.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formal {
    pub name: String,
    pub default: Option<AstNode>,
    pub span: Span,
}

/// The attribute pattern of a lambda: `{ a, b ? e, ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formals {
    pub formals: Vec<Formal>,
    pub ellipsis: bool,
    pub span: Span,
}

/// A normalized binding inside an attribute set.
///
/// `inherited` marks names copied from the enclosing lexical scope via
/// `inherit a b;`. A `rec` set never makes these self-referential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub name: String,
    pub value: AstNode,
    pub inherited: bool,
    pub span: Span,
}

/// The synthetic attribute name holding the body of a desugared `let`.
///
/// `<` is not a valid identifier character, so this can never collide with
/// a user-written binding.
pub const LET_BODY: &str = "<let-body>";

/// The core AST node for Sable expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Var(String, Span),
    Int(i64, Span),
    /// A string literal as an ordered sequence of literal and interpolated
    /// parts.
    Str(Vec<StrPart>, Span),
    /// An absolute path literal. Relative path literals are resolved against
    /// the parse's base directory at construction time.
    Path(PathBuf, Span),
    Uri(String, Span),
    List(Vec<AstNode>, Span),
    AttrSet {
        recursive: bool,
        bindings: Vec<Binding>,
        span: Span,
    },
    Select {
        base: AstNode,
        attr: String,
        span: Span,
    },
    HasAttr {
        base: AstNode,
        attr: String,
        span: Span,
    },
    App {
        function: AstNode,
        argument: AstNode,
        span: Span,
    },
    Lambda {
        arg: Option<String>,
        formals: Option<Formals>,
        body: AstNode,
        span: Span,
    },
    If {
        condition: AstNode,
        then_branch: AstNode,
        else_branch: AstNode,
        span: Span,
    },
    With {
        scope: AstNode,
        body: AstNode,
        span: Span,
    },
    Assert {
        condition: AstNode,
        body: AstNode,
        span: Span,
    },
    Not(AstNode, Span),
    BinaryOp {
        op: BinOp,
        lhs: AstNode,
        rhs: AstNode,
        span: Span,
    },
}

impl Expr {
    /// Returns the span of this expression.
    pub fn span(&self) -> Span {
        use Expr::*;
        match self {
            Var(_, span)
            | Int(_, span)
            | Str(_, span)
            | Path(_, span)
            | Uri(_, span)
            | List(_, span)
            | Not(_, span) => *span,
            AttrSet { span, .. }
            | Select { span, .. }
            | HasAttr { span, .. }
            | App { span, .. }
            | Lambda { span, .. }
            | If { span, .. }
            | With { span, .. }
            | Assert { span, .. }
            | BinaryOp { span, .. } => *span,
        }
    }

    /// Returns the type name of this AST node as a string (for diagnostics
    /// and debugging).
    pub fn type_name(&self) -> &'static str {
        match self {
            Expr::Var(..) => "Var",
            Expr::Int(..) => "Int",
            Expr::Str(..) => "Str",
            Expr::Path(..) => "Path",
            Expr::Uri(..) => "Uri",
            Expr::List(..) => "List",
            Expr::AttrSet { .. } => "AttrSet",
            Expr::Select { .. } => "Select",
            Expr::HasAttr { .. } => "HasAttr",
            Expr::App { .. } => "App",
            Expr::Lambda { .. } => "Lambda",
            Expr::If { .. } => "If",
            Expr::With { .. } => "With",
            Expr::Assert { .. } => "Assert",
            Expr::Not(..) => "Not",
            Expr::BinaryOp { .. } => "BinaryOp",
        }
    }

    /// Pretty-prints the expression as a string.
    pub fn pretty(&self) -> String {
        match self {
            Expr::Var(name, _) => name.clone(),
            Expr::Int(n, _) => n.to_string(),
            Expr::Str(parts, _) => Self::pretty_str(parts),
            Expr::Path(p, _) => p.display().to_string(),
            Expr::Uri(u, _) => u.clone(),
            Expr::List(items, _) => {
                let inner = items
                    .iter()
                    .map(|e| e.pretty())
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("[ {} ]", inner)
            }
            Expr::AttrSet {
                recursive,
                bindings,
                ..
            } => Self::pretty_attrs(*recursive, bindings),
            Expr::Select { base, attr, .. } => format!("{}.{}", base.pretty(), attr),
            Expr::HasAttr { base, attr, .. } => format!("({} ? {})", base.pretty(), attr),
            Expr::App {
                function, argument, ..
            } => format!("({} {})", function.pretty(), argument.pretty()),
            Expr::Lambda {
                arg,
                formals,
                body,
                ..
            } => Self::pretty_lambda(arg.as_deref(), formals.as_ref(), body),
            Expr::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => format!(
                "(if {} then {} else {})",
                condition.pretty(),
                then_branch.pretty(),
                else_branch.pretty()
            ),
            Expr::With { scope, body, .. } => {
                format!("(with {}; {})", scope.pretty(), body.pretty())
            }
            Expr::Assert {
                condition, body, ..
            } => format!("(assert {}; {})", condition.pretty(), body.pretty()),
            Expr::Not(inner, _) => format!("(!{})", inner.pretty()),
            Expr::BinaryOp { op, lhs, rhs, .. } => {
                format!("({} {} {})", lhs.pretty(), op.token(), rhs.pretty())
            }
        }
    }

    fn pretty_str(parts: &[StrPart]) -> String {
        let mut s = String::from("\"");
        for part in parts {
            match part {
                StrPart::Literal(text) => {
                    for ch in text.chars() {
                        match ch {
                            '"' => s.push_str("\\\""),
                            '\\' => s.push_str("\\\\"),
                            '\n' => s.push_str("\\n"),
                            _ => s.push(ch),
                        }
                    }
                }
                StrPart::Interp(expr) => {
                    s.push_str("${");
                    s.push_str(&expr.pretty());
                    s.push('}');
                }
            }
        }
        s.push('"');
        s
    }

    fn pretty_attrs(recursive: bool, bindings: &[Binding]) -> String {
        let mut s = String::new();
        if recursive {
            s.push_str("rec ");
        }
        s.push_str("{ ");
        for binding in bindings {
            if binding.inherited {
                s.push_str(&format!("inherit {}; ", binding.name));
            } else {
                s.push_str(&format!("{} = {}; ", binding.name, binding.value.pretty()));
            }
        }
        s.push('}');
        s
    }

    fn pretty_lambda(arg: Option<&str>, formals: Option<&Formals>, body: &Expr) -> String {
        let mut s = String::from("(");
        if let Some(formals) = formals {
            s.push_str("{ ");
            for (i, formal) in formals.formals.iter().enumerate() {
                if i > 0 {
                    s.push_str(", ");
                }
                s.push_str(&formal.name);
                if let Some(default) = &formal.default {
                    s.push_str(&format!(" ? {}", default.pretty()));
                }
            }
            if formals.ellipsis {
                if !formals.formals.is_empty() {
                    s.push_str(", ");
                }
                s.push_str("...");
            }
            s.push_str(" }");
            if let Some(arg) = arg {
                s.push_str(&format!(" @ {}", arg));
            }
        } else if let Some(arg) = arg {
            s.push_str(arg);
        }
        s.push_str(&format!(": {})", body.pretty()));
        s
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pretty())
    }
}
