//! The Sable parse engine.
//!
//! A layered recursive-descent parser over the token stream:
//! keyword-led forms (lambdas, `if`, `assert`, `with`, `let`) at the lowest
//! layer, then a Pratt loop for the binary operator table, then function
//! application by juxtaposition, then attribute selection, then atoms.
//!
//! Juxtaposition collides with several reduction choices (a `{` can open an
//! attrset or a formals pattern, an identifier can be a variable or a lambda
//! head), so the parser uses bounded token lookahead and always prefers the
//! longest valid reduction. The first unexpected token aborts the parse; no
//! recovery is attempted.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::ast::{AstNode, BinOp, Expr, Formal, Formals, Span, StrPart, LET_BODY};
use crate::errors::{to_source_span, ErrorKind, ErrorReporting, SableError, SourceContext};
use crate::syntax::attrs::{self, RawBinding};
use crate::syntax::strings;
use crate::syntax::token::{tokenize, Token, TokenKind};

// Binding powers, lowest to highest. A nonassoc operator seen twice at the
// same level is a syntax error.
const BP_IMPL: u8 = 2;
const BP_OR: u8 = 4;
const BP_AND: u8 = 6;
const BP_EQ: u8 = 8;
const BP_UPDATE: u8 = 10;
const BP_NOT_RHS: u8 = 13;
const BP_PLUS: u8 = 14;
const BP_CONCAT: u8 = 16;
const BP_HAS_ATTR: u8 = 18;
const BP_SUBPATH: u8 = 20;

// Live recursive frames allowed across the expression layers. Past this,
// nesting fails with a syntax error instead of exhausting the stack.
const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
    Right,
    NonAssoc,
}

fn binary_op(kind: &TokenKind) -> Option<(u8, Assoc, BinOp)> {
    let row = match kind {
        TokenKind::Impl => (BP_IMPL, Assoc::NonAssoc, BinOp::Impl),
        TokenKind::OrOr => (BP_OR, Assoc::Left, BinOp::Or),
        TokenKind::AndAnd => (BP_AND, Assoc::Left, BinOp::And),
        TokenKind::Eq => (BP_EQ, Assoc::NonAssoc, BinOp::Eq),
        TokenKind::NEq => (BP_EQ, Assoc::NonAssoc, BinOp::NEq),
        TokenKind::Update => (BP_UPDATE, Assoc::Right, BinOp::Update),
        TokenKind::Plus => (BP_PLUS, Assoc::Left, BinOp::ConcatStrings),
        TokenKind::Concat => (BP_CONCAT, Assoc::Right, BinOp::ConcatLists),
        TokenKind::Tilde => (BP_SUBPATH, Assoc::NonAssoc, BinOp::SubPath),
        _ => return None,
    };
    Some(row)
}

/// Parse source text into an AST root.
///
/// `name` is the logical path label used in diagnostics; `base_dir` anchors
/// relative path literals appearing in the source.
pub fn parse(source: &str, name: &str, base_dir: &Path) -> Result<AstNode, SableError> {
    let ctx = SourceContext::new(name, source);
    let tokens = tokenize(source, &ctx)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        ctx,
        base_dir: base_dir.to_path_buf(),
    };
    let root = parser.parse_expr()?;
    if parser.peek().kind != TokenKind::Eof {
        let tok = parser.peek().clone();
        return Err(parser.ctx.unexpected_token(
            "end of input",
            &tok.kind.describe(),
            to_source_span(tok.span),
        ));
    }
    Ok(root)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    ctx: SourceContext,
    base_dir: PathBuf,
}

impl Parser {
    // ------------------------------------------------------------------
    // Token cursor
    // ------------------------------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self, ahead: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + ahead).map(|t| &t.kind)
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.peek().kind == *kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, SableError> {
        if self.peek().kind == kind {
            Ok(self.advance())
        } else {
            let tok = self.peek().clone();
            Err(self.ctx.unexpected_token(
                &kind.describe(),
                &tok.kind.describe(),
                to_source_span(tok.span),
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Span), SableError> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok((name, tok.span))
            }
            other => Err(self.ctx.unexpected_token(
                "identifier",
                &other.describe(),
                to_source_span(tok.span),
            )),
        }
    }

    // ------------------------------------------------------------------
    // Expression layers
    // ------------------------------------------------------------------

    /// Counts live recursive frames; pathological nesting becomes a syntax
    /// error rather than a stack overflow.
    fn descend(&mut self) -> Result<(), SableError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            let span = self.peek().span;
            return Err(self
                .ctx
                .malformed("expression nesting is too deep", to_source_span(span)));
        }
        Ok(())
    }

    /// Lowest layer: lambdas and keyword-led forms, else the operator layer.
    fn parse_expr(&mut self) -> Result<AstNode, SableError> {
        self.descend()?;
        let result = match &self.peek().kind {
            TokenKind::Ident(_) if matches!(self.peek_kind(1), Some(TokenKind::Colon)) => {
                self.parse_simple_lambda()
            }
            TokenKind::Ident(_) if matches!(self.peek_kind(1), Some(TokenKind::At)) => {
                self.parse_alias_first_lambda()
            }
            TokenKind::LBrace if self.formals_ahead() => self.parse_formals_lambda(),
            TokenKind::If => self.parse_if(),
            TokenKind::Assert => self.parse_assert(),
            TokenKind::With => self.parse_with(),
            TokenKind::Let => self.parse_let(),
            _ => self.parse_op_expr(0),
        };
        self.depth -= 1;
        result
    }

    /// Looks ahead from an `LBrace` to the matching close and reports whether
    /// a `:` or `@` follows, i.e. whether the braces are a formals pattern
    /// rather than an attrset literal.
    fn formals_ahead(&self) -> bool {
        let mut depth = 0usize;
        let mut i = self.pos;
        while let Some(tok) = self.tokens.get(i) {
            match tok.kind {
                TokenKind::LBrace | TokenKind::InterpOpen => depth += 1,
                TokenKind::RBrace | TokenKind::InterpClose => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return matches!(
                            self.tokens.get(i + 1).map(|t| &t.kind),
                            Some(TokenKind::Colon) | Some(TokenKind::At)
                        );
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            i += 1;
        }
        false
    }

    fn parse_simple_lambda(&mut self) -> Result<AstNode, SableError> {
        let (name, name_span) = self.expect_ident()?;
        self.expect(TokenKind::Colon)?;
        let body = self.parse_expr()?;
        let span = name_span.to(body.span());
        Ok(Arc::new(Expr::Lambda {
            arg: Some(name),
            formals: None,
            body,
            span,
        }))
    }

    /// `name @ { formals }: body`
    fn parse_alias_first_lambda(&mut self) -> Result<AstNode, SableError> {
        let (name, name_span) = self.expect_ident()?;
        self.expect(TokenKind::At)?;
        let formals = self.parse_formals()?;
        self.validate_formals(&formals, Some((&name, name_span)), true)?;
        self.expect(TokenKind::Colon)?;
        let body = self.parse_expr()?;
        let span = name_span.to(body.span());
        Ok(Arc::new(Expr::Lambda {
            arg: Some(name),
            formals: Some(formals),
            body,
            span,
        }))
    }

    /// `{ formals }: body` or `{ formals } @ name: body`
    fn parse_formals_lambda(&mut self) -> Result<AstNode, SableError> {
        let formals = self.parse_formals()?;
        let alias = if self.at(&TokenKind::At) {
            self.advance();
            Some(self.expect_ident()?)
        } else {
            None
        };
        self.validate_formals(
            &formals,
            alias.as_ref().map(|(name, span)| (name, *span)),
            false,
        )?;
        self.expect(TokenKind::Colon)?;
        let body = self.parse_expr()?;
        let span = formals.span.to(body.span());
        Ok(Arc::new(Expr::Lambda {
            arg: alias.map(|(name, _)| name),
            formals: Some(formals),
            body,
            span,
        }))
    }

    fn parse_formals(&mut self) -> Result<Formals, SableError> {
        let start = self.expect(TokenKind::LBrace)?.span;
        let mut formals = Vec::new();
        let mut ellipsis = false;

        loop {
            if self.at(&TokenKind::RBrace) {
                break;
            }
            if self.at(&TokenKind::Ellipsis) {
                self.advance();
                ellipsis = true;
                break;
            }
            let (name, span) = self.expect_ident()?;
            let default = if self.at(&TokenKind::Question) {
                self.advance();
                Some(self.parse_expr()?)
            } else {
                None
            };
            formals.push(Formal {
                name,
                default,
                span,
            });
            if self.at(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        let end = self.expect(TokenKind::RBrace)?.span;
        Ok(Formals {
            formals,
            ellipsis,
            span: start.to(end),
        })
    }

    /// Rejects duplicate names in one lambda's attribute pattern, counting
    /// the optional alias at its source position.
    fn validate_formals(
        &self,
        formals: &Formals,
        alias: Option<(&String, Span)>,
        alias_first: bool,
    ) -> Result<(), SableError> {
        let mut ordered: Vec<(&str, Span)> = Vec::with_capacity(formals.formals.len() + 1);
        if let (Some((name, span)), true) = (alias, alias_first) {
            ordered.push((name, span));
        }
        for formal in &formals.formals {
            ordered.push((&formal.name, formal.span));
        }
        if let (Some((name, span)), false) = (alias, alias_first) {
            ordered.push((name, span));
        }

        let mut seen: HashMap<&str, Span> = HashMap::new();
        for (name, span) in ordered {
            if let Some(original) = seen.insert(name, span) {
                return Err(self.ctx.report(
                    ErrorKind::DuplicateFormal {
                        name: name.to_string(),
                        original: to_source_span(original),
                    },
                    to_source_span(span),
                ));
            }
        }
        Ok(())
    }

    fn parse_if(&mut self) -> Result<AstNode, SableError> {
        let start = self.expect(TokenKind::If)?.span;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::Then)?;
        let then_branch = self.parse_expr()?;
        self.expect(TokenKind::Else)?;
        let else_branch = self.parse_expr()?;
        let span = start.to(else_branch.span());
        Ok(Arc::new(Expr::If {
            condition,
            then_branch,
            else_branch,
            span,
        }))
    }

    fn parse_assert(&mut self) -> Result<AstNode, SableError> {
        let start = self.expect(TokenKind::Assert)?.span;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;
        let body = self.parse_expr()?;
        let span = start.to(body.span());
        Ok(Arc::new(Expr::Assert {
            condition,
            body,
            span,
        }))
    }

    fn parse_with(&mut self) -> Result<AstNode, SableError> {
        let start = self.expect(TokenKind::With)?.span;
        let scope = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;
        let body = self.parse_expr()?;
        let span = start.to(body.span());
        Ok(Arc::new(Expr::With { scope, body, span }))
    }

    /// `let` desugars entirely at parse time: the bindings become a `rec`
    /// attrset holding the body under a synthetic member, and the whole form
    /// becomes a selection of that member.
    fn parse_let(&mut self) -> Result<AstNode, SableError> {
        let start = self.expect(TokenKind::Let)?.span;
        let mut raw = Vec::new();
        while !self.at(&TokenKind::In) {
            raw.push(self.parse_binding()?);
        }
        self.expect(TokenKind::In)?;
        let body = self.parse_expr()?;
        let span = start.to(body.span());

        raw.push(RawBinding::Direct {
            path: vec![(LET_BODY.to_string(), span)],
            value: body,
            span,
        });
        let set = attrs::normalize(raw, true, span, &self.ctx)?;
        Ok(Arc::new(Expr::Select {
            base: Arc::new(set),
            attr: LET_BODY.to_string(),
            span,
        }))
    }

    /// Operator layer: Pratt loop over the binary operator table.
    fn parse_op_expr(&mut self, min_bp: u8) -> Result<AstNode, SableError> {
        self.descend()?;
        let result = self.parse_op_expr_inner(min_bp);
        self.depth -= 1;
        result
    }

    fn parse_op_expr_inner(&mut self, min_bp: u8) -> Result<AstNode, SableError> {
        let mut lhs = if self.at(&TokenKind::Not) {
            let not_span = self.advance().span;
            let inner = self.parse_op_expr(BP_NOT_RHS)?;
            let span = not_span.to(inner.span());
            Arc::new(Expr::Not(inner, span))
        } else {
            self.parse_app_expr()?
        };

        loop {
            if self.at(&TokenKind::Question) {
                if BP_HAS_ATTR < min_bp {
                    break;
                }
                self.advance();
                let (attr, attr_span) = self.parse_attr_name()?;
                let span = lhs.span().to(attr_span);
                lhs = Arc::new(Expr::HasAttr {
                    base: lhs,
                    attr,
                    span,
                });
                if self.at(&TokenKind::Question) {
                    return Err(self.non_associative("?"));
                }
                continue;
            }

            let Some((bp, assoc, op)) = binary_op(&self.peek().kind) else {
                break;
            };
            if bp < min_bp {
                break;
            }
            self.advance();
            let next_min = match assoc {
                Assoc::Right => bp,
                Assoc::Left | Assoc::NonAssoc => bp + 1,
            };
            let rhs = self.parse_op_expr(next_min)?;
            let span = lhs.span().to(rhs.span());
            lhs = Arc::new(Expr::BinaryOp { op, lhs, rhs, span });

            if assoc == Assoc::NonAssoc {
                if let Some((next_bp, _, _)) = binary_op(&self.peek().kind) {
                    if next_bp == bp {
                        return Err(self.non_associative(op.token()));
                    }
                }
            }
        }
        Ok(lhs)
    }

    fn non_associative(&self, operator: &str) -> SableError {
        let span = self.peek().span;
        self.ctx.report(
            ErrorKind::NonAssociative {
                operator: operator.into(),
            },
            to_source_span(span),
        )
    }

    /// Application layer: juxtaposition of select-level expressions.
    fn parse_app_expr(&mut self) -> Result<AstNode, SableError> {
        let mut expr = self.parse_select_expr()?;
        while self.starts_operand() {
            let argument = self.parse_select_expr()?;
            let span = expr.span().to(argument.span());
            expr = Arc::new(Expr::App {
                function: expr,
                argument,
                span,
            });
        }
        Ok(expr)
    }

    /// Whether the next token can begin a select-level operand. This is the
    /// juxtaposition rule: no keyword-led form can be an argument without
    /// parentheses.
    fn starts_operand(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Ident(_)
                | TokenKind::Int(_)
                | TokenKind::QuoteOpen
                | TokenKind::IndQuoteOpen
                | TokenKind::PathLit(_)
                | TokenKind::UriLit(_)
                | TokenKind::LParen
                | TokenKind::LBrace
                | TokenKind::LBracket
                | TokenKind::Rec
        )
    }

    /// Selection layer: `base.attr`, repeatedly.
    fn parse_select_expr(&mut self) -> Result<AstNode, SableError> {
        let mut expr = self.parse_atom()?;
        while self.at(&TokenKind::Dot) {
            self.advance();
            let (attr, attr_span) = self.parse_attr_name()?;
            let span = expr.span().to(attr_span);
            expr = Arc::new(Expr::Select {
                base: expr,
                attr,
                span,
            });
        }
        Ok(expr)
    }

    fn parse_atom(&mut self) -> Result<AstNode, SableError> {
        self.descend()?;
        let result = self.parse_atom_inner();
        self.depth -= 1;
        result
    }

    fn parse_atom_inner(&mut self) -> Result<AstNode, SableError> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Arc::new(Expr::Var(name, tok.span)))
            }
            TokenKind::Int(value) => {
                self.advance();
                Ok(Arc::new(Expr::Int(value, tok.span)))
            }
            TokenKind::PathLit(text) => {
                self.advance();
                Ok(Arc::new(Expr::Path(self.resolve_path(&text), tok.span)))
            }
            TokenKind::UriLit(text) => {
                self.advance();
                Ok(Arc::new(Expr::Uri(text, tok.span)))
            }
            TokenKind::QuoteOpen => {
                self.advance();
                self.parse_plain_string(tok.span)
            }
            TokenKind::IndQuoteOpen => {
                self.advance();
                self.parse_indented_string(tok.span)
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::LBracket => {
                self.advance();
                self.parse_list(tok.span)
            }
            TokenKind::LBrace => {
                self.advance();
                self.parse_attrset_body(false, tok.span)
            }
            TokenKind::Rec => {
                self.advance();
                self.expect(TokenKind::LBrace)?;
                self.parse_attrset_body(true, tok.span)
            }
            other => Err(self.ctx.unexpected_token(
                "an expression",
                &other.describe(),
                to_source_span(tok.span),
            )),
        }
    }

    /// List elements are select-level expressions; juxtaposition inside a
    /// list never means application.
    fn parse_list(&mut self, start: Span) -> Result<AstNode, SableError> {
        let mut items = Vec::new();
        while self.starts_operand() {
            items.push(self.parse_select_expr()?);
        }
        let end = self.expect(TokenKind::RBracket)?.span;
        Ok(Arc::new(Expr::List(items, start.to(end))))
    }

    // ------------------------------------------------------------------
    // Strings
    // ------------------------------------------------------------------

    fn parse_plain_string(&mut self, open: Span) -> Result<AstNode, SableError> {
        let parts = self.parse_string_parts(TokenKind::QuoteClose)?;
        let close = self.advance().span;
        Ok(Arc::new(Expr::Str(parts, open.to(close))))
    }

    fn parse_indented_string(&mut self, open: Span) -> Result<AstNode, SableError> {
        let parts = self.parse_string_parts(TokenKind::IndQuoteClose)?;
        let close = self.advance().span;
        Ok(strings::strip_indentation(parts, open.to(close)))
    }

    fn parse_string_parts(&mut self, until: TokenKind) -> Result<Vec<StrPart>, SableError> {
        let mut parts = Vec::new();
        loop {
            if self.peek().kind == until {
                return Ok(parts);
            }
            let tok = self.advance();
            match tok.kind {
                TokenKind::StrLit(text) | TokenKind::IndStrLit(text) => {
                    parts.push(StrPart::Literal(text));
                }
                TokenKind::InterpOpen => {
                    let inner = self.parse_expr()?;
                    self.expect(TokenKind::InterpClose)?;
                    parts.push(StrPart::Interp(inner));
                }
                other => {
                    return Err(self.ctx.unexpected_token(
                        &until.describe(),
                        &other.describe(),
                        to_source_span(tok.span),
                    ));
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Bindings and attribute names
    // ------------------------------------------------------------------

    /// One binding inside an attrset literal or a `let`: a direct or
    /// dotted-path assignment, or one of the two `inherit` forms.
    fn parse_binding(&mut self) -> Result<RawBinding, SableError> {
        if self.at(&TokenKind::Inherit) {
            return self.parse_inherit();
        }

        let mut path = vec![self.parse_attr_name()?];
        while self.at(&TokenKind::Dot) {
            self.advance();
            path.push(self.parse_attr_name()?);
        }
        self.expect(TokenKind::Assign)?;
        let value = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;

        let span = path[0].1.to(path[path.len() - 1].1);
        Ok(RawBinding::Direct { path, value, span })
    }

    fn parse_inherit(&mut self) -> Result<RawBinding, SableError> {
        let start = self.expect(TokenKind::Inherit)?.span;

        let source = if self.at(&TokenKind::LParen) {
            self.advance();
            let expr = self.parse_expr()?;
            self.expect(TokenKind::RParen)?;
            Some(expr)
        } else {
            None
        };

        let mut names = Vec::new();
        while matches!(self.peek().kind, TokenKind::Ident(_) | TokenKind::QuoteOpen) {
            names.push(self.parse_attr_name()?);
        }
        let end = self.expect(TokenKind::Semicolon)?.span;
        let span = start.to(end);

        Ok(match source {
            Some(source) => RawBinding::InheritExpr {
                source,
                names,
                span,
            },
            None => RawBinding::InheritScope { names, span },
        })
    }

    /// An attribute name: an identifier, or a static (non-interpolated)
    /// string literal.
    fn parse_attr_name(&mut self) -> Result<(String, Span), SableError> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok((name, tok.span))
            }
            TokenKind::QuoteOpen => {
                self.advance();
                let mut name = String::new();
                if let TokenKind::StrLit(text) = &self.peek().kind {
                    name = text.clone();
                    self.advance();
                }
                let close = self.peek().clone();
                if close.kind != TokenKind::QuoteClose {
                    return Err(self.ctx.malformed(
                        "attribute names must be static strings",
                        to_source_span(close.span),
                    ));
                }
                self.advance();
                Ok((name, tok.span.to(close.span)))
            }
            other => Err(self.ctx.unexpected_token(
                "attribute name",
                &other.describe(),
                to_source_span(tok.span),
            )),
        }
    }

    fn parse_attrset_body(&mut self, recursive: bool, start: Span) -> Result<AstNode, SableError> {
        let mut raw = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            if self.at(&TokenKind::Eof) {
                let tok = self.peek().clone();
                return Err(self.ctx.unexpected_token(
                    "`}`",
                    &tok.kind.describe(),
                    to_source_span(tok.span),
                ));
            }
            raw.push(self.parse_binding()?);
        }
        let end = self.expect(TokenKind::RBrace)?.span;
        let set = attrs::normalize(raw, recursive, start.to(end), &self.ctx)?;
        Ok(Arc::new(set))
    }

    // ------------------------------------------------------------------
    // Path literals
    // ------------------------------------------------------------------

    /// Resolves a path literal against the base directory, lexically
    /// normalizing `.` and `..` segments. No filesystem access happens here.
    fn resolve_path(&self, text: &str) -> PathBuf {
        let literal = Path::new(text);
        let joined = if literal.is_absolute() {
            literal.to_path_buf()
        } else {
            self.base_dir.join(literal)
        };

        let mut resolved = PathBuf::new();
        for component in joined.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    if !resolved.pop() {
                        resolved.push("..");
                    }
                }
                other => resolved.push(other.as_os_str()),
            }
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(source: &str) -> Result<AstNode, SableError> {
        parse(source, "test.sbl", Path::new("/base"))
    }

    #[test]
    fn application_is_left_associative() {
        let ast = parse_str("f x y").unwrap();
        assert_eq!(ast.pretty(), "((f x) y)");
    }

    #[test]
    fn list_elements_are_not_applications() {
        let ast = parse_str("[ a b c ]").unwrap();
        let Expr::List(items, _) = &*ast else {
            panic!("expected a list, got {}", ast.type_name());
        };
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn select_binds_tighter_than_application() {
        let ast = parse_str("f a.b").unwrap();
        assert_eq!(ast.pretty(), "(f a.b)");
    }

    #[test]
    fn relative_paths_resolve_against_base_dir() {
        let ast = parse_str("./lib/util.sbl").unwrap();
        let Expr::Path(p, _) = &*ast else {
            panic!("expected a path");
        };
        assert_eq!(p, Path::new("/base/lib/util.sbl"));
    }

    #[test]
    fn parent_segments_normalize_lexically() {
        let ast = parse_str("../other.sbl").unwrap();
        let Expr::Path(p, _) = &*ast else {
            panic!("expected a path");
        };
        assert_eq!(p, Path::new("/other.sbl"));
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        assert!(parse_str("a b )").is_err());
    }

    #[test]
    fn empty_formals_are_a_lambda() {
        let ast = parse_str("{}: 1").unwrap();
        let Expr::Lambda { formals, .. } = &*ast else {
            panic!("expected a lambda");
        };
        assert!(formals.as_ref().unwrap().formals.is_empty());
    }

    #[test]
    fn empty_braces_are_an_attrset() {
        let ast = parse_str("{}").unwrap();
        assert!(matches!(&*ast, Expr::AttrSet { recursive: false, bindings, .. } if bindings.is_empty()));
    }
}
